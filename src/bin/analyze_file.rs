//! Run the review pipeline over a text file, one review per line, and print JSON.

use anyhow::{bail, Context, Result};
use review_insights::normalizer::RawReview;
use review_insights::{PipelineContext, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: analyze_file <reviews.txt>");
    };

    let content =
        std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path))?;
    let rows: Vec<RawReview> = content.lines().map(RawReview::from).collect();
    eprintln!("📄 Loaded {} reviews from {}", rows.len(), path);

    let settings = Settings::from_env();
    let context = PipelineContext::load(&settings)?;
    let output = context.run(rows).await.context("review run failed")?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
