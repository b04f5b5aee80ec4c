use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use review_insights::{api, PipelineContext, Settings};

#[derive(OpenApi)]
#[openapi(
    paths(api::analyze, api::health),
    components(
        schemas(
            api::AnalyzeRequest,
            api::ErrorResponse,
            api::HealthResponse,
            review_insights::PipelineOutput,
            review_insights::bucket::Review,
            review_insights::bucket::SentimentCounts,
            review_insights::classifier::Sentiment,
            review_insights::insights::InsightReport
        )
    ),
    tags(
        (name = "reviews", description = "Review Sentiment & Insight API")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env();
    let context = PipelineContext::load(&settings)?;
    if !context.classifier_ready() {
        tracing::error!("Classifier unavailable; /analyze will answer 503 until restart.");
    }

    let state = Arc::new(api::AppState {
        context: Arc::new(context),
    });

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/analyze", post(api::analyze))
        .route("/health", get(api::health))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    info!("🚀 Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
