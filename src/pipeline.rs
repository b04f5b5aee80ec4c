//! Review processing run: normalize → encode → classify → label → bucket → insights.
//!
//! A [`PipelineContext`] is built once at startup and only read afterwards, so any
//! number of runs can share it behind an `Arc` without locking.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, Instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::bucket::{bucket, Review, SentimentCounts};
use crate::classifier::{ModelManifest, RemoteModel, SentimentClassifier};
use crate::config::Settings;
use crate::encoder::{SequenceEncoder, Vocabulary};
use crate::error::{PipelineError, Result};
use crate::insights::{InsightGenerator, InsightReport};
use crate::lexicon::Lexicon;
use crate::normalizer::{RawReview, TextNormalizer};

/// Result of one run: every input row labeled, plus the narrative report.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PipelineOutput {
    pub run_id: Uuid,
    pub rows: Vec<Review>,
    pub counts: SentimentCounts,
    pub report: InsightReport,
    pub generated_at: DateTime<Utc>,
}

/// Frozen startup resources shared by all runs.
pub struct PipelineContext {
    normalizer: TextNormalizer,
    /// The load error is kept so every run can report why labeling is unavailable.
    classifier: std::result::Result<SentimentClassifier, Arc<PipelineError>>,
    insights: InsightGenerator,
}

impl PipelineContext {
    pub fn new(
        normalizer: TextNormalizer,
        classifier: Result<SentimentClassifier>,
        insights: InsightGenerator,
    ) -> Self {
        Self {
            normalizer,
            classifier: classifier.map_err(Arc::new),
            insights,
        }
    }

    /// Load lexicons, artifacts and service clients. Lexicon and credential problems
    /// degrade; a classifier problem is recorded and fails each run.
    pub fn load(settings: &Settings) -> Result<Self> {
        let lexicon = Lexicon::load(&settings.slang_path, &settings.stopwords_path);
        let normalizer = TextNormalizer::new(Arc::new(lexicon));

        let classifier = load_classifier(settings).map_err(|e| {
            error!("❌ Could not load classifier components: {}", e);
            e
        });

        let insights = InsightGenerator::from_settings(settings)?;
        Ok(Self::new(normalizer, classifier, insights))
    }

    pub fn classifier_ready(&self) -> bool {
        self.classifier.is_ok()
    }

    pub fn insights_configured(&self) -> bool {
        self.insights.is_configured()
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    /// Label every row and generate the report. Fails only if classification fails.
    pub async fn run(&self, raw_rows: Vec<RawReview>) -> Result<PipelineOutput> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline_run", %run_id, rows = raw_rows.len());
        self.run_inner(run_id, raw_rows).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, raw_rows: Vec<RawReview>) -> Result<PipelineOutput> {
        let started = std::time::Instant::now();

        let mut rows: Vec<Review> = raw_rows.into_iter().map(Review::new).collect();
        for row in rows.iter_mut() {
            row.normalize(&self.normalizer);
        }

        let classifier = self
            .classifier
            .as_ref()
            .map_err(|cause| PipelineError::ClassifierUnavailable(Arc::clone(cause)))?;

        let encoded = classifier.encoder().encode(
            &rows
                .iter()
                .map(|r| r.normalized_text.as_str())
                .collect::<Vec<_>>(),
        );
        let distributions = classifier.classify(&encoded).await?;
        for (row, dist) in rows.iter_mut().zip(&distributions) {
            row.assign(dist.label());
        }

        let counts = SentimentCounts::from_reviews(&rows);
        info!(
            "🧠 Labeled {} rows: {} positive, {} negative, {} neutral",
            rows.len(),
            counts.positive,
            counts.negative,
            counts.neutral
        );

        let buckets = bucket(&rows);
        let report = self.insights.generate(&buckets.positive, &buckets.negative).await;

        info!("✅ Run completed in {:.2}s", started.elapsed().as_secs_f32());
        Ok(PipelineOutput {
            run_id,
            rows,
            counts,
            report,
            generated_at: Utc::now(),
        })
    }
}

/// Vocabulary + manifest + model client, checked against each other.
pub fn load_classifier(settings: &Settings) -> Result<SentimentClassifier> {
    let vocabulary = Vocabulary::load(&settings.tokenizer_path)?;
    let manifest = ModelManifest::load(&settings.manifest_path)?;
    let encoder = SequenceEncoder::new(vocabulary, settings.max_length)?;
    let model = RemoteModel::new(settings.classifier_url.clone(), settings.http_timeout)?;
    SentimentClassifier::new(encoder, &manifest, Arc::new(model))
}
