//! Sentiment labeling over an opaque scoring model.
//!
//! The model itself lives outside this crate (served over HTTP next to the training
//! artifacts). This module owns the label convention, the arg-max rule and the checks
//! that keep the serving-side vocabulary and sequence length in step with the model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::encoder::{SequenceEncoder, Vocabulary};
use crate::error::{PipelineError, Result};

/// Class labels in model output order: `0=negative, 1=neutral, 2=positive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

impl Sentiment {
    pub const ORDER: [Sentiment; 3] = [Sentiment::Negative, Sentiment::Neutral, Sentiment::Positive];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ORDER.get(index).copied()
    }

    pub fn index(self) -> usize {
        match self {
            Sentiment::Negative => 0,
            Sentiment::Neutral => 1,
            Sentiment::Positive => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Positive => "positive",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probabilities over [`Sentiment::ORDER`]. Always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassDistribution([f32; 3]);

impl ClassDistribution {
    pub fn new(scores: [f32; 3]) -> Result<Self> {
        if scores.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(PipelineError::Classification(format!(
                "invalid class scores {:?}",
                scores
            )));
        }
        Ok(Self(scores))
    }

    pub fn from_slice(scores: &[f32]) -> Result<Self> {
        let scores: [f32; 3] = scores.try_into().map_err(|_| {
            PipelineError::Classification(format!(
                "expected 3 class scores, got {}",
                scores.len()
            ))
        })?;
        Self::new(scores)
    }

    pub fn scores(&self) -> [f32; 3] {
        self.0
    }

    /// Arg-max label. Ties go to the first maximal index.
    pub fn label(&self) -> Sentiment {
        let mut best = 0;
        for (i, score) in self.0.iter().enumerate().skip(1) {
            if *score > self.0[best] {
                best = i;
            }
        }
        Sentiment::ORDER[best]
    }

    pub fn confidence(&self) -> f32 {
        self.0[self.label().index()]
    }
}

/// Metadata written next to the model by the training side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub max_length: usize,
    pub vocab_size: usize,
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,
}

fn default_labels() -> Vec<String> {
    Sentiment::ORDER.iter().map(|s| s.as_str().to_string()).collect()
}

impl ModelManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::ArtifactLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| PipelineError::ArtifactLoad {
            path: path.display().to_string(),
            reason: format!("invalid manifest JSON: {}", e),
        })
    }

    /// Reject a vocabulary / sequence length pairing the model was not trained with.
    pub fn check(&self, vocabulary: &Vocabulary, max_length: usize) -> Result<()> {
        if self.max_length != max_length {
            return Err(PipelineError::ArtifactMismatch(format!(
                "model expects max_length {}, serving is configured for {}",
                self.max_length, max_length
            )));
        }
        if self.vocab_size != vocabulary.vocab_size() {
            return Err(PipelineError::ArtifactMismatch(format!(
                "model expects vocab_size {}, tokenizer provides {}",
                self.vocab_size,
                vocabulary.vocab_size()
            )));
        }
        if self.labels != default_labels() {
            return Err(PipelineError::ArtifactMismatch(format!(
                "model label order {:?} does not match negative/neutral/positive",
                self.labels
            )));
        }
        Ok(())
    }
}

/// Batch scoring capability: one score vector per input row, order preserved.
#[async_trait]
pub trait SentimentModel: Send + Sync {
    async fn predict(&self, batch: &[Vec<u32>]) -> Result<Vec<Vec<f32>>>;
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: &'a [Vec<u32>],
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f32>>,
}

/// Model served behind a TensorFlow-Serving style `:predict` endpoint.
pub struct RemoteModel {
    client: reqwest::Client,
    url: String,
}

impl RemoteModel {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SentimentModel for RemoteModel {
    async fn predict(&self, batch: &[Vec<u32>]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(&self.url)
            .json(&PredictRequest { instances: batch })
            .send()
            .await
            .map_err(|e| {
                PipelineError::Classification(format!(
                    "model server unreachable at {}: {}",
                    self.url, e
                ))
            })?;

        if !response.status().is_success() {
            return Err(PipelineError::Classification(format!(
                "model server returned {}",
                response.status()
            )));
        }

        let body: PredictResponse = response.json().await.map_err(|e| {
            PipelineError::Classification(format!("malformed model response: {}", e))
        })?;
        Ok(body.predictions)
    }
}

/// Encoder + model pair, validated against the manifest once at startup.
pub struct SentimentClassifier {
    encoder: SequenceEncoder,
    model: Arc<dyn SentimentModel>,
}

impl SentimentClassifier {
    pub fn new(
        encoder: SequenceEncoder,
        manifest: &ModelManifest,
        model: Arc<dyn SentimentModel>,
    ) -> Result<Self> {
        manifest.check(encoder.vocabulary(), encoder.max_length())?;
        info!(
            "🧠 Classifier ready: vocab_size={}, max_length={}",
            manifest.vocab_size, manifest.max_length
        );
        Ok(Self { encoder, model })
    }

    pub fn encoder(&self) -> &SequenceEncoder {
        &self.encoder
    }

    /// Score a batch of encoded rows. Any shape problem fails the whole batch.
    pub async fn classify(&self, encoded: &[Vec<u32>]) -> Result<Vec<ClassDistribution>> {
        if encoded.is_empty() {
            return Ok(Vec::new());
        }

        let raw = self.model.predict(encoded).await?;
        if raw.len() != encoded.len() {
            return Err(PipelineError::Classification(format!(
                "model returned {} predictions for {} rows",
                raw.len(),
                encoded.len()
            )));
        }

        let distributions = raw
            .iter()
            .map(|row| ClassDistribution::from_slice(row))
            .collect::<Result<Vec<_>>>()?;
        debug!("Classified {} rows", distributions.len());
        Ok(distributions)
    }

    /// Encode normalized texts and label each one.
    pub async fn label<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Sentiment>> {
        let encoded = self.encoder.encode(texts);
        let distributions = self.classify(&encoded).await?;
        Ok(distributions.iter().map(ClassDistribution::label).collect())
    }
}
