//! Per-row review records and label bucketing.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::classifier::Sentiment;
use crate::normalizer::{RawReview, TextNormalizer};

/// One submitted review as it moves through a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Review {
    /// The submitted cell, untouched. Usually a string.
    #[schema(value_type = Object)]
    pub raw_text: RawReview,
    pub normalized_text: String,
    pub label: Option<Sentiment>,
}

impl Review {
    pub fn new(raw_text: RawReview) -> Self {
        Self {
            raw_text,
            normalized_text: String::new(),
            label: None,
        }
    }

    pub fn normalize(&mut self, normalizer: &TextNormalizer) {
        self.normalized_text = normalizer.normalize_raw(&self.raw_text);
    }

    pub fn assign(&mut self, label: Sentiment) {
        self.label = Some(label);
    }

    /// Raw text worth sending to insight generation, if any.
    pub fn usable_text(&self) -> Option<&str> {
        self.raw_text.text().filter(|t| !t.trim().is_empty())
    }
}

/// Raw texts of positive and negative reviews in input order. Neutral reviews are
/// never bucketed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewBucket {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

impl ReviewBucket {
    pub fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }
}

/// Stable partition of labeled reviews. Empty or non-text rows are skipped.
pub fn bucket(reviews: &[Review]) -> ReviewBucket {
    let mut out = ReviewBucket::default();
    for review in reviews {
        let Some(text) = review.usable_text() else {
            continue;
        };
        match review.label {
            Some(Sentiment::Positive) => out.positive.push(text.to_string()),
            Some(Sentiment::Negative) => out.negative.push(text.to_string()),
            Some(Sentiment::Neutral) | None => {}
        }
    }
    out
}

/// Label totals over every row of a run, including empty ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SentimentCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentCounts {
    pub fn from_reviews(reviews: &[Review]) -> Self {
        reviews
            .iter()
            .filter_map(|r| r.label)
            .fold(Self::default(), |mut acc, label| {
                match label {
                    Sentiment::Positive => acc.positive += 1,
                    Sentiment::Negative => acc.negative += 1,
                    Sentiment::Neutral => acc.neutral += 1,
                }
                acc
            })
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }
}
