//! Business report generation from bucketed reviews.
//!
//! [`InsightGenerator::generate`] never fails. Every path (nothing to analyze, service
//! not configured, retries exhausted, unparseable answer) ends in a report whose two
//! fields are non-empty, using the fixed placeholder texts below where needed.

pub mod gemini;
pub mod parser;
pub mod prompt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::config::Settings;
use crate::error::Result;
use gemini::GeminiClient;
use parser::{parse_response, ParsedResponse};
use prompt::build_prompt;

pub const NOTHING_TO_ANALYZE_SUMMARY: &str = "Tidak ada ulasan untuk dianalisis.";
pub const NOTHING_TO_ANALYZE_SUGGESTIONS: &str = "Tidak ada ulasan negatif untuk memberikan saran.";
pub const NOT_CONFIGURED_SUMMARY: &str =
    "Ringkasan tidak tersedia: layanan AI belum dikonfigurasi.";
pub const NOT_CONFIGURED_SUGGESTIONS: &str =
    "Saran tidak tersedia: layanan AI belum dikonfigurasi.";
pub const EXHAUSTED_SUMMARY: &str = "Gagal menghasilkan ringkasan setelah beberapa kali percobaan.";
pub const EXHAUSTED_SUGGESTIONS: &str = "Gagal menghasilkan saran setelah beberapa kali percobaan.";
pub const PARSE_FAILED_SUMMARY: &str = "Ringkasan tidak dapat dibuat.";
pub const PARSE_FAILED_SUGGESTIONS: &str = "Saran tidak dapat dibuat.";
pub const UNAVAILABLE: &str = "Tidak tersedia.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InsightReport {
    pub summary: String,
    pub suggestions: String,
}

impl InsightReport {
    /// Blank fields are replaced by [`UNAVAILABLE`].
    pub fn new(summary: impl Into<String>, suggestions: impl Into<String>) -> Self {
        fn or_unavailable(s: String) -> String {
            if s.trim().is_empty() {
                UNAVAILABLE.to_string()
            } else {
                s
            }
        }
        Self {
            summary: or_unavailable(summary.into()),
            suggestions: or_unavailable(suggestions.into()),
        }
    }

    pub fn nothing_to_analyze() -> Self {
        Self::new(NOTHING_TO_ANALYZE_SUMMARY, NOTHING_TO_ANALYZE_SUGGESTIONS)
    }

    pub fn not_configured() -> Self {
        Self::new(NOT_CONFIGURED_SUMMARY, NOT_CONFIGURED_SUGGESTIONS)
    }

    pub fn exhausted() -> Self {
        Self::new(EXHAUSTED_SUMMARY, EXHAUSTED_SUGGESTIONS)
    }
}

impl From<ParsedResponse> for InsightReport {
    fn from(parsed: ParsedResponse) -> Self {
        match parsed {
            ParsedResponse::Sections {
                summary,
                suggestions,
            } => Self::new(summary, suggestions),
            ParsedResponse::SummaryOnly { summary } => Self::new(summary, PARSE_FAILED_SUGGESTIONS),
            ParsedResponse::Unrecognized => {
                Self::new(PARSE_FAILED_SUMMARY, PARSE_FAILED_SUGGESTIONS)
            }
        }
    }
}

/// One prompt in, one free-form answer out.
#[async_trait]
pub trait TextGenerationService: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Backoff sleep, injectable so retry timing can be observed in tests.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::config::DEFAULT_MAX_ATTEMPTS,
            unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Wait before retrying after failed attempt `attempt` (0-indexed): `2^attempt` units.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.unit.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Attempt-indexed request lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptState {
    Idle,
    Requesting { attempt: u32 },
    Retrying { attempt: u32, delay: Duration },
    Success(InsightReport),
    Exhausted,
}

pub struct InsightGenerator {
    /// `None` when no credentials were found at construction.
    service: Option<Arc<dyn TextGenerationService>>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    review_cap: usize,
}

impl InsightGenerator {
    pub fn new(
        service: Option<Arc<dyn TextGenerationService>>,
        policy: RetryPolicy,
        review_cap: usize,
    ) -> Self {
        Self {
            service,
            policy,
            sleeper: Arc::new(TokioSleeper),
            review_cap,
        }
    }

    /// Gemini-backed generator, or an unconfigured one when no API key is set.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let service: Option<Arc<dyn TextGenerationService>> = match &settings.gemini_api_key {
            Some(key) => {
                info!("✨ Insight service configured with model {}", settings.gemini_model);
                let client = GeminiClient::new(
                    key.clone(),
                    settings.gemini_model.clone(),
                    settings.http_timeout,
                )?;
                Some(Arc::new(client) as Arc<dyn TextGenerationService>)
            }
            None => {
                warn!("⚠️ GEMINI_API_KEY not set. Insight reports will be placeholders.");
                None
            }
        };
        let policy = RetryPolicy {
            max_attempts: settings.max_attempts,
            unit: settings.backoff_unit,
        };
        Ok(Self::new(service, policy, settings.prompt_review_cap))
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.service.is_some()
    }

    pub async fn generate(&self, positive: &[String], negative: &[String]) -> InsightReport {
        let Some(service) = &self.service else {
            return InsightReport::not_configured();
        };
        if positive.is_empty() && negative.is_empty() {
            info!("No positive or negative reviews; skipping insight request");
            return InsightReport::nothing_to_analyze();
        }

        let prompt = build_prompt(positive, negative, self.review_cap);
        let mut state = AttemptState::Idle;
        loop {
            state = match state {
                AttemptState::Idle => AttemptState::Requesting { attempt: 0 },
                AttemptState::Requesting { attempt } => {
                    match service.generate(&prompt).await {
                        Ok(text) => AttemptState::Success(parse_response(&text).into()),
                        Err(e) => {
                            warn!(
                                "❌ Insight attempt {}/{} failed: {}",
                                attempt + 1,
                                self.policy.max_attempts,
                                e
                            );
                            if attempt + 1 >= self.policy.max_attempts {
                                AttemptState::Exhausted
                            } else {
                                AttemptState::Retrying {
                                    attempt,
                                    delay: self.policy.delay_for(attempt),
                                }
                            }
                        }
                    }
                }
                AttemptState::Retrying { attempt, delay } => {
                    info!("⏳ Waiting {:?} before retry...", delay);
                    self.sleeper.sleep(delay).await;
                    AttemptState::Requesting {
                        attempt: attempt + 1,
                    }
                }
                AttemptState::Success(report) => return report,
                AttemptState::Exhausted => {
                    error!(
                        "Insight generation failed after {} attempts",
                        self.policy.max_attempts
                    );
                    return InsightReport::exhausted();
                }
            };
        }
    }
}
