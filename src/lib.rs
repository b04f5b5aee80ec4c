//! Customer-review sentiment labeling and business insight reports.
//!
//! A run normalizes each review, encodes it for the sentiment model, labels the whole
//! batch in one scoring call, buckets positive and negative texts, and asks a
//! generative-text service for a summary plus improvement suggestions.

pub mod api;
pub mod bucket;
pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod insights;
pub mod lexicon;
pub mod normalizer;
pub mod pipeline;

pub use config::Settings;
pub use error::{PipelineError, Result};
pub use pipeline::{PipelineContext, PipelineOutput};
