//! Process-wide settings resolved once at startup.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_MAX_LENGTH: usize = 50;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_PROMPT_REVIEW_CAP: usize = 20;

#[derive(Debug, Clone)]
pub struct Settings {
    pub slang_path: PathBuf,
    pub stopwords_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub manifest_path: PathBuf,
    /// Sequence length the serving side pads/truncates to. Checked against the manifest.
    pub max_length: usize,
    pub classifier_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub max_attempts: u32,
    /// One backoff unit. Retry `n` waits `2^n` units.
    pub backoff_unit: Duration,
    pub prompt_review_cap: usize,
    pub http_timeout: Duration,
    pub bind_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            slang_path: PathBuf::from("resources/combined_slang_words.txt"),
            stopwords_path: PathBuf::from("resources/combined_stop_words.txt"),
            tokenizer_path: PathBuf::from("models/tokenizer.json"),
            manifest_path: PathBuf::from("models/model_manifest.json"),
            max_length: DEFAULT_MAX_LENGTH,
            classifier_url: "http://localhost:8501/v1/models/sentiment:predict".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-1.5-flash".to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit: Duration::from_millis(1000),
            prompt_review_cap: DEFAULT_PROMPT_REVIEW_CAP,
            http_timeout: Duration::from_secs(60),
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Settings {
    /// Read the process environment.
    ///
    /// Binaries load `.env` before calling this (and before logging starts, so
    /// `RUST_LOG` from the file applies). `dotenv` never overrides variables that are
    /// already set, so real environment values win over the local file.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let path = |key: &str, default: PathBuf| lookup(key).map(PathBuf::from).unwrap_or(default);

        let key_file = lookup("GEMINI_API_KEY_FILE").map(PathBuf::from);
        let gemini_api_key = resolve_api_key(lookup("GEMINI_API_KEY"), key_file.as_deref());

        Self {
            slang_path: path("SLANG_PATH", defaults.slang_path),
            stopwords_path: path("STOPWORDS_PATH", defaults.stopwords_path),
            tokenizer_path: path("TOKENIZER_PATH", defaults.tokenizer_path),
            manifest_path: path("MODEL_MANIFEST_PATH", defaults.manifest_path),
            max_length: parse_or("MAX_LENGTH", lookup("MAX_LENGTH"), defaults.max_length),
            classifier_url: lookup("CLASSIFIER_URL").unwrap_or(defaults.classifier_url),
            gemini_api_key,
            gemini_model: lookup("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            max_attempts: parse_or(
                "INSIGHT_MAX_ATTEMPTS",
                lookup("INSIGHT_MAX_ATTEMPTS"),
                defaults.max_attempts,
            )
            .max(1),
            backoff_unit: Duration::from_millis(parse_or(
                "INSIGHT_BACKOFF_MS",
                lookup("INSIGHT_BACKOFF_MS"),
                1000u64,
            )),
            prompt_review_cap: parse_or(
                "PROMPT_REVIEW_CAP",
                lookup("PROMPT_REVIEW_CAP"),
                defaults.prompt_review_cap,
            ),
            http_timeout: Duration::from_secs(parse_or(
                "HTTP_TIMEOUT_SECS",
                lookup("HTTP_TIMEOUT_SECS"),
                60u64,
            )),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match raw {
        Some(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("⚠️ Invalid value for {}: {:?}, using default {}", key, value, default);
                default
            }
        },
        None => default,
    }
}

/// Pick the generative-service key: the environment value first, then the key file.
/// Blank values count as absent.
pub fn resolve_api_key(env_value: Option<String>, key_file: Option<&Path>) -> Option<String> {
    if let Some(key) = env_value.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
        return Some(key);
    }

    let path = key_file?;
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let key = content.trim().to_string();
            if key.is_empty() {
                warn!("⚠️ API key file {} is empty", path.display());
                None
            } else {
                debug!("Using API key from {}", path.display());
                Some(key)
            }
        }
        Err(e) => {
            warn!("⚠️ Failed to read API key file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_env_reads_process_environment() {
        std::env::set_var("INSIGHT_BACKOFF_MS", "250");
        let settings = Settings::from_env();
        std::env::remove_var("INSIGHT_BACKOFF_MS");
        assert_eq!(settings.backoff_unit, Duration::from_millis(250));
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings.max_length, 50);
        assert_eq!(settings.max_attempts, 5);
        assert_eq!(settings.prompt_review_cap, 20);
        assert_eq!(settings.backoff_unit, Duration::from_secs(1));
        assert!(settings.gemini_api_key.is_none());
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("MAX_LENGTH", "64"),
            ("INSIGHT_MAX_ATTEMPTS", "not-a-number"),
            ("INSIGHT_BACKOFF_MS", "10"),
            ("GEMINI_MODEL", "gemini-1.5-pro"),
        ]));
        assert_eq!(settings.max_length, 64);
        assert_eq!(settings.max_attempts, 5);
        assert_eq!(settings.backoff_unit, Duration::from_millis(10));
        assert_eq!(settings.gemini_model, "gemini-1.5-pro");
    }

    #[test]
    fn test_env_key_beats_key_file() {
        let path = std::env::temp_dir().join(format!("gemini_key_{}", uuid::Uuid::new_v4()));
        std::fs::write(&path, "file-key\n").unwrap();

        assert_eq!(
            resolve_api_key(Some("env-key".into()), Some(&path)),
            Some("env-key".to_string())
        );
        assert_eq!(resolve_api_key(Some("   ".into()), Some(&path)), Some("file-key".to_string()));
        assert_eq!(resolve_api_key(None, Some(&path)), Some("file-key".to_string()));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_key_file() {
        let path = std::env::temp_dir().join(format!("missing_{}", uuid::Uuid::new_v4()));
        assert_eq!(resolve_api_key(None, Some(&path)), None);
        assert_eq!(resolve_api_key(None, None), None);
    }
}
