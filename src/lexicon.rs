//! Slang and stopword lexicons used by the normalizer.
//!
//! Both resources are optional. A missing or corrupt file is logged and replaced by an
//! empty table so normalization keeps working with reduced quality.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};

/// Read-only lexicon state shared by every normalization call.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    slang: HashMap<String, String>,
    stopwords: HashSet<String>,
}

impl Lexicon {
    pub fn new(slang: HashMap<String, String>, stopwords: HashSet<String>) -> Self {
        Self { slang, stopwords }
    }

    /// Load both resources, degrading each one independently on failure.
    pub fn load(slang_path: &Path, stopwords_path: &Path) -> Self {
        let slang = match load_slang_map(slang_path) {
            Ok(map) => map,
            Err(e) => {
                warn!("⚠️ {}. Slang normalization will be skipped.", e);
                HashMap::new()
            }
        };

        let stopwords = match load_stopwords(stopwords_path) {
            Ok(set) => set,
            Err(e) => {
                warn!("⚠️ {}. Stopword removal will be skipped.", e);
                HashSet::new()
            }
        };

        info!(
            "📚 Lexicon loaded: {} slang entries, {} stopwords",
            slang.len(),
            stopwords.len()
        );
        Self { slang, stopwords }
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    /// Canonical form of `token`, or the token itself when it is not slang.
    pub fn canonical<'a>(&'a self, token: &'a str) -> &'a str {
        self.slang.get(token).map(String::as_str).unwrap_or(token)
    }

    pub fn slang_len(&self) -> usize {
        self.slang.len()
    }

    pub fn stopword_len(&self) -> usize {
        self.stopwords.len()
    }
}

/// Parse a JSON object of `token -> replacement`.
pub fn load_slang_map(path: &Path) -> Result<HashMap<String, String>> {
    let content = std::fs::read_to_string(path).map_err(|e| PipelineError::ArtifactLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| PipelineError::ArtifactLoad {
        path: path.display().to_string(),
        reason: format!("invalid slang JSON: {}", e),
    })
}

/// One stopword per line. Blank lines are ignored.
pub fn load_stopwords(path: &Path) -> Result<HashSet<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| PipelineError::ArtifactLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}_{}", name, uuid::Uuid::new_v4()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_both_resources() {
        let slang = scratch("slang", r#"{"gk": "tidak", "bgt": "banget"}"#);
        let stop = scratch("stop", "yang\ndan\r\n\n  di  \n");

        let lexicon = Lexicon::load(&slang, &stop);
        assert_eq!(lexicon.slang_len(), 2);
        assert_eq!(lexicon.stopword_len(), 3);
        assert!(lexicon.is_stopword("di"));
        assert_eq!(lexicon.canonical("gk"), "tidak");
        assert_eq!(lexicon.canonical("kopi"), "kopi");

        let _ = std::fs::remove_file(slang);
        let _ = std::fs::remove_file(stop);
    }

    #[test]
    fn test_missing_files_degrade_to_empty() {
        let dir = std::env::temp_dir();
        let lexicon = Lexicon::load(
            &dir.join(format!("nope_{}", uuid::Uuid::new_v4())),
            &dir.join(format!("nope_{}", uuid::Uuid::new_v4())),
        );
        assert_eq!(lexicon.slang_len(), 0);
        assert_eq!(lexicon.stopword_len(), 0);
    }

    #[test]
    fn test_corrupt_slang_json_degrades() {
        let slang = scratch("slang_bad", "{ not json");
        let stop = scratch("stop_ok", "yang\n");

        let lexicon = Lexicon::load(&slang, &stop);
        assert_eq!(lexicon.slang_len(), 0);
        assert_eq!(lexicon.stopword_len(), 1);

        assert!(load_slang_map(&slang).is_err());

        let _ = std::fs::remove_file(slang);
        let _ = std::fs::remove_file(stop);
    }
}
