//! Deterministic review text normalization.
//!
//! The steps run in a fixed order and each one relies on the output form of the
//! previous one:
//!
//! 1. lowercase
//! 2. strip URLs (`http...`, `www....`)
//! 3. strip `@mentions`
//! 4. drop everything outside `[a-zA-Z0-9\s]`
//! 5. drop any non-ASCII survivors
//! 6. trim
//! 7. tokenize on whitespace, remove stopwords, substitute slang, rejoin with single spaces

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::lexicon::Lexicon;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+|www.\S+").expect("url regex"));
static MENTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\w+").expect("mention regex"));
static SPECIAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\s]").expect("special char regex"));
static NON_ASCII_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\x00-\x7F]+").expect("non-ascii regex"));

/// One submitted review cell. Anything that is not a JSON string (numbers, null,
/// objects) is kept as-is and normalizes to the empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawReview {
    Text(String),
    Other(serde_json::Value),
}

impl RawReview {
    pub fn text(&self) -> Option<&str> {
        match self {
            RawReview::Text(s) => Some(s),
            RawReview::Other(_) => None,
        }
    }
}

impl From<&str> for RawReview {
    fn from(value: &str) -> Self {
        RawReview::Text(value.to_string())
    }
}

impl From<String> for RawReview {
    fn from(value: String) -> Self {
        RawReview::Text(value)
    }
}

/// Pure text transform over a frozen [`Lexicon`].
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    lexicon: Arc<Lexicon>,
}

impl TextNormalizer {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Normalize a raw review cell. Non-text input yields `""`.
    pub fn normalize_raw(&self, raw: &RawReview) -> String {
        match raw.text() {
            Some(text) => self.normalize(text),
            None => String::new(),
        }
    }

    pub fn normalize(&self, text: &str) -> String {
        let text = text.to_lowercase();
        let text = URL_RE.replace_all(&text, "");
        let text = MENTION_RE.replace_all(&text, "");
        let text = SPECIAL_RE.replace_all(&text, "");
        let text = NON_ASCII_RE.replace_all(&text, "");

        text.trim()
            .split_whitespace()
            .filter(|token| !self.lexicon.is_stopword(token))
            .map(|token| self.lexicon.canonical(token))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    fn normalizer() -> TextNormalizer {
        let slang: HashMap<String, String> = [("gk", "tidak"), ("bgt", "banget"), ("enakk", "enak")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let stopwords: HashSet<String> =
            ["yang", "dan", "di"].into_iter().map(str::to_string).collect();
        TextNormalizer::new(Arc::new(Lexicon::new(slang, stopwords)))
    }

    #[test]
    fn test_full_pipeline() {
        let n = normalizer();
        let out = n.normalize("Kopi yang ENAKK bgt!!! cek https://kopi.id/promo @baristaku 😍");
        assert_eq!(out, "kopi enak banget cek");
    }

    #[test]
    fn test_www_and_mentions() {
        let n = TextNormalizer::default();
        assert_eq!(n.normalize("visit www.example.com now @me"), "visit now");
    }

    #[test]
    fn test_collapses_whitespace() {
        let n = TextNormalizer::default();
        assert_eq!(n.normalize("  a \t\t b \n c  "), "a b c");
    }

    #[test]
    fn test_non_ascii_letters_removed() {
        let n = TextNormalizer::default();
        assert_eq!(n.normalize("Café Über"), "caf ber");
    }

    #[test]
    fn test_non_string_inputs_are_empty() {
        let n = normalizer();
        for raw in [
            RawReview::Other(serde_json::Value::Null),
            RawReview::Other(serde_json::json!(42)),
            RawReview::Other(serde_json::json!({"text": "kopi"})),
            RawReview::Other(serde_json::json!(["kopi"])),
        ] {
            assert_eq!(n.normalize_raw(&raw), "");
        }
    }

    #[test]
    fn test_raw_review_deserializes_untagged() {
        let rows: Vec<RawReview> = serde_json::from_str(r#"["enak", null, 3.5]"#).unwrap();
        assert_eq!(rows[0], RawReview::Text("enak".into()));
        assert_eq!(rows[1].text(), None);
        assert_eq!(rows[2].text(), None);
    }

    #[test]
    fn test_idempotent_without_lexicon_hits() {
        let n = normalizer();
        for input in [
            "Pelayanan LAMA sekali, kecewa!!",
            "  mantap 100% recommended http://x.y ",
            "☕☕ kopi susu @kedai",
            "",
        ] {
            let once = n.normalize(input);
            assert_eq!(n.normalize(&once), once);
        }
    }

    #[test]
    fn test_deterministic() {
        let n = normalizer();
        let input = "Gk enak, dan mahal bgt";
        assert_eq!(n.normalize(input), n.normalize(input));
        assert_eq!(n.normalize(input), "tidak enak mahal banget");
    }
}
