//! Fitted vocabulary and fixed-length sequence encoding.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{PipelineError, Result};

/// Index reserved for padding. Fitted indices start at 1.
pub const PAD_INDEX: u32 = 0;

/// Token index produced by the training-side tokenizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    word_index: HashMap<String, u32>,
    #[serde(default)]
    oov_token: Option<String>,
    /// Only indices strictly below this are kept; the rest count as unknown.
    #[serde(default)]
    num_words: Option<u32>,
}

impl Vocabulary {
    pub fn new(word_index: HashMap<String, u32>, oov_token: Option<String>, num_words: Option<u32>) -> Self {
        Self {
            word_index,
            oov_token,
            num_words,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::ArtifactLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let vocab: Vocabulary =
            serde_json::from_str(&content).map_err(|e| PipelineError::ArtifactLoad {
                path: path.display().to_string(),
                reason: format!("invalid tokenizer JSON: {}", e),
            })?;
        vocab.validate()?;
        Ok(vocab)
    }

    fn validate(&self) -> Result<()> {
        if let Some((token, _)) = self.word_index.iter().find(|&(_, &idx)| idx == PAD_INDEX) {
            return Err(PipelineError::ArtifactMismatch(format!(
                "token {:?} uses the padding index {}",
                token, PAD_INDEX
            )));
        }
        if let Some(oov) = &self.oov_token {
            if !self.word_index.contains_key(oov) {
                return Err(PipelineError::ArtifactMismatch(format!(
                    "OOV token {:?} is missing from the word index",
                    oov
                )));
            }
        }
        Ok(())
    }

    /// Embedding input size the model was built with: every fitted index plus padding.
    pub fn vocab_size(&self) -> usize {
        self.word_index.len() + 1
    }

    pub fn oov_index(&self) -> Option<u32> {
        self.oov_token
            .as_ref()
            .and_then(|t| self.word_index.get(t).copied())
    }

    /// Index for a token, the OOV index for unknown tokens, or `None` when the
    /// vocabulary has no OOV convention and the token should be skipped.
    pub fn lookup(&self, token: &str) -> Option<u32> {
        match self.word_index.get(token) {
            Some(&idx) if self.num_words.map_or(true, |limit| idx < limit) => Some(idx),
            _ => self.oov_index(),
        }
    }
}

/// Converts normalized text into right-padded, right-truncated index sequences.
#[derive(Debug, Clone)]
pub struct SequenceEncoder {
    vocabulary: Vocabulary,
    max_length: usize,
}

impl SequenceEncoder {
    pub fn new(vocabulary: Vocabulary, max_length: usize) -> Result<Self> {
        if max_length == 0 {
            return Err(PipelineError::Configuration(
                "max_length must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            vocabulary,
            max_length,
        })
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn encode_one(&self, text: &str) -> Vec<u32> {
        let mut seq: Vec<u32> = text
            .split_whitespace()
            .filter_map(|token| self.vocabulary.lookup(token))
            .take(self.max_length)
            .collect();
        seq.resize(self.max_length, PAD_INDEX);
        seq
    }

    pub fn encode<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Vec<u32>> {
        texts.iter().map(|t| self.encode_one(t.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(oov: bool, num_words: Option<u32>) -> Vocabulary {
        let mut index: HashMap<String, u32> = HashMap::new();
        let mut next = 1;
        if oov {
            index.insert("<OOV>".to_string(), next);
            next += 1;
        }
        for word in ["kopi", "enak", "mahal", "pelayanan", "lama"] {
            index.insert(word.to_string(), next);
            next += 1;
        }
        Vocabulary::new(index, oov.then(|| "<OOV>".to_string()), num_words)
    }

    #[test]
    fn test_every_row_has_max_length() {
        let encoder = SequenceEncoder::new(vocab(true, None), 4).unwrap();
        let rows = encoder.encode(&["", "kopi", "kopi enak mahal pelayanan lama kopi"]);
        assert!(rows.iter().all(|r| r.len() == 4));
    }

    #[test]
    fn test_right_pad_and_right_truncate() {
        let encoder = SequenceEncoder::new(vocab(true, None), 3).unwrap();
        assert_eq!(encoder.encode_one("kopi enak"), vec![2, 3, 0]);
        assert_eq!(encoder.encode_one("kopi enak mahal pelayanan lama"), vec![2, 3, 4]);
    }

    #[test]
    fn test_unknown_tokens_use_oov() {
        let encoder = SequenceEncoder::new(vocab(true, None), 4).unwrap();
        assert_eq!(encoder.encode_one("kopi pahit enak"), vec![2, 1, 3, 0]);
    }

    #[test]
    fn test_unknown_tokens_skipped_without_oov() {
        let encoder = SequenceEncoder::new(vocab(false, None), 4).unwrap();
        assert_eq!(encoder.encode_one("kopi pahit enak"), vec![1, 2, 0, 0]);
    }

    #[test]
    fn test_num_words_cap_maps_rare_words_to_oov() {
        // indices: <OOV>=1 kopi=2 enak=3 mahal=4 pelayanan=5 lama=6
        let encoder = SequenceEncoder::new(vocab(true, Some(4)), 3).unwrap();
        assert_eq!(encoder.encode_one("kopi mahal lama"), vec![2, 1, 1]);
    }

    #[test]
    fn test_vocab_size_counts_padding() {
        assert_eq!(vocab(true, None).vocab_size(), 7);
    }

    #[test]
    fn test_zero_max_length_rejected() {
        assert!(SequenceEncoder::new(vocab(true, None), 0).is_err());
    }

    #[test]
    fn test_load_rejects_missing_oov_entry() {
        let path = std::env::temp_dir().join(format!("tokenizer_{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{"word_index": {"kopi": 1}, "oov_token": "<OOV>"}"#).unwrap();
        let err = Vocabulary::load(&path).unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactMismatch(_)));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_load_valid_tokenizer() {
        let path = std::env::temp_dir().join(format!("tokenizer_{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{"word_index": {"<OOV>": 1, "kopi": 2}, "oov_token": "<OOV>", "num_words": 10000}"#,
        )
        .unwrap();
        let vocab = Vocabulary::load(&path).unwrap();
        assert_eq!(vocab.lookup("kopi"), Some(2));
        assert_eq!(vocab.lookup("teh"), Some(1));
        let _ = std::fs::remove_file(path);
    }
}
