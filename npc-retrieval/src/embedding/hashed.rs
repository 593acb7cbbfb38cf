//! Deterministic feature-hashing embedder
//!
//! Hashes token unigrams and bigrams into a fixed-dimension bucket vector
//! and L2-normalizes the result. Pure and offline: the same text always
//! produces the same vector, which keeps tests reproducible and lets the
//! crate run without model downloads.

use super::TextEmbedder;
use crate::error::{Result, RetrievalError};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Default output dimensionality
pub const DEFAULT_DIMS: usize = 256;

/// Relative weight of bigram features against unigrams
const BIGRAM_WEIGHT: f32 = 0.5;

/// Feature-hashing bag-of-tokens embedder
pub struct HashedEmbedder {
    dims: usize,
    model_id: String,
}

impl HashedEmbedder {
    /// Create an embedder with the given output dimensionality.
    ///
    /// `dims` must be non-zero.
    pub fn new(dims: usize) -> Self {
        assert!(dims > 0, "embedding dimensionality must be non-zero");
        Self {
            dims,
            model_id: format!("hashed-ngram-v1-{dims}d"),
        }
    }

    /// Lowercase alphanumeric tokens, dropping terms of two characters or
    /// fewer.
    fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| s.len() > 2)
            .map(String::from)
            .collect()
    }

    /// Stable bucket assignment for a feature string.
    ///
    /// Uses the leading bytes of a SHA-256 digest so bucketing never shifts
    /// across process restarts or toolchain upgrades.
    fn bucket(&self, feature: &str) -> usize {
        let digest = Sha256::digest(feature.as_bytes());
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&digest[..8]);
        (u64::from_be_bytes(raw) % self.dims as u64) as usize
    }
}

impl Default for HashedEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMS)
    }
}

#[async_trait]
impl TextEmbedder for HashedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(RetrievalError::invalid_input("cannot embed empty text"));
        }

        let tokens = Self::tokenize(text);
        if tokens.is_empty() {
            return Err(RetrievalError::invalid_input(
                "text contains no indexable tokens",
            ));
        }

        let mut vector = vec![0.0_f32; self.dims];
        for token in &tokens {
            vector[self.bucket(token)] += 1.0;
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{}\u{1f}{}", pair[0], pair[1]);
            vector[self.bucket(&bigram)] += BIGRAM_WEIGHT;
        }

        // All contributions are positive, so the norm is non-zero here
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        for x in &mut vector {
            *x /= norm;
        }

        Ok(vector)
    }

    fn dims(&self) -> usize {
        self.dims
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
