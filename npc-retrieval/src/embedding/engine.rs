//! Caching wrapper around an embedding backend
//!
//! High-level entry point for embedding generation. Wraps any
//! [`TextEmbedder`] with a DashMap cache for efficient repeated lookups.

use super::TextEmbedder;
use crate::error::{Result, RetrievalError};
use dashmap::DashMap;
use std::sync::Arc;

/// Embedding engine with a text-keyed vector cache
pub struct EmbeddingEngine {
    backend: Arc<dyn TextEmbedder>,
    cache: DashMap<String, Vec<f32>>,
}

impl EmbeddingEngine {
    /// Wrap a backend in a caching engine
    pub fn new(backend: Arc<dyn TextEmbedder>) -> Self {
        tracing::info!(
            model = backend.model_id(),
            dims = backend.dims(),
            "embedding engine ready"
        );

        Self {
            backend,
            cache: DashMap::new(),
        }
    }

    /// Generate an embedding, serving repeated texts from cache.
    ///
    /// Empty or whitespace-only text is rejected before reaching the
    /// backend.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(RetrievalError::invalid_input("cannot embed empty text"));
        }

        if let Some(cached) = self.cache.get(text) {
            return Ok(cached.clone());
        }

        let embedding = self.backend.embed(text).await?;
        self.cache.insert(text.to_string(), embedding.clone());
        Ok(embedding)
    }

    /// Output dimensionality of the active backend
    pub fn dims(&self) -> usize {
        self.backend.dims()
    }

    /// Identifier of the active embedding model
    pub fn model_id(&self) -> &str {
        self.backend.model_id()
    }

    /// Number of cached embeddings
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    /// Drop all cached embeddings
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::super::doubles::StaticEmbedder;
    use super::super::HashedEmbedder;
    use super::*;

    #[tokio::test]
    async fn test_embed_caches_by_text() {
        let engine = EmbeddingEngine::new(Arc::new(HashedEmbedder::new(32)));
        assert_eq!(engine.cache_size(), 0);

        let first = engine.embed("the royal cartographer").await.unwrap();
        assert_eq!(engine.cache_size(), 1);

        let second = engine.embed("the royal cartographer").await.unwrap();
        assert_eq!(engine.cache_size(), 1);
        assert_eq!(first, second);

        engine.clear_cache();
        assert_eq!(engine.cache_size(), 0);
    }

    #[tokio::test]
    async fn test_empty_input_rejected_before_backend() {
        // A fixture with no entries fails as unavailable for any text it
        // actually receives, so an InvalidInput here proves the engine
        // rejected the input first.
        let engine = EmbeddingEngine::new(Arc::new(StaticEmbedder::new(4, &[])));
        let err = engine.embed("").await.unwrap_err();
        assert!(matches!(err, RetrievalError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_dims_and_model_id_passthrough() {
        let engine = EmbeddingEngine::new(Arc::new(HashedEmbedder::new(64)));
        assert_eq!(engine.dims(), 64);
        assert_eq!(engine.model_id(), "hashed-ngram-v1-64d");
    }
}
