//! FastEmbed-backed embedding model
//!
//! Wraps BGE-Small-EN-v1.5 (384 dimensions) running on the ONNX runtime.
//! Model weights are downloaded on first use.

use super::TextEmbedder;
use crate::error::{Result, RetrievalError};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;

/// BGE-Small-EN-v1.5 embedding dimensionality
const BGE_SMALL_DIMS: usize = 384;

/// Real-model embedder behind the `fastembed` cargo feature
pub struct FastEmbedder {
    // The ort session is not shareable across threads; inference is
    // serialized behind this lock.
    model: Mutex<TextEmbedding>,
    model_id: String,
}

impl FastEmbedder {
    /// Load BGE-Small-EN-v1.5, downloading weights if necessary
    pub fn new() -> Result<Self> {
        let model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::BGESmallENV15).with_show_download_progress(false),
        )
        .map_err(|e| RetrievalError::unavailable(format!("failed to load embedding model: {e}")))?;

        tracing::info!(dims = BGE_SMALL_DIMS, "loaded BGE-Small-EN-v1.5");

        Ok(Self {
            model: Mutex::new(model),
            model_id: "bge-small-en-v1.5".to_string(),
        })
    }
}

#[async_trait]
impl TextEmbedder for FastEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(RetrievalError::invalid_input("cannot embed empty text"));
        }

        let mut rows = self
            .model
            .lock()
            .embed(vec![text.to_string()], None)
            .map_err(|e| RetrievalError::unavailable(format!("embedding failed: {e}")))?;

        rows.pop()
            .ok_or_else(|| RetrievalError::unavailable("backend returned no embedding"))
    }

    fn dims(&self) -> usize {
        BGE_SMALL_DIMS
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
