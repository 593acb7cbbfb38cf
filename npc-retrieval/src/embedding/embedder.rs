//! Capability trait for embedding backends

use crate::error::Result;
use async_trait::async_trait;

/// Converts text into a fixed-length vector.
///
/// Implementations must be deterministic for a fixed model version: the same
/// text yields the same vector, up to floating-point reproducibility. The
/// trait is object-safe so the index and pipeline can hold
/// `Arc<dyn TextEmbedder>` and tests can swap in deterministic doubles.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed a single text into a vector of [`dims`](Self::dims) floats.
    ///
    /// Fails with `InvalidInput` on empty or non-indexable text and with
    /// `EmbeddingUnavailable` when the underlying model or service cannot
    /// be reached. May perform network or model-inference I/O; this is the
    /// only suspension point in the component.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Output dimensionality, constant for the lifetime of the model.
    fn dims(&self) -> usize;

    /// Identifier of the embedding model, recorded in index snapshots so a
    /// model swap triggers a full rebuild.
    fn model_id(&self) -> &str;
}
