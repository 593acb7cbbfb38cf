//! Embedding module for semantic retrieval
//!
//! Backends implement the [`TextEmbedder`] capability trait; callers go
//! through the caching [`EmbeddingEngine`]. The default [`HashedEmbedder`]
//! is deterministic and fully offline; a real model (BGE-Small-EN-v1.5) is
//! available behind the `fastembed` feature.

mod embedder;
mod engine;
#[cfg(feature = "fastembed")]
mod fastembedder;
mod hashed;

pub use embedder::TextEmbedder;
pub use engine::EmbeddingEngine;
#[cfg(feature = "fastembed")]
pub use fastembedder::FastEmbedder;
pub use hashed::{HashedEmbedder, DEFAULT_DIMS};
