//! NPC content retrieval engine
//!
//! Vector-store core for grounding AI-generated NPC text: Persona and Tag
//! content from the relational store is embedded into fixed-dimension
//! vectors, indexed in-memory, and queried by cosine similarity.
//!
//! ## Components
//!
//! - **Embedding** - swappable [`TextEmbedder`] backends behind a caching
//!   [`EmbeddingEngine`]
//! - **Vector index** - exact cosine-similarity search with deterministic
//!   ordering
//! - **Ingestion pipeline** - hash-based change detection, bounded-concurrency
//!   re-embedding, tombstone sweep
//! - **Retrieval service** - top-K search with kind filtering and snippets
//!
//! ## Example
//!
//! ```ignore
//! use npc_retrieval::{
//!     ContentItem, EmbeddingEngine, HashedEmbedder, IngestionPipeline,
//!     Retriever, VectorIndex,
//! };
//! use std::sync::Arc;
//!
//! let engine = Arc::new(EmbeddingEngine::new(Arc::new(HashedEmbedder::default())));
//! let index = Arc::new(VectorIndex::new(engine.dims()));
//!
//! let pipeline = IngestionPipeline::new(Arc::clone(&engine), Arc::clone(&index));
//! let report = pipeline.sync(&items).await;
//!
//! let retriever = Retriever::new(engine, index);
//! let results = retriever.retrieve("mining village in the mountains", 5, None).await?;
//! ```

pub mod content;
pub mod embedding;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod retrieval;
pub mod snapshot;

// Re-exports for convenience
pub use content::{source_hash, ContentId, ContentItem, ContentKind, RetrievalResult};
#[cfg(feature = "fastembed")]
pub use embedding::FastEmbedder;
pub use embedding::{EmbeddingEngine, HashedEmbedder, TextEmbedder};
pub use error::{Result, RetrievalError};
pub use index::{EmbeddingRecord, VectorIndex};
pub use pipeline::{IngestionPipeline, PipelineConfig, SyncFailure, SyncReport};
pub use retrieval::{Retriever, RetrieverConfig};
