//! On-disk index snapshots
//!
//! The index is a derived cache, so persistence is a convenience: a
//! snapshot records the embedding model identifier and dimensionality, and
//! loading refuses to serve vectors embedded in a different space. A
//! refused or missing snapshot simply means the caller rebuilds the index
//! from the relational store with a full sync.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddingEngine;
use crate::error::Result;
use crate::index::{EmbeddingRecord, VectorIndex};

#[derive(Serialize, Deserialize)]
struct IndexSnapshot {
    model_id: String,
    dims: usize,
    records: Vec<EmbeddingRecord>,
}

/// Write the index to `path`, tagged with the engine's model and dimension
pub fn save(index: &VectorIndex, engine: &EmbeddingEngine, path: &Path) -> Result<()> {
    let snapshot = IndexSnapshot {
        model_id: engine.model_id().to_string(),
        dims: index.dims(),
        records: index.records(),
    };

    let bytes = bincode::serialize(&snapshot)?;
    std::fs::write(path, bytes)?;

    tracing::info!(path = %path.display(), records = snapshot.records.len(), "index snapshot written");
    Ok(())
}

/// Load an index previously written by [`save`].
///
/// Returns `Ok(None)` when no snapshot exists or when the snapshot was
/// produced by a different embedding model or dimensionality; either way
/// the caller rebuilds from the relational store instead of serving
/// vectors from a mismatched space.
pub fn load(path: &Path, engine: &EmbeddingEngine) -> Result<Option<VectorIndex>> {
    if !path.exists() {
        return Ok(None);
    }

    let bytes = std::fs::read(path)?;
    let snapshot: IndexSnapshot = bincode::deserialize(&bytes)?;

    if snapshot.model_id != engine.model_id() || snapshot.dims != engine.dims() {
        tracing::warn!(
            snapshot_model = %snapshot.model_id,
            snapshot_dims = snapshot.dims,
            engine_model = %engine.model_id(),
            engine_dims = engine.dims(),
            "snapshot does not match the active embedding model, full rebuild required"
        );
        return Ok(None);
    }

    let index = VectorIndex::new(snapshot.dims);
    for record in snapshot.records {
        index.upsert(record)?;
    }
    Ok(Some(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentItem;
    use crate::embedding::HashedEmbedder;
    use crate::pipeline::IngestionPipeline;
    use std::sync::Arc;

    async fn populated(engine: &Arc<EmbeddingEngine>) -> Arc<VectorIndex> {
        let index = Arc::new(VectorIndex::new(engine.dims()));
        let pipeline = IngestionPipeline::new(Arc::clone(engine), Arc::clone(&index));
        let items = vec![
            ContentItem::tag("mountain_village", "Stonehaven mining village lore"),
            ContentItem::persona("persona-1", "Mira the wandering cartographer"),
        ];
        let report = pipeline.sync(&items).await;
        assert!(report.failures.is_empty());
        index
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let engine = Arc::new(EmbeddingEngine::new(Arc::new(HashedEmbedder::new(64))));
        let index = populated(&engine).await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.snapshot");

        save(&index, &engine, &path).unwrap();
        let restored = load(&path, &engine).unwrap().expect("snapshot should load");

        assert_eq!(restored.dims(), index.dims());
        assert_eq!(restored.records(), index.records());
    }

    #[tokio::test]
    async fn test_model_mismatch_forces_rebuild() {
        let engine = Arc::new(EmbeddingEngine::new(Arc::new(HashedEmbedder::new(64))));
        let index = populated(&engine).await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.snapshot");
        save(&index, &engine, &path).unwrap();

        // Same file, different model: must refuse to serve the vectors
        let other = EmbeddingEngine::new(Arc::new(HashedEmbedder::new(32)));
        assert!(load(&path, &other).unwrap().is_none());
    }

    #[test]
    fn test_missing_snapshot_is_none() {
        let engine = EmbeddingEngine::new(Arc::new(HashedEmbedder::new(64)));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.snapshot");
        assert!(load(&path, &engine).unwrap().is_none());
    }
}
