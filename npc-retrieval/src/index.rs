//! In-memory vector index with exact cosine-similarity search
//!
//! Maps content ids to embedding records and answers nearest-neighbor
//! queries by exact linear scan: descending cosine similarity, ties broken
//! by ascending id so results are fully deterministic. The sharded map
//! serializes writers per id, and records are always replaced as whole
//! values, so concurrent readers never observe a torn record.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::content::{ContentId, ContentKind};
use crate::error::{Result, RetrievalError};

/// One indexed embedding with its retrieval metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub id: ContentId,
    pub kind: ContentKind,
    pub vector: Vec<f32>,
    /// Digest of the source text at embedding time
    pub source_hash: String,
    /// Leading characters of the source text, attached to query results
    pub snippet: String,
}

/// Concurrent id-to-embedding map with cosine-similarity queries
///
/// The dimensionality is fixed at construction and every stored vector must
/// match it. The index is a derived cache: it can always be rebuilt from the
/// relational store by a full sync.
pub struct VectorIndex {
    dims: usize,
    records: DashMap<ContentId, EmbeddingRecord>,
}

impl VectorIndex {
    /// Create an empty index for vectors of `dims` dimensions
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            records: DashMap::new(),
        }
    }

    /// Dimensionality shared by every record in this index
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Insert or replace the record for its id.
    ///
    /// Idempotent: re-upserting an identical record leaves the index
    /// unchanged. Zero-magnitude vectors are rejected since cosine
    /// similarity is undefined for them; a dimension mismatch is an
    /// internal invariant violation and poisons no state (the record is
    /// refused outright).
    pub fn upsert(&self, record: EmbeddingRecord) -> Result<()> {
        if record.vector.len() != self.dims {
            return Err(RetrievalError::corruption(format!(
                "dimension mismatch on upsert for {}: index is {}d, vector is {}d",
                record.id,
                self.dims,
                record.vector.len()
            )));
        }
        if magnitude(&record.vector) == 0.0 {
            return Err(RetrievalError::invalid_input(format!(
                "zero-magnitude vector for {}",
                record.id
            )));
        }

        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    /// Remove the record for `id`. Returns whether a record was present;
    /// deleting an absent id is a no-op, not an error.
    pub fn delete(&self, id: &ContentId) -> bool {
        self.records.remove(id).is_some()
    }

    /// Clone of the record for `id`, if present
    pub fn get(&self, id: &ContentId) -> Option<EmbeddingRecord> {
        self.records.get(id).map(|e| e.clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All indexed ids, in no particular order
    pub fn ids(&self) -> Vec<ContentId> {
        self.records.iter().map(|e| e.key().clone()).collect()
    }

    /// All records sorted by id, for snapshots and state comparison
    pub fn records(&self) -> Vec<EmbeddingRecord> {
        let mut records: Vec<_> = self.records.iter().map(|e| e.value().clone()).collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    /// The `k` most similar records to `vector` by cosine similarity,
    /// descending, ties broken by ascending id.
    ///
    /// A `k` larger than the record count returns every record.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<(ContentId, f32)>> {
        if vector.len() != self.dims {
            return Err(RetrievalError::invalid_input(format!(
                "query vector is {}d, index is {}d",
                vector.len(),
                self.dims
            )));
        }
        if magnitude(vector) == 0.0 {
            return Err(RetrievalError::invalid_input(
                "similarity is undefined for a zero query vector",
            ));
        }

        let mut results: Vec<(ContentId, f32)> = self
            .records
            .iter()
            .map(|entry| {
                let similarity = cosine_similarity(vector, &entry.value().vector);
                (entry.key().clone(), similarity)
            })
            .collect();

        results.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        results.truncate(k);
        Ok(results)
    }
}

/// Calculate cosine similarity between two vectors
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
