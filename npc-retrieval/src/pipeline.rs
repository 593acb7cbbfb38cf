//! Content ingestion pipeline
//!
//! Keeps the vector index consistent with the relational store: changed
//! text is re-embedded, unchanged text is skipped via its content hash, and
//! records whose source row disappeared are swept out. Embedding runs
//! concurrently up to a bounded limit; every index mutation is a single
//! whole-record insert or remove, so cancelling a sync mid-flight leaves
//! the index in a valid (if incomplete) state.

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::content::{source_hash, ContentId, ContentItem};
use crate::embedding::EmbeddingEngine;
use crate::error::RetrievalError;
use crate::index::{EmbeddingRecord, VectorIndex};

/// Pipeline tuning knobs
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Embedding calls in flight at once during a sync
    pub embed_concurrency: usize,
    /// Characters of source text kept for result snippets
    pub snippet_len: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            embed_concurrency: 4,
            snippet_len: 300,
        }
    }
}

/// Per-item failure recorded during a sync
#[derive(Debug)]
pub struct SyncFailure {
    pub id: ContentId,
    pub error: RetrievalError,
}

/// Outcome of one sync pass
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Items embedded for the first time
    pub inserted: usize,
    /// Items re-embedded because their text changed
    pub updated: usize,
    /// Items whose hash matched the existing record
    pub skipped: usize,
    /// Records removed by the tombstone sweep
    pub removed: usize,
    /// Items that could not be embedded or indexed; their prior records,
    /// if any, are left untouched
    pub failures: Vec<SyncFailure>,
}

enum Change {
    Insert,
    Update,
}

/// Re-embeds changed content and sweeps deleted content out of the index
pub struct IngestionPipeline {
    engine: Arc<EmbeddingEngine>,
    index: Arc<VectorIndex>,
    config: PipelineConfig,
}

impl IngestionPipeline {
    pub fn new(engine: Arc<EmbeddingEngine>, index: Arc<VectorIndex>) -> Self {
        Self::with_config(engine, index, PipelineConfig::default())
    }

    pub fn with_config(
        engine: Arc<EmbeddingEngine>,
        index: Arc<VectorIndex>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            engine,
            index,
            config,
        }
    }

    /// Reconcile the index against the full set of live content items.
    ///
    /// For each item: absent from the index means embed and insert, a stale
    /// hash means re-embed and update, a matching hash means skip. Any
    /// indexed id not present in `items` is removed afterwards, so deleted
    /// Personas/Tags never linger as dangling vectors. Idempotent: syncing
    /// the same input twice changes nothing.
    ///
    /// Per-item failures never abort the batch; they are collected in the
    /// report and the item's prior record is preserved.
    pub async fn sync(&self, items: &[ContentItem]) -> SyncReport {
        let mut report = SyncReport::default();

        // Last occurrence wins when the same id appears twice in one batch
        let mut seen: HashSet<&ContentId> = HashSet::new();
        let mut pending: Vec<(&ContentItem, String, Change)> = Vec::new();
        for item in items.iter().rev() {
            if !seen.insert(&item.id) {
                continue;
            }
            let hash = source_hash(&item.text);
            match self.index.get(&item.id) {
                None => pending.push((item, hash, Change::Insert)),
                Some(existing) if existing.source_hash != hash => {
                    pending.push((item, hash, Change::Update))
                }
                Some(_) => report.skipped += 1,
            }
        }

        let snippet_len = self.config.snippet_len;
        let outcomes: Vec<_> = stream::iter(pending.into_iter().map(|(item, hash, change)| {
            let engine = Arc::clone(&self.engine);
            async move {
                let embedded = engine.embed(&item.text).await;
                (item, hash, change, embedded)
            }
        }))
        .buffer_unordered(self.config.embed_concurrency.max(1))
        .collect()
        .await;

        for (item, hash, change, embedded) in outcomes {
            let upserted = embedded.and_then(|vector| {
                self.index.upsert(EmbeddingRecord {
                    id: item.id.clone(),
                    kind: item.kind,
                    vector,
                    source_hash: hash,
                    snippet: snippet(&item.text, snippet_len),
                })
            });

            match upserted {
                Ok(()) => match change {
                    Change::Insert => report.inserted += 1,
                    Change::Update => report.updated += 1,
                },
                Err(error) => {
                    tracing::warn!(id = %item.id, %error, "skipping item during sync");
                    report.failures.push(SyncFailure {
                        id: item.id.clone(),
                        error,
                    });
                }
            }
        }

        // Tombstone sweep: drop records whose source row is gone
        let live: HashSet<&ContentId> = items.iter().map(|item| &item.id).collect();
        for id in self.index.ids() {
            if !live.contains(&id) && self.index.delete(&id) {
                tracing::debug!(%id, "swept stale record");
                report.removed += 1;
            }
        }

        tracing::info!(
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped,
            removed = report.removed,
            failed = report.failures.len(),
            "sync complete"
        );
        report
    }
}

/// First `max` characters of `text`, with an ellipsis when truncated
fn snippet(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}
