//! Retrieval service
//!
//! Embeds a free-text query, runs it against the vector index, and returns
//! the top-K content items with scores and display snippets. Kind filtering
//! happens after the index query, so filtered retrievals oversample
//! candidates and widen the net until enough matches are found or the index
//! is exhausted.

use std::collections::HashMap;
use std::sync::Arc;

use crate::content::{ContentId, ContentKind, RetrievalResult};
use crate::embedding::EmbeddingEngine;
use crate::error::{Result, RetrievalError};
use crate::index::VectorIndex;

/// Retrieval tuning knobs
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Candidate multiplier applied before post-query kind filtering
    pub oversample: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self { oversample: 4 }
    }
}

/// Query-side entry point over the engine and index
pub struct Retriever {
    engine: Arc<EmbeddingEngine>,
    index: Arc<VectorIndex>,
    config: RetrieverConfig,
}

impl Retriever {
    pub fn new(engine: Arc<EmbeddingEngine>, index: Arc<VectorIndex>) -> Self {
        Self::with_config(engine, index, RetrieverConfig::default())
    }

    pub fn with_config(
        engine: Arc<EmbeddingEngine>,
        index: Arc<VectorIndex>,
        config: RetrieverConfig,
    ) -> Self {
        Self {
            engine,
            index,
            config,
        }
    }

    /// Top-`k` content items most similar to `query_text`.
    ///
    /// With a `kind_filter`, non-matching kinds are dropped after the index
    /// query; the service oversamples so `k` filtered results come back
    /// whenever that many exist. An empty index (or one with no eligible
    /// records) yields an empty list, not an error. `InvalidInput` for a
    /// zero `k` or an empty query.
    pub async fn retrieve(
        &self,
        query_text: &str,
        k: usize,
        kind_filter: Option<ContentKind>,
    ) -> Result<Vec<RetrievalResult>> {
        if k == 0 {
            return Err(RetrievalError::invalid_input("k must be positive"));
        }
        if query_text.trim().is_empty() {
            return Err(RetrievalError::invalid_input("query text is empty"));
        }
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.engine.embed(query_text).await?;

        let hits = match kind_filter {
            None => self.index.query(&query_vector, k)?,
            Some(kind) => self.filtered_query(&query_vector, k, kind)?,
        };

        tracing::debug!(query = query_text, k, hits = hits.len(), "retrieval");

        Ok(hits
            .into_iter()
            .filter_map(|(id, score)| {
                // A record deleted since the index query just drops out
                self.index.get(&id).map(|record| RetrievalResult {
                    id,
                    kind: record.kind,
                    score,
                    snippet: record.snippet,
                })
            })
            .take(k)
            .collect())
    }

    /// Best tag match per name, merged into one ranked, deduplicated list.
    ///
    /// Used to gather grounding content for a persona's assigned tags; each
    /// name is searched as its own query and the highest score wins when
    /// the same record surfaces for several names. A name that cannot be
    /// embedded (no indexable tokens, backend outage) is skipped so the
    /// other names still contribute; the request degrades to partial
    /// results instead of failing outright.
    pub async fn retrieve_for_tags(
        &self,
        tag_names: &[String],
        k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        if k == 0 {
            return Err(RetrievalError::invalid_input("k must be positive"));
        }

        let mut best: HashMap<ContentId, RetrievalResult> = HashMap::new();
        for name in tag_names {
            if name.trim().is_empty() {
                continue;
            }
            let hits = match self.retrieve(name, k, Some(ContentKind::Tag)).await {
                Ok(hits) => hits,
                Err(error) => {
                    tracing::warn!(name, %error, "skipping tag name during merge");
                    continue;
                }
            };
            for result in hits {
                match best.get(&result.id) {
                    Some(existing) if existing.score >= result.score => {}
                    _ => {
                        best.insert(result.id.clone(), result);
                    }
                }
            }
        }

        let mut merged: Vec<RetrievalResult> = best.into_values().collect();
        merged.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        merged.truncate(k);
        Ok(merged)
    }

    /// Query with oversampling until `k` records of `kind` are found or
    /// every record has been considered.
    fn filtered_query(
        &self,
        vector: &[f32],
        k: usize,
        kind: ContentKind,
    ) -> Result<Vec<(ContentId, f32)>> {
        let total = self.index.len();
        let mut fetch = k.saturating_mul(self.config.oversample.max(1));

        loop {
            let candidates = self.index.query(vector, fetch)?;
            let exhausted = candidates.len() >= total;

            let filtered: Vec<(ContentId, f32)> = candidates
                .into_iter()
                .filter(|(id, _)| {
                    self.index
                        .get(id)
                        .map(|record| record.kind == kind)
                        .unwrap_or(false)
                })
                .collect();

            if filtered.len() >= k || exhausted {
                return Ok(filtered);
            }
            fetch = fetch.saturating_mul(2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentItem;
    use crate::embedding::doubles::StaticEmbedder;
    use crate::embedding::HashedEmbedder;
    use crate::pipeline::IngestionPipeline;

    async fn hashed_retriever(items: &[ContentItem]) -> Retriever {
        let engine = Arc::new(EmbeddingEngine::new(Arc::new(HashedEmbedder::new(128))));
        let index = Arc::new(VectorIndex::new(engine.dims()));
        let pipeline = IngestionPipeline::new(Arc::clone(&engine), Arc::clone(&index));
        let report = pipeline.sync(items).await;
        assert!(report.failures.is_empty());
        Retriever::new(engine, index)
    }

    #[tokio::test]
    async fn test_zero_k_is_invalid() {
        let retriever = hashed_retriever(&[]).await;
        let err = retriever.retrieve("dragon", 0, None).await.unwrap_err();
        assert!(matches!(err, RetrievalError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_empty_query_is_invalid() {
        let retriever = hashed_retriever(&[ContentItem::tag("t", "some tag body")]).await;
        let err = retriever.retrieve("", 5, None).await.unwrap_err();
        assert!(matches!(err, RetrievalError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_empty_index_returns_empty() {
        let retriever = hashed_retriever(&[]).await;
        let results = retriever.retrieve("dragon", 5, None).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_self_retrieval_scores_one() {
        let text = "Stonehaven is a mining village high in the mountains";
        let retriever = hashed_retriever(&[ContentItem::tag("mountain_village", text)]).await;

        let results = retriever.retrieve(text, 1, None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, ContentId::new("mountain_village"));
        assert!((results[0].score - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_mountain_village_scenario() {
        let items = vec![
            ContentItem::tag(
                "mountain_village",
                "Stonehaven is a mining village high in the mountains, \
                 its people quarry stone and dig for silver",
            ),
            ContentItem::tag(
                "tavern_rumors",
                "gossip and rumors whispered over ale at the Drunken Griffin",
            ),
        ];
        let retriever = hashed_retriever(&items).await;

        let results = retriever
            .retrieve("mining village in the mountains", 1, None)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, ContentId::new("mountain_village"));
    }

    #[tokio::test]
    async fn test_kind_filter_drops_other_kinds() {
        let items = vec![
            ContentItem::tag("tag_a", "ancient dwarven mining songs"),
            ContentItem::persona("persona_a", "a dwarf who sings mining songs"),
        ];
        let retriever = hashed_retriever(&items).await;

        let results = retriever
            .retrieve("mining songs", 5, Some(ContentKind::Persona))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind, ContentKind::Persona);
    }

    #[tokio::test]
    async fn test_filter_oversampling_fills_k() {
        // Nine personas sit closer to the query than any tag; a filtered
        // retrieval must still come back with k tags.
        let mut entries: Vec<(String, Vec<f32>)> = Vec::new();
        let mut items = Vec::new();
        for i in 0..9 {
            let text = format!("persona text {i}");
            entries.push((text.clone(), vec![0.95, (i as f32 + 1.0) * 0.01]));
            items.push(ContentItem::persona(format!("persona-{i}"), text));
        }
        for i in 0..3 {
            let text = format!("tag text {i}");
            entries.push((text.clone(), vec![0.3, 0.9 + i as f32 * 0.01]));
            items.push(ContentItem::tag(format!("tag-{i}"), text));
        }
        entries.push(("the query".to_string(), vec![1.0, 0.0]));

        let fixture: Vec<(&str, &[f32])> = entries
            .iter()
            .map(|(text, vector)| (text.as_str(), vector.as_slice()))
            .collect();
        let engine = Arc::new(EmbeddingEngine::new(Arc::new(StaticEmbedder::new(
            2, &fixture,
        ))));
        let index = Arc::new(VectorIndex::new(engine.dims()));
        let pipeline = IngestionPipeline::new(Arc::clone(&engine), Arc::clone(&index));
        let report = pipeline.sync(&items).await;
        assert!(report.failures.is_empty());

        let retriever = Retriever::new(engine, index);
        let results = retriever
            .retrieve("the query", 2, Some(ContentKind::Tag))
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.kind == ContentKind::Tag));
    }

    #[tokio::test]
    async fn test_fully_filtered_index_returns_empty() {
        let items = vec![ContentItem::persona("persona_a", "a wandering bard")];
        let retriever = hashed_retriever(&items).await;

        let results = retriever
            .retrieve("wandering bard", 3, Some(ContentKind::Tag))
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_for_tags_skips_unembeddable_names() {
        let items = vec![ContentItem::tag("dragons", "dragons roost in the high crags")];
        let retriever = hashed_retriever(&items).await;

        // "ax" has no token longer than two characters and cannot be
        // embedded; the other names must still contribute their hits.
        let names = vec!["ax".to_string(), "dragons".to_string()];
        let results = retriever.retrieve_for_tags(&names, 3).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, ContentId::new("dragons"));
    }

    #[tokio::test]
    async fn test_retrieve_for_tags_survives_backend_outage_on_one_name() {
        let flaky = crate::embedding::doubles::FlakyEmbedder {
            inner: HashedEmbedder::new(128),
            fail_on: vec!["tavern".to_string()],
        };
        let engine = Arc::new(EmbeddingEngine::new(Arc::new(flaky)));
        let index = Arc::new(VectorIndex::new(engine.dims()));
        let pipeline = IngestionPipeline::new(Arc::clone(&engine), Arc::clone(&index));
        let report = pipeline
            .sync(&[ContentItem::tag("dragons", "dragons roost in the high crags")])
            .await;
        assert!(report.failures.is_empty());

        let retriever = Retriever::new(engine, index);
        let names = vec!["tavern".to_string(), "dragons".to_string()];
        let results = retriever.retrieve_for_tags(&names, 3).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, ContentId::new("dragons"));
    }

    #[tokio::test]
    async fn test_retrieve_for_tags_merges_and_dedups() {
        let items = vec![
            ContentItem::tag("mountain_village", "Stonehaven mining village lore"),
            ContentItem::tag("tavern_rumors", "tavern gossip and whispered rumors"),
            ContentItem::persona("persona_a", "a miner turned tavern keeper"),
        ];
        let retriever = hashed_retriever(&items).await;

        let names = vec!["mining village".to_string(), "tavern rumors".to_string()];
        let results = retriever.retrieve_for_tags(&names, 4).await.unwrap();

        assert!(!results.is_empty());
        assert!(results.len() <= 4);
        assert!(results.iter().all(|r| r.kind == ContentKind::Tag));

        let mut ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), results.len());
    }
}
