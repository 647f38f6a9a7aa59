//! The memory layer: extract → embed → store, and embed → search.
//!
//! This is the only writer of memory records. A fact is either stored in
//! full (fact, vector, metadata) or not at all.

use chrono::Utc;
use quartermaster_core::error::{Error, Result};
use quartermaster_core::memory::{
    EmbeddingProvider, MemoryHit, MemoryRecord, MemoryView, Metadata, VectorStore, ORIGINAL_INPUT_KEY,
    TIMESTAMP_KEY,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use crate::extractor::FactExtractor;

/// Default number of hits returned by [`MemoryLayer::search`].
pub const DEFAULT_SEARCH_LIMIT: usize = 3;

/// Semantic memory over a vector store.
pub struct MemoryLayer {
    extractor: FactExtractor,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl MemoryLayer {
    pub fn new(
        extractor: FactExtractor,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            extractor,
            embedder,
            store,
        }
    }

    /// Learn from `user_input`: extract a fact, embed it, persist it.
    ///
    /// Caller metadata is kept, but `original_input` and `timestamp` are
    /// always set by the layer. Returns the stored fact.
    pub async fn add(&self, user_input: &str, metadata: Option<Metadata>) -> Result<String> {
        let fact = self.extractor.extract(user_input).await?;
        let vector = self.embedder.embed(&fact).await?;

        let mut metadata = metadata.unwrap_or_default();
        metadata.insert(ORIGINAL_INPUT_KEY.into(), user_input.into());
        metadata.insert(TIMESTAMP_KEY.into(), Utc::now().to_rfc3339().into());

        let record = MemoryRecord {
            id: Uuid::new_v4().to_string(),
            fact: fact.clone(),
            vector,
            metadata,
        };
        let id = record.id.clone();
        self.store.insert(record).await?;

        info!(id = %id, fact = %fact, "Stored memory");
        Ok(fact)
    }

    /// Up to `limit` stored facts nearest to `query`, closest first.
    ///
    /// An empty store answers without calling the embedder.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<MemoryHit>> {
        if limit == 0 {
            return Err(Error::InvalidArgument("limit must be at least 1".into()));
        }
        if self.store.count().await? == 0 {
            debug!("Memory is empty, skipping embedding");
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed(query).await?;
        let hits: Vec<MemoryHit> = self
            .store
            .query(&vector, limit)
            .await?
            .into_iter()
            .map(MemoryHit::from)
            .collect();

        debug!(query = %query, hits = hits.len(), "Memory search");
        Ok(hits)
    }

    /// Every stored fact, shaped for display.
    pub async fn get_all(&self) -> Result<Vec<MemoryView>> {
        Ok(self
            .store
            .get_all()
            .await?
            .into_iter()
            .map(MemoryView::from)
            .collect())
    }

    pub async fn count(&self) -> Result<usize> {
        self.store.count().await
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }
}
