//! In-memory vector store: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use quartermaster_core::error::{Error, Result};
use quartermaster_core::memory::{Distance, MemoryRecord, ScoredRecord, VectorStore};
use tokio::sync::RwLock;
use crate::vector::{ensure_dimension, nearest};

/// A vector store that keeps records in a Vec.
/// Same contract as the file store, without persistence.
pub struct InMemoryVectorStore {
    metric: Distance,
    records: RwLock<Vec<MemoryRecord>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            metric: Distance::default(),
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn with_distance(mut self, metric: Distance) -> Self {
        self.metric = metric;
        self
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn name(&self) -> &str { "in_memory" }

    async fn insert(&self, record: MemoryRecord) -> Result<()> {
        let mut records = self.records.write().await;
        ensure_dimension(&records, record.vector.len())?;
        if records.iter().any(|r| r.id == record.id) {
            return Err(Error::InvalidArgument(format!("duplicate record id {}", record.id)));
        }
        records.push(record);
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<MemoryRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredRecord>> {
        nearest(&self.records.read().await, vector, k, self.metric)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartermaster_core::error::StorageError;
    use quartermaster_core::memory::Metadata;

    fn record(id: &str, vector: Vec<f32>) -> MemoryRecord {
        MemoryRecord {
            id: id.into(),
            fact: format!("fact {id}"),
            vector,
            metadata: Metadata::new(),
        }
    }

    #[tokio::test]
    async fn insert_and_get_all_in_order() {
        let store = InMemoryVectorStore::new();
        store.insert(record("a", vec![1.0, 0.0])).await.unwrap();
        store.insert(record("b", vec![0.0, 1.0])).await.unwrap();
        let all = store.get_all().await.unwrap();
        assert_eq!(all.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn query_bounded_by_count() {
        let store = InMemoryVectorStore::new();
        store.insert(record("a", vec![1.0, 0.0])).await.unwrap();
        let hits = store.query(&[1.0, 0.0], 5).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn rejects_mismatched_dimension() {
        let store = InMemoryVectorStore::new();
        store.insert(record("a", vec![1.0, 0.0])).await.unwrap();
        let err = store.insert(record("b", vec![1.0])).await.unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::DimensionMismatch { .. })));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rejects_empty_vector() {
        let store = InMemoryVectorStore::new();
        assert!(matches!(
            store.insert(record("a", vec![])).await,
            Err(Error::InvalidArgument(_))
        ));
    }
}
