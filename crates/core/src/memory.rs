//! Memory traits: embedding and vector storage for remembered facts.
//!
//! A fact the user teaches the assistant ("Site A budget limit is 50000") is
//! embedded into a fixed-length vector and stored with its metadata. Later
//! queries are embedded the same way and answered by nearest-neighbour search.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::error::{ProviderError, Result};

/// Metadata key holding the raw user text a fact was extracted from.
pub const ORIGINAL_INPUT_KEY: &str = "original_input";

/// Metadata key holding the RFC 3339 capture time.
pub const TIMESTAMP_KEY: &str = "timestamp";

/// A metadata value: either text or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Number(f64),
    Text(String),
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for MetadataValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for MetadataValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// How vector stores measure closeness. Lower is always more similar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    /// Squared Euclidean distance
    #[default]
    L2,
    /// 1 - cosine similarity
    Cosine,
}

impl std::fmt::Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::L2 => f.write_str("l2"),
            Self::Cosine => f.write_str("cosine"),
        }
    }
}

/// Record metadata, ordered by key for stable output.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// One stored fact. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,

    /// The extracted fact, one concise sentence
    pub fact: String,

    /// Embedding of `fact`
    pub vector: Vec<f32>,

    /// Always includes `original_input` and `timestamp`
    #[serde(default)]
    pub metadata: Metadata,
}

/// A record returned by a nearest-neighbour query. Lower distance is more similar.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: MemoryRecord,
    pub distance: f32,
}

/// A search hit shaped for display and for the agent's memory tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryHit {
    pub fact: String,
    pub metadata: Metadata,
    /// Distance to the query
    pub score: f32,
}

/// A stored fact shaped for listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryView {
    pub fact: String,
    pub metadata: Metadata,
}

impl From<MemoryRecord> for MemoryView {
    fn from(record: MemoryRecord) -> Self {
        Self {
            fact: record.fact,
            metadata: record.metadata,
        }
    }
}

impl From<ScoredRecord> for MemoryHit {
    fn from(scored: ScoredRecord) -> Self {
        Self {
            fact: scored.record.fact,
            metadata: scored.record.metadata,
            score: scored.distance,
        }
    }
}

/// Turns text into a fixed-length vector.
///
/// A pure function of (text, model): no caching, no retries.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// The embedding model identifier (e.g., "text-embedding-3-small").
    fn model(&self) -> &str;

    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError>;
}

/// The core VectorStore trait.
///
/// Implementations: JSONL file-backed (persistent), in-memory (tests).
/// Every record in one collection has the same dimensionality; stores reject
/// inserts and queries that disagree with it.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The backend name (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    /// Persist one record. A failed insert leaves the store unchanged.
    async fn insert(&self, record: MemoryRecord) -> Result<()>;

    /// Every record, in insertion order.
    async fn get_all(&self) -> Result<Vec<MemoryRecord>>;

    /// Up to `min(k, count)` records nearest to `vector`, ascending distance.
    /// `k == 0` is an invalid argument.
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredRecord>>;

    async fn count(&self) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> MemoryRecord {
        let mut metadata = Metadata::new();
        metadata.insert(ORIGINAL_INPUT_KEY.into(), "Site A budget limit is 50000".into());
        metadata.insert(TIMESTAMP_KEY.into(), "2025-01-01T00:00:00+00:00".into());
        metadata.insert("site".into(), MetadataValue::from(1_i64));
        MemoryRecord {
            id: "mem_001".into(),
            fact: "Site A budget limit is 50000.".into(),
            vector: vec![0.1, 0.2, 0.3],
            metadata,
        }
    }

    #[test]
    fn metadata_values_roundtrip_untagged() {
        let json = serde_json::to_string(&record()).unwrap();
        assert!(json.contains("\"site\":1.0"));
        assert!(json.contains("\"original_input\":\"Site A budget limit is 50000\""));
        let back: MemoryRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.metadata.get("site"), Some(&MetadataValue::Number(1.0)));
    }

    #[test]
    fn view_and_hit_drop_vector() {
        let view = MemoryView::from(record());
        assert_eq!(view.fact, "Site A budget limit is 50000.");
        let hit = MemoryHit::from(ScoredRecord {
            record: record(),
            distance: 0.25,
        });
        assert!((hit.score - 0.25).abs() < f32::EPSILON);
        assert!(hit.metadata.contains_key(TIMESTAMP_KEY));
    }

    #[test]
    fn metadata_value_display() {
        assert_eq!(MetadataValue::from("Mumbai").to_string(), "Mumbai");
        assert_eq!(MetadataValue::from(50000_i64).to_string(), "50000");
    }
}
