//! File-based vector store: persistent JSON-lines collections.
//!
//! One collection per file, one JSON-encoded `MemoryRecord` per line:
//! `<db_path>/<collection>.jsonl`. Human-inspectable, no external services.
//!
//! Writes are atomic: the whole collection is written to `<file>.tmp` and
//! renamed over the live file. The in-memory copy only changes after the
//! rename succeeds, so a failed write leaves the store exactly as it was.

use async_trait::async_trait;
use quartermaster_core::error::{Error, Result, StorageError};
use quartermaster_core::memory::{Distance, MemoryRecord, ScoredRecord, VectorStore};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use crate::vector::{ensure_dimension, nearest};

/// A file-backed vector store using JSONL.
///
/// Records are loaded into memory on open and the full collection is
/// rewritten on every insert. Fast reads, durable writes.
pub struct FileVectorStore {
    path: PathBuf,
    metric: Distance,
    records: RwLock<Vec<MemoryRecord>>,
}

impl FileVectorStore {
    /// Open (or lazily create) the collection file at `path`.
    ///
    /// A missing file starts an empty collection; the file appears on first insert.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = Self::load_from_disk(&path)?;
        info!(path = %path.display(), count = records.len(), "Vector store loaded");
        Ok(Self {
            path,
            metric: Distance::default(),
            records: RwLock::new(records),
        })
    }

    /// Open collection `collection` under directory `db_path`.
    pub fn open_collection(db_path: &Path, collection: &str) -> Result<Self> {
        Self::open(db_path.join(format!("{collection}.jsonl")))
    }

    pub fn with_distance(mut self, metric: Distance) -> Self {
        self.metric = metric;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load records from a JSONL file, skipping lines that don't parse or
    /// disagree with the collection's dimension.
    fn load_from_disk(path: &Path) -> Result<Vec<MemoryRecord>> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::Unavailable(format!(
                    "Failed to read {}: {e}",
                    path.display()
                ))
                .into());
            }
        };

        let mut records: Vec<MemoryRecord> = Vec::new();
        for (lineno, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = match serde_json::from_str::<MemoryRecord>(line) {
                Ok(record) => record,
                Err(e) => {
                    warn!(line = lineno + 1, error = %e, "Skipping corrupted memory record");
                    continue;
                }
            };
            if let Err(e) = ensure_dimension(&records, record.vector.len()) {
                warn!(line = lineno + 1, id = %record.id, error = %e, "Skipping memory record");
                continue;
            }
            records.push(record);
        }
        Ok(records)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Write `records` to the tmp file and rename it over the live file.
    async fn persist(&self, records: &[&MemoryRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::Unavailable(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let mut content = String::new();
        for record in records {
            content.push_str(&serde_json::to_string(record)?);
            content.push('\n');
        }

        let tmp = self.tmp_path();
        if let Err(e) = tokio::fs::write(&tmp, content.as_bytes()).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StorageError::WriteFailed(format!("Failed to write {}: {e}", tmp.display())).into());
        }

        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StorageError::WriteFailed(format!(
                "Failed to replace {}: {e}",
                self.path.display()
            ))
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for FileVectorStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn insert(&self, record: MemoryRecord) -> Result<()> {
        let mut records = self.records.write().await;
        ensure_dimension(&records, record.vector.len())?;
        if records.iter().any(|r| r.id == record.id) {
            return Err(Error::InvalidArgument(format!("duplicate record id {}", record.id)));
        }

        let snapshot: Vec<&MemoryRecord> = records.iter().chain(std::iter::once(&record)).collect();
        self.persist(&snapshot).await?;

        debug!(id = %record.id, count = records.len() + 1, "Memory record persisted");
        records.push(record);
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<MemoryRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredRecord>> {
        let records = self.records.read().await;
        nearest(&records, vector, k, self.metric)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}
