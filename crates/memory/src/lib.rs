//! Semantic memory for Quartermaster.
//!
//! Vector math, vector stores (JSONL file, in-memory), embedders, the fact
//! extractor, and the [`MemoryLayer`] that ties them together.

pub mod embedding;
pub mod extractor;
pub mod file_store;
pub mod in_memory;
pub mod layer;
pub mod vector;

pub use embedding::{HashEmbedder, ProviderEmbedder};
pub use extractor::FactExtractor;
pub use file_store::FileVectorStore;
pub use in_memory::InMemoryVectorStore;
pub use layer::{MemoryLayer, DEFAULT_SEARCH_LIMIT};
pub use vector::{cosine_similarity, nearest, squared_l2};
