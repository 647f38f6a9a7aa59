//! # Quartermaster Core
//!
//! Domain types, traits, and error definitions for the Quartermaster
//! procurement assistant. This crate has **no framework dependencies**: it
//! defines the domain model that every other crate implements against.
//!
//! ## Design
//!
//! Each external collaborator (language model, embedder, vector store, tool)
//! is a trait here. Implementations live in their own crates, so backends can
//! be swapped through configuration and replaced by mocks in tests.

pub mod error;
pub mod event;
pub mod memory;
pub mod message;
pub mod procurement;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use memory::{Distance, EmbeddingProvider, MemoryHit, MemoryRecord, MemoryView, Metadata, MetadataValue, ScoredRecord, VectorStore};
pub use message::{Message, Role, SessionId, Transcript};
pub use procurement::{Decision, Intent, OrderStatus, PendingOrder, Vendor};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
