//! Model provider implementations for Quartermaster.
//!
//! All providers implement the `quartermaster_core::Provider` trait.
//! The router selects the chat and embedding providers from configuration.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{build_from_config, ProviderRouter};
