//! Procurement tools for the Quartermaster agent.
//!
//! - `consult_memory`: remembered site rules, limits and bans
//! - `search_vendors`: vendor offers for a product
//! - `check_approval`: cost versus limit

pub mod check_approval;
pub mod consult_memory;
pub mod vendor_search;

use quartermaster_core::tool::ToolRegistry;
use quartermaster_memory::MemoryLayer;
use std::sync::Arc;

pub use check_approval::{CheckApprovalTool, CHECK_APPROVAL};
pub use consult_memory::{ConsultMemoryTool, CONSULT_MEMORY, NO_RULES_FOUND};
pub use vendor_search::{JsonVendorCatalog, StaticVendorCatalog, VendorCatalog, VendorSearchTool, SEARCH_VENDORS};

/// Create the registry handed to the procurement agent.
///
/// Registration order is the order the model sees the tools in:
/// memory first, then vendors, then the limit check.
pub fn procurement_registry(
    memory: Arc<MemoryLayer>,
    catalog: Arc<dyn VendorCatalog>,
    memory_limit: usize,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ConsultMemoryTool::new(memory).with_limit(memory_limit)));
    registry.register(Box::new(VendorSearchTool::new(catalog)));
    registry.register(Box::new(CheckApprovalTool));
    registry
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use quartermaster_core::error::ProviderError;
    use quartermaster_core::message::Message;
    use quartermaster_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use quartermaster_memory::{FactExtractor, HashEmbedder, InMemoryVectorStore, MemoryLayer};
    use std::sync::Arc;

    /// Extraction model that stores the quoted input as the fact.
    pub struct EchoExtractor;

    #[async_trait]
    impl Provider for EchoExtractor {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            let prompt = &request.messages[0].content;
            let start = prompt.find("Input: \"").map(|i| i + 8).unwrap_or(0);
            let end = prompt.rfind("\"\n").unwrap_or(prompt.len());
            Ok(ProviderResponse {
                message: Message::assistant(&prompt[start..end]),
                usage: None,
                model: "echo".into(),
            })
        }
    }

    /// A memory layer over an in-memory store with offline embeddings.
    pub fn echo_memory() -> (Arc<MemoryLayer>, Arc<InMemoryVectorStore>) {
        let store = Arc::new(InMemoryVectorStore::new());
        let layer = MemoryLayer::new(
            FactExtractor::new(Arc::new(EchoExtractor), "echo"),
            Arc::new(HashEmbedder::new(128)),
            store.clone(),
        );
        (Arc::new(layer), store)
    }
}
