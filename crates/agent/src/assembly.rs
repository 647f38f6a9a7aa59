//! Memory layer assembly from configuration.

use std::sync::Arc;
use quartermaster_config::AppConfig;
use quartermaster_core::error::{Error, ProviderError, Result};
use quartermaster_core::memory::EmbeddingProvider;
use quartermaster_core::provider::Provider;
use quartermaster_memory::{FactExtractor, FileVectorStore, HashEmbedder, MemoryLayer, ProviderEmbedder};
use tracing::info;

/// Build the memory layer described by `config`.
///
/// Facts are extracted with `chat`. Embeddings come from the offline hash
/// embedder when `embedding.provider = "hash"`, otherwise from `embedding`,
/// which must then be present.
pub fn build_memory_layer(
    config: &AppConfig,
    chat: Arc<dyn Provider>,
    embedding: Option<Arc<dyn Provider>>,
) -> Result<Arc<MemoryLayer>> {
    let store = FileVectorStore::open_collection(&config.memory.db_path, &config.memory.collection)?
        .with_distance(config.memory.distance);

    let embedder: Arc<dyn EmbeddingProvider> = if config.embedding.is_offline() {
        Arc::new(HashEmbedder::new(config.embedding.dimensions))
    } else {
        let provider = embedding.ok_or_else(|| {
            Error::Provider(ProviderError::NotConfigured(format!(
                "No embedding provider for '{}'",
                config.embedding.model_string()
            )))
        })?;
        Arc::new(ProviderEmbedder::new(provider, config.embedding.wire_model()))
    };

    info!(
        store = %store.path().display(),
        embedder = %embedder.model(),
        distance = %config.memory.distance,
        "Memory layer ready"
    );

    let extractor = FactExtractor::new(chat, config.llm.wire_model());
    Ok(Arc::new(MemoryLayer::new(extractor, embedder, Arc::new(store))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::EchoExtractor;

    fn offline_config(dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.embedding.provider = "hash".into();
        config.embedding.dimensions = 64;
        config.memory.db_path = dir.to_path_buf();
        config
    }

    #[tokio::test]
    async fn offline_layer_persists_to_the_collection_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = offline_config(dir.path());

        let layer = build_memory_layer(&config, Arc::new(EchoExtractor), None).unwrap();
        layer.add("Mumbai site budget limit is 50000", None).await.unwrap();

        assert!(config.memory.collection_path().exists());
        let reopened = build_memory_layer(&config, Arc::new(EchoExtractor), None).unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        assert_eq!(reopened.store_name(), "file");
    }

    #[test]
    fn hosted_embeddings_need_a_provider() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = offline_config(dir.path());
        config.embedding.provider = "openai".into();

        let err = build_memory_layer(&config, Arc::new(EchoExtractor), None).err().unwrap();
        assert!(matches!(err, Error::Provider(ProviderError::NotConfigured(_))));
    }
}
