//! Provider router: builds and hands out the chat and embedding providers.
//!
//! The chat provider and the embedding provider may be different backends
//! (e.g. Groq for reasoning, OpenAI for embeddings). When both name the same
//! provider and endpoint, one client is shared.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use quartermaster_config::AppConfig;
use quartermaster_core::error::ProviderError;
use quartermaster_core::provider::Provider;
use crate::openai_compat::OpenAiCompatProvider;

/// Routes model requests to the configured providers.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    chat_provider: String,
    embedding_provider: Option<String>,
}

impl ProviderRouter {
    /// Create a new router whose chat traffic goes to `chat_provider`.
    pub fn new(chat_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            chat_provider: chat_provider.into(),
            embedding_provider: None,
        }
    }

    /// Register a provider under `key`.
    pub fn register(&mut self, key: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(key.into(), provider);
    }

    /// Route embedding requests to the provider registered under `key`.
    pub fn set_embedding(&mut self, key: impl Into<String>) {
        self.embedding_provider = Some(key.into());
    }

    /// The provider used for classification, extraction and the agent.
    pub fn chat(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.chat_provider).cloned()
    }

    /// The provider used for embeddings; `None` when embeddings are computed offline.
    pub fn embedding(&self) -> Option<Arc<dyn Provider>> {
        self.embedding_provider
            .as_ref()
            .and_then(|key| self.providers.get(key))
            .cloned()
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(key).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        keys.sort_unstable();
        keys
    }
}

/// Build providers from configuration.
pub fn build_from_config(config: &AppConfig) -> Result<ProviderRouter, ProviderError> {
    let timeout = Duration::from_secs(config.llm.timeout_secs);

    let chat_url = config
        .llm
        .api_url
        .clone()
        .unwrap_or_else(|| default_base_url(&config.llm.provider));
    let chat_key = provider_key(&config.llm.provider, &chat_url);

    let mut router = ProviderRouter::new(&chat_key);
    router.register(
        chat_key.clone(),
        Arc::new(OpenAiCompatProvider::new(
            &config.llm.provider,
            &chat_url,
            config.llm.api_key.clone().unwrap_or_default(),
            timeout,
        )?),
    );

    if !config.embedding.is_offline() {
        let embed_url = config
            .embedding
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(&config.embedding.provider));
        let embed_key = provider_key(&config.embedding.provider, &embed_url);
        let embed_api_key = config.embedding.api_key.clone().unwrap_or_default();

        // Share the chat client only if it would authenticate the same way.
        let same_credentials = config.embedding.api_key == config.llm.api_key;
        if router.get(&embed_key).is_none() || !same_credentials {
            let embed_key = if router.get(&embed_key).is_some() {
                format!("{embed_key}#embedding")
            } else {
                embed_key.clone()
            };
            router.register(
                embed_key.clone(),
                Arc::new(OpenAiCompatProvider::new(
                    &config.embedding.provider,
                    &embed_url,
                    embed_api_key,
                    timeout,
                )?),
            );
            router.set_embedding(embed_key);
        } else {
            router.set_embedding(embed_key);
        }
    }

    tracing::debug!(providers = ?router.list(), "Built provider router");
    Ok(router)
}

fn provider_key(provider: &str, base_url: &str) -> String {
    format!("{provider}@{base_url}")
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openai" => "https://api.openai.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
