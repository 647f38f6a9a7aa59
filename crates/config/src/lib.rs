//! Configuration loading, validation, and management for Quartermaster.
//!
//! Loads configuration from `~/.quartermaster/config.toml` (or an explicit
//! path) with environment variable overrides. Validates all settings at startup.

use quartermaster_core::memory::Distance;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Providers reached over an OpenAI-compatible HTTP API.
pub const KNOWN_PROVIDERS: &[&str] = &["openai", "groq", "openrouter", "ollama"];

/// Providers that need an API key.
const HOSTED_PROVIDERS: &[&str] = &["openai", "groq", "openrouter"];

/// The root configuration structure.
///
/// Maps directly to `~/.quartermaster/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub approval: ApprovalConfig,

    #[serde(default)]
    pub vendors: VendorsConfig,
}

/// Language-model settings used by classification, extraction and the agent.
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override (e.g., a self-hosted gateway)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP timeout for one model call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_provider() -> String {
    "groq".into()
}
fn default_llm_model() -> String {
    "llama3-70b-8192".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            api_key: None,
            api_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// `provider/model`, unless the model already carries the provider prefix.
    pub fn model_string(&self) -> String {
        compose_model_string(&self.provider, &self.model)
    }

    /// The model name as sent to an OpenAI-compatible endpoint.
    pub fn wire_model(&self) -> &str {
        strip_provider_prefix(&self.provider, &self.model)
    }
}

/// Embedding settings for the memory layer.
#[derive(Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// One of the known providers, or `hash` for the offline embedder
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Vector length produced by the `hash` embedder
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

fn default_embedding_provider() -> String {
    "openai".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_dimensions() -> usize {
    384
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            api_key: None,
            api_url: None,
            dimensions: default_dimensions(),
        }
    }
}

impl EmbeddingConfig {
    pub fn model_string(&self) -> String {
        compose_model_string(&self.provider, &self.model)
    }

    pub fn wire_model(&self) -> &str {
        strip_provider_prefix(&self.provider, &self.model)
    }

    pub fn is_offline(&self) -> bool {
        self.provider == "hash"
    }
}

fn compose_model_string(provider: &str, model: &str) -> String {
    if provider.is_empty() || model.starts_with(&format!("{provider}/")) {
        model.to_string()
    } else {
        format!("{provider}/{model}")
    }
}

fn strip_provider_prefix<'a>(provider: &str, model: &'a str) -> &'a str {
    model
        .strip_prefix(provider)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(model)
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Directory holding the collection files
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_collection")]
    pub collection: String,

    /// Hits returned to the agent per memory lookup
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    #[serde(default)]
    pub distance: Distance,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./memory_db")
}
fn default_collection() -> String {
    "project_memories".into()
}
fn default_search_limit() -> usize {
    3
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            collection: default_collection(),
            search_limit: default_search_limit(),
            distance: Distance::default(),
        }
    }
}

impl MemoryConfig {
    /// Path of the collection file.
    pub fn collection_path(&self) -> PathBuf {
        self.db_path.join(format!("{}.jsonl", self.collection))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Upper bound on model calls per procurement turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Refuse vendor searches until memory has been consulted in the turn
    #[serde(default = "default_true")]
    pub enforce_tool_order: bool,

    /// Past exchanges of the session replayed to the agent each turn
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
}

fn default_max_iterations() -> usize {
    8
}
fn default_true() -> bool {
    true
}
fn default_history_turns() -> usize {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            enforce_tool_order: true,
            history_turns: default_history_turns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalConfig {
    /// Replies that approve a pending order (compared trimmed, case-insensitively)
    #[serde(default = "default_affirmative")]
    pub affirmative: Vec<String>,
}

fn default_affirmative() -> Vec<String> {
    vec!["yes".into(), "y".into(), "approve".into(), "ok".into()]
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            affirmative: default_affirmative(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorsConfig {
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("mock_vendors.json")
}

impl Default for VendorsConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.quartermaster/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply process environment overrides.
    ///
    /// Environment variables:
    /// - `LLM_PROVIDER`, `LLM_MODEL_NAME`
    /// - `EMBEDDING_PROVIDER`, `EMBEDDING_MODEL_NAME`
    /// - `VECTOR_DB_PATH`, `VENDOR_CATALOG_PATH`, `OLLAMA_API_BASE`
    /// - `QUARTERMASTER_API_KEY` (highest priority), then `GROQ_API_KEY`,
    ///   `OPENROUTER_API_KEY` or `OPENAI_API_KEY` by provider
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Some(model) = lookup("LLM_MODEL_NAME") {
            self.llm.model = model;
        }
        if let Some(provider) = lookup("EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }
        if let Some(model) = lookup("EMBEDDING_MODEL_NAME") {
            self.embedding.model = model;
        }
        if let Some(path) = lookup("VECTOR_DB_PATH") {
            self.memory.db_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("VENDOR_CATALOG_PATH") {
            self.vendors.catalog_path = PathBuf::from(path);
        }

        if let Some(base) = lookup("OLLAMA_API_BASE") {
            let base = format!("{}/v1", base.trim_end_matches('/').trim_end_matches("/v1"));
            if self.llm.provider == "ollama" && self.llm.api_url.is_none() {
                self.llm.api_url = Some(base.clone());
            }
            if self.embedding.provider == "ollama" && self.embedding.api_url.is_none() {
                self.embedding.api_url = Some(base);
            }
        }

        if self.llm.api_key.is_none() {
            self.llm.api_key = resolve_api_key(&self.llm.provider, &lookup);
        }
        if self.embedding.api_key.is_none() {
            self.embedding.api_key = resolve_api_key(&self.embedding.provider, &lookup);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".quartermaster")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::ValidationError(
                "llm.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::ValidationError("llm.timeout_secs must be > 0".into()));
        }
        if !is_supported(&self.llm.provider, &self.llm.api_url) {
            return Err(ConfigError::ValidationError(format!(
                "llm.provider '{}' is not supported (expected one of {:?}, or set llm.api_url)",
                self.llm.provider, KNOWN_PROVIDERS
            )));
        }
        if !self.embedding.is_offline() && !is_supported(&self.embedding.provider, &self.embedding.api_url) {
            return Err(ConfigError::ValidationError(format!(
                "embedding.provider '{}' is not supported (expected 'hash', one of {:?}, or set embedding.api_url)",
                self.embedding.provider, KNOWN_PROVIDERS
            )));
        }
        if self.embedding.dimensions == 0 {
            return Err(ConfigError::ValidationError("embedding.dimensions must be > 0".into()));
        }
        if self.memory.search_limit == 0 {
            return Err(ConfigError::ValidationError("memory.search_limit must be > 0".into()));
        }
        if self.memory.collection.trim().is_empty() {
            return Err(ConfigError::ValidationError("memory.collection must not be empty".into()));
        }
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError("agent.max_iterations must be > 0".into()));
        }
        if self.approval.affirmative.iter().all(|a| a.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "approval.affirmative must list at least one reply".into(),
            ));
        }
        Ok(())
    }

    /// Warn about hosted providers configured without a key. Returns the warnings.
    pub fn validate_keys(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if HOSTED_PROVIDERS.contains(&self.llm.provider.as_str()) && self.llm.api_key.is_none() {
            warnings.push(format!("llm.provider is '{}' but no API key is set", self.llm.provider));
        }
        if HOSTED_PROVIDERS.contains(&self.embedding.provider.as_str()) && self.embedding.api_key.is_none() {
            warnings.push(format!(
                "embedding.provider is '{}' but no API key is set",
                self.embedding.provider
            ));
        }
        for warning in &warnings {
            tracing::warn!("{warning}");
        }
        warnings
    }

    /// Generate a default config TOML string (for the `config` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

fn is_supported(provider: &str, api_url: &Option<String>) -> bool {
    KNOWN_PROVIDERS.contains(&provider) || api_url.is_some()
}

fn resolve_api_key<F>(provider: &str, lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let provider_var = match provider {
        "groq" => Some("GROQ_API_KEY"),
        "openrouter" => Some("OPENROUTER_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        _ => None,
    };
    lookup("QUARTERMASTER_API_KEY").or_else(|| provider_var.and_then(|var| lookup(var)))
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
