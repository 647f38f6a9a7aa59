//! Error types for the Quartermaster domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] unifies them.

use thiserror::Error;

/// The top-level error type for all Quartermaster operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model / embedding calls ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Vector store ---
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    // --- Tools ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Structured output ---
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    // --- Caller mistakes ---
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of a language-model or embedding call.
///
/// Never retried inside the library: the caller decides whether to retry
/// or surface the failure.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

/// Failures of the persistent vector store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Vector store unavailable: {0}")]
    Unavailable(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Embedding dimension mismatch: collection holds {expected}-dim vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// The agent's structured decision block was missing or malformed.
///
/// Never fatal: the orchestrator degrades to returning the raw text.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("No decision block found in agent output")]
    MissingDecision,

    #[error("Decision block is malformed: {0}")]
    MalformedDecision(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}
