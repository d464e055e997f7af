//! Error types for the Sift domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type; `Error` wraps them all.

use thiserror::Error;

/// The top-level error type for all Sift operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Completion / retrieval backends ---
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    // --- Backend selection ---
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    // --- Model metadata ---
    #[error("Lookup miss: {0}")]
    Lookup(#[from] LookupMiss),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure talking to a completion or retrieval backend.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The backend answered with a non-success HTTP status.
    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    /// A 2xx response whose body could not be decoded.
    #[error("Failed to decode backend response: {0}")]
    Decode(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),
}

impl BackendError {
    /// The upstream HTTP status, when the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// An unsupported or misconfigured backend variant.
#[derive(Debug, Clone, Error)]
pub enum ConfigurationError {
    #[error("Completion backend '{0}' is not supported (expected one of: openai, rapid, local)")]
    UnsupportedBackend(String),

    #[error("Backend '{backend}' requires {what}")]
    Missing { backend: String, what: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Model metadata was not available. Callers treat this as absence,
/// never as a zero or default context length.
#[derive(Debug, Clone, Error)]
#[error("No model information available for '{model}'")]
pub struct LookupMiss {
    pub model: String,
}
