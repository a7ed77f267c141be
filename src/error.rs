//! Error types for the finance client core.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors talking to the remote REST backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    #[error("Failed to build client: {0}")]
    Client(String),
}

impl ApiError {
    /// Endpoint path the failure relates to, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Transport { endpoint, .. }
            | Self::Status { endpoint, .. }
            | Self::Decode { endpoint, .. } => Some(endpoint),
            Self::Client(_) => None,
        }
    }
}

/// Local cache errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
