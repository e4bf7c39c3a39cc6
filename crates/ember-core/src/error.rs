//! Error types for ember-core.

use thiserror::Error;

/// Result type alias using ember-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for focus-session operations
#[derive(Error, Debug)]
pub enum Error {
    // Workflow errors
    #[error("Focus session not found for session '{session_key}' and category '{category}'")]
    NotFound {
        session_key: String,
        category: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Generator errors
    #[error("Suggestion generation failed: {0}")]
    GenerationFailed(String),

    #[error("Generator not configured: {0}")]
    Unconfigured(String),

    // Store errors
    #[cfg(feature = "db")]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a not-found error for a (session, category) pair
    pub fn not_found(session_key: impl Into<String>, category: impl Into<String>) -> Self {
        Self::NotFound {
            session_key: session_key.into(),
            category: category.into(),
        }
    }

    /// Create an invalid-argument error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a generation failure
    pub fn generation(message: impl Into<String>) -> Self {
        Self::GenerationFailed(message.into())
    }

    /// Whether this error means the generator has no credentials
    pub fn is_unconfigured(&self) -> bool {
        matches!(self, Self::Unconfigured(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
