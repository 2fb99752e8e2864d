//! Unified error handling for the podium crate
//!
//! Domain modules define their own error types ([`ScoringError`],
//! [`CacheError`]) and this module folds them into a single [`Error`] enum so
//! callers crossing module boundaries handle one type.
//!
//! # Usage
//!
//! ```rust,ignore
//! use podium::error::{Error, PodiumErrorTrait};
//!
//! fn report(err: &Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(error = %err, "retrying on next run");
//!     } else {
//!         tracing::error!(error = %err, category = ?err.category(), "fatal");
//!     }
//! }
//! ```

use thiserror::Error;

pub use crate::cache::CacheError;
pub use crate::ranking::ScoringError;

/// Common trait for all podium error types
pub trait PodiumErrorTrait: std::error::Error {
    /// Check if this error is recoverable (a later run may succeed)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Scoring source failures (isolated per leaderboard)
    Scoring,
    /// Caller misuse of the batch cache
    Integration,
    /// Storage and I/O errors
    Storage,
    /// Configuration and validation errors
    Config,
    /// Authorization failures on the admin surface
    Auth,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scoring => "scoring",
            Self::Integration => "integration",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Auth => "auth",
            Self::Other => "other",
        }
    }
}

/// Unified error type for the podium crate
#[derive(Error, Debug)]
pub enum Error {
    /// A category's scoring source failed
    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    /// Snapshot cache used out of contract
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Snapshot store failure, carrying the anyhow context chain
    #[error("Storage error: {0:#}")]
    Storage(anyhow::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Caller is not allowed to perform an admin operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PodiumErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Scoring(e) => e.is_recoverable(),
            Self::Cache(e) => e.is_recoverable(),
            Self::Storage(_) => true,
            Self::Config(_) => false,
            Self::Unauthorized(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Scoring(_) => ErrorCategory::Scoring,
            Self::Cache(_) => ErrorCategory::Integration,
            Self::Storage(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
            Self::Unauthorized(_) => ErrorCategory::Auth,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authorization error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Storage implementations report through anyhow with context
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(err)
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
