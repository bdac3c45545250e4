//! Error types for the query engine.

use thiserror::Error;

/// Errors surfaced by query operations.
#[derive(Error, Debug)]
pub enum VantageError {
    /// A persisted blob failed to decode; the row is corrupt
    #[error("Blob decode error: {0}")]
    Decode(String),

    /// The persistence DAO failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration failed to load or validate
    #[error("Configuration error: {0}")]
    Config(String),

    /// The query parameters are malformed
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// An invariant the engine relies on did not hold
    #[error("Internal error: {0}")]
    Internal(String),

    /// An underlying IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization of a response value failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for Vantage operations
pub type Result<T> = std::result::Result<T, VantageError>;

impl VantageError {
    /// Creates a new blob decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Creates a new storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new invalid query error
    pub fn invalid_query<S: Into<String>>(msg: S) -> Self {
        Self::InvalidQuery(msg.into())
    }

    /// Creates a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this error indicates corrupt persisted data
    pub fn is_data_corruption(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Returns the error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::InvalidQuery(_) => "validation",
            Self::Internal(_) => "internal",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}
