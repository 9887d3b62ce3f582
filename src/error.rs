//! Error types for thread-harvest
//!
//! Two layers of errors exist:
//! - [`Error`] is returned from public operations. Configuration and session
//!   failures are fatal and abort a whole harvest.
//! - [`FetchError`] describes why a single post could not be loaded. It never
//!   escapes a batch worker; the worker logs it and records the post as absent.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for thread-harvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for thread-harvest
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "search.query")
        key: Option<String>,
    },

    /// A session to the content API could not be established
    #[error("session creation failed: {0}")]
    Session(String),

    /// Network error outside of per-post fetching (search, token exchange)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The content API answered with a non-success status
    #[error("API returned HTTP {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Request context
        message: String,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A worker task panicked or was cancelled before returning its results
    #[error("worker failed: {0}")]
    Worker(String),

    /// The dispatch is shutting down after another worker failed fatally
    #[error("harvest cancelled")]
    Cancelled,

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a [`Error::Config`] naming the offending key.
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Whether this error belongs to a class that aborts a whole dispatch.
    ///
    /// Configuration, session and worker failures leave a shard with nothing
    /// it can fetch, so they are never reduced to a missing record.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Config { .. } | Error::Session(_) | Error::Worker(_)
        )
    }
}

/// Why a single post could not be fetched or decoded
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("HTTP {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// The post does not exist (deleted, removed, or a bad identifier)
    #[error("post {0} not found")]
    NotFound(String),

    /// The response did not have the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The fetch did not finish within the request timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Malformed(e.to_string())
    }
}
