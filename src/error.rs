//! Error types for majdata-dl
//!
//! Only catalog-level failures are fatal to a run. Per-item failures are
//! represented by [`AssetFetchError`] while an item is still being retried and
//! by [`Error::ItemExhausted`] once its attempts are used up; neither ever
//! aborts the other items.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::{AssetKind, ItemId};

/// Result type alias for majdata-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for majdata-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "catalog_url")
        key: Option<String>,
    },

    /// The catalog endpoint returned a non-200 status or an unparseable body
    #[error("catalog unavailable: {reason}")]
    CatalogUnavailable {
        /// HTTP status, if a response was received at all
        status: Option<u16>,
        /// What went wrong
        reason: String,
    },

    /// An item used up all of its attempts
    #[error("item {id} ({title}) failed after {attempts} attempts at the {stage} stage")]
    ItemExhausted {
        /// Item identifier
        id: ItemId,
        /// Item title
        title: String,
        /// Stage that failed on the final attempt
        stage: AssetKind,
        /// Attempts made
        attempts: u32,
    },

    /// A run is already in progress on this downloader
    #[error("a download run is already in progress")]
    AlreadyRunning,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Convenience constructor for configuration errors
    pub(crate) fn config(message: impl Into<String>, key: &str) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Failure of a single asset stage within one attempt
#[derive(Debug, Error)]
#[error("{stage} fetch for item {id} failed: {kind}")]
pub struct AssetFetchError {
    /// Item identifier
    pub id: ItemId,
    /// Stage that failed
    pub stage: AssetKind,
    /// Cause
    pub kind: AssetFetchErrorKind,
}

impl AssetFetchError {
    pub(crate) fn new(id: ItemId, stage: AssetKind, kind: AssetFetchErrorKind) -> Self {
        Self { id, stage, kind }
    }
}

/// Why an asset stage failed
#[derive(Debug, Error)]
pub enum AssetFetchErrorKind {
    /// Server answered with something other than 200
    #[error("unexpected HTTP status {0}")]
    BadStatus(u16),

    /// Server answered 200 with an empty body
    #[error("empty response body")]
    EmptyBody,

    /// Request failed before a response arrived (timeout, connection reset, ...)
    #[error("transport error: {0}")]
    Transport(String),

    /// Writing the asset to disk failed
    #[error("failed to write {path}: {source}")]
    Write {
        /// File or directory being written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}
