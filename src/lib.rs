//! # majdata-dl
//!
//! Bulk downloader for majdata chart catalogs.
//!
//! For every item in the remote catalog the downloader fetches the chart text,
//! the background image and the audio track, and writes them to
//! `<output>/<sanitized title>/{maidata.txt, bg.jpg, track.mp3}`.
//!
//! ## Design
//!
//! - **Bounded concurrency** - at most `concurrency_limit` items are fetched at
//!   once, all sharing one HTTP connection pool
//! - **Isolated failures** - every item is retried on its own; only a missing
//!   catalog aborts a run
//! - **Library-first** - no UI, purely a Rust crate for embedding
//! - **Event-driven** - consumers subscribe to events or poll a progress handle
//!
//! ## Quick Start
//!
//! ```no_run
//! use majdata_dl::{CatalogDownloader, Config, Event};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.http.proxy = Some("http://127.0.0.1:7890".to_string());
//!
//!     let downloader = CatalogDownloader::new(config)?;
//!
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let summary = downloader.run("charts", 3).await?;
//!     println!("{} of {} items downloaded", summary.succeeded, summary.total);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Catalog download orchestration (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Progress aggregation
pub mod progress;
/// Per-item retry state machine and backoff
pub mod retry;
/// HTTP transport
pub mod source;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Config, DownloadConfig, EndpointConfig, HttpConfig, RetryConfig};
pub use downloader::CatalogDownloader;
pub use error::{AssetFetchError, AssetFetchErrorKind, Error, Result};
pub use progress::ProgressHandle;
pub use source::{AssetSource, FetchedBody, HttpAssetSource};
pub use types::{
    AssetKind, DownloadTarget, Event, FetchOutcome, ItemId, ItemRecord, RunSummary,
};
