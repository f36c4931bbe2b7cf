//! Core downloader implementation split into focused submodules.
//!
//! - [`catalog`] - Catalog listing
//! - [`fetch_task`] - Per-item asset fetching with retry
//! - [`orchestrator`] - Bounded fan-out over the whole catalog

mod catalog;
mod fetch_task;
mod orchestrator;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::config::Config;
use crate::error::Result;
use crate::progress::ProgressHandle;
use crate::source::{AssetSource, HttpAssetSource};
use crate::types::Event;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct CatalogDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Transport shared by every fetch task
    pub(crate) source: Arc<dyn AssetSource>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Progress counters of the current (or last) run
    pub(crate) progress: ProgressHandle,
    /// Set while a run is in progress
    pub(crate) running: Arc<AtomicBool>,
}

impl CatalogDownloader {
    /// Create a downloader that talks HTTP to the configured endpoints
    ///
    /// Validates the configuration and builds the shared HTTP client
    /// (User-Agent, timeout, optional proxy).
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let source = HttpAssetSource::new(&config)?;

        tracing::debug!(
            catalog_url = %config.endpoints.catalog_url,
            max_concurrent = config.download.max_concurrent_downloads,
            proxy = config.http.proxy.is_some(),
            "Downloader initialized"
        );

        Ok(Self::with_source(config, Arc::new(source)))
    }

    /// Create a downloader on top of a custom [`AssetSource`]
    ///
    /// Used by tests and by embedders that need a different transport.
    pub fn with_source(config: Config, source: Arc<dyn AssetSource>) -> Self {
        let (event_tx, _rx) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            config: Arc::new(config),
            source,
            event_tx,
            progress: ProgressHandle::default(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to download events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events
    /// independently. A subscriber that falls more than 1000 events behind
    /// receives `RecvError::Lagged`; [`progress`](Self::progress) stays exact
    /// regardless.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use majdata_dl::{CatalogDownloader, Config, Event};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let downloader = CatalogDownloader::new(Config::default())?;
    ///
    ///     let mut events = downloader.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             if let Event::ItemFailed { title, .. } = event {
    ///                 eprintln!("Could not download {title}");
    ///             }
    ///         }
    ///     });
    ///
    ///     downloader.run_configured().await?;
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Handle for polling progress of the current run
    pub fn progress(&self) -> ProgressHandle {
        self.progress.clone()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}
