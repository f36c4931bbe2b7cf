//! Shared test helpers: a scripted in-memory [`AssetSource`] and config builders.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::Config;
use crate::downloader::CatalogDownloader;
use crate::error::{Error, Result};
use crate::source::{AssetSource, FetchedBody};
use crate::types::{AssetKind, ItemId};

/// What the scripted source answers for one request
#[derive(Clone, Debug)]
pub(crate) enum Reply {
    /// An HTTP response
    Respond(FetchedBody),
    /// A transport failure (timeout)
    TransportError,
    /// Panic inside the fetch task
    Panic,
}

impl Reply {
    pub(crate) fn ok(body: &str) -> Self {
        Reply::Respond(FetchedBody::new(200, body.as_bytes().to_vec()))
    }

    pub(crate) fn empty() -> Self {
        Reply::Respond(FetchedBody::new(200, Vec::new()))
    }

    pub(crate) fn status(status: u16) -> Self {
        Reply::Respond(FetchedBody::new(status, b"error".to_vec()))
    }
}

type Script = dyn Fn(AssetKind, ItemId, u32) -> Reply + Send + Sync;

/// In-memory [`AssetSource`] whose answers are decided by a closure.
///
/// The closure receives the asset kind, item id and the zero-based number of
/// earlier requests for that same (kind, id) pair. By default every asset
/// answers 200 with body `"<kind>-<id>"`.
pub(crate) struct ScriptedSource {
    catalog: Reply,
    script: Box<Script>,
    delay: Duration,
    calls: Mutex<HashMap<(AssetKind, ItemId), u32>>,
    catalog_calls: AtomicU32,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedSource {
    pub(crate) fn new(catalog: Reply) -> Self {
        Self {
            catalog,
            script: Box::new(|kind, id, _| Reply::ok(&format!("{kind}-{id}"))),
            delay: Duration::ZERO,
            calls: Mutex::new(HashMap::new()),
            catalog_calls: AtomicU32::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Source whose catalog lists the given `(id, title)` pairs
    pub(crate) fn with_items(items: &[(i64, &str)]) -> Self {
        Self::new(Reply::Respond(FetchedBody::new(200, catalog_json(items))))
    }

    pub(crate) fn script(
        mut self,
        script: impl Fn(AssetKind, ItemId, u32) -> Reply + Send + Sync + 'static,
    ) -> Self {
        self.script = Box::new(script);
        self
    }

    pub(crate) fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of requests made for one asset of one item
    pub(crate) fn calls(&self, kind: AssetKind, id: i64) -> u32 {
        self.calls
            .lock()
            .unwrap()
            .get(&(kind, ItemId(id)))
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn total_asset_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }

    pub(crate) fn catalog_calls(&self) -> u32 {
        self.catalog_calls.load(Ordering::SeqCst)
    }

    /// Highest number of asset requests that were in progress at the same time
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn resolve(reply: Reply) -> Result<FetchedBody> {
        match reply {
            Reply::Respond(body) => Ok(body),
            Reply::TransportError => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "simulated timeout",
            ))),
            Reply::Panic => panic!("scripted panic"),
        }
    }
}

#[async_trait::async_trait]
impl AssetSource for ScriptedSource {
    async fn fetch_catalog(&self) -> Result<FetchedBody> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        Self::resolve(self.catalog.clone())
    }

    async fn fetch_asset(&self, kind: AssetKind, id: ItemId) -> Result<FetchedBody> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let entry = calls.entry((kind, id)).or_insert(0);
            let call = *entry;
            *entry += 1;
            call
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Self::resolve((self.script)(kind, id, call))
    }
}

/// JSON catalog body for `(id, title)` pairs
pub(crate) fn catalog_json(items: &[(i64, &str)]) -> Vec<u8> {
    let records: Vec<serde_json::Value> = items
        .iter()
        .map(|(id, title)| serde_json::json!({ "Id": id, "Title": title, "Artist": "test" }))
        .collect();
    serde_json::to_vec(&records).unwrap()
}

/// Default config with retry delays disabled
pub(crate) fn test_config() -> Config {
    let mut config = Config::default();
    config.retry.initial_delay = Duration::ZERO;
    config.retry.jitter = false;
    config
}

/// Downloader over a scripted source; also returns the source for inspection.
pub(crate) fn create_test_downloader(
    source: ScriptedSource,
) -> (CatalogDownloader, Arc<ScriptedSource>) {
    let source = Arc::new(source);
    let downloader = CatalogDownloader::with_source(test_config(), source.clone());
    (downloader, source)
}
