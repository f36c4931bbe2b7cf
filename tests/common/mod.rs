//! Common test utilities for majdata-dl integration tests
//!
//! Spins up a wiremock server that imitates the catalog API and builds a
//! [`Config`] pointing every endpoint at it.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use majdata_dl::{Config, Event};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock catalog API server
pub struct MockCatalog {
    pub server: MockServer,
}

impl MockCatalog {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Serve the catalog listing `(id, title)` pairs
    pub async fn with_items(self, items: &[(i64, &str)]) -> Self {
        let records: Vec<serde_json::Value> = items
            .iter()
            .map(|(id, title)| serde_json::json!({ "Id": id, "Title": title, "Uploader": "tester" }))
            .collect();
        Mock::given(method("GET"))
            .and(path("/api/SongList"))
            .respond_with(ResponseTemplate::new(200).set_body_json(records))
            .mount(&self.server)
            .await;
        self
    }

    /// Serve all three assets of an item with recognizable bodies
    pub async fn with_assets(self, id: i64) -> Self {
        for (segment, body) in asset_bodies(id) {
            self.respond(segment, id, ResponseTemplate::new(200).set_body_bytes(body))
                .await;
        }
        self
    }

    /// Mount a custom response for one asset of one item
    pub async fn respond(&self, segment: &str, id: i64, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(format!("/api/{segment}/{id}")))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Config with every endpoint on this server and retry delays disabled
    pub fn config(&self, output_dir: &Path) -> Config {
        let base = format!("{}/api", self.server.uri());
        let mut config = Config::default();
        config.endpoints.catalog_url = format!("{base}/SongList");
        config.endpoints.maidata_url = format!("{base}/Maidata/");
        config.endpoints.image_url = format!("{base}/ImageFull/");
        config.endpoints.track_url = format!("{base}/Track");
        config.http.request_timeout = Duration::from_secs(5);
        config.download.output_dir = output_dir.to_path_buf();
        config.retry.initial_delay = Duration::ZERO;
        config.retry.jitter = false;
        config
    }

    /// Number of requests the server saw for a path
    pub async fn hits(&self, request_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == request_path)
            .count()
    }
}

/// `(endpoint segment, body)` for each asset of an item
pub fn asset_bodies(id: i64) -> [(&'static str, Vec<u8>); 3] {
    [
        ("Maidata", format!("&title=Song {id}\n&wholebpm=150\n").into_bytes()),
        ("ImageFull", vec![0xFF, 0xD8, 0xFF, id as u8]),
        ("Track", vec![0x49, 0x44, 0x33, id as u8]),
    ]
}

/// Every regular file under `root`, relative to it, sorted
pub fn files_under(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect();
    files.sort();
    files
}

/// Drain every event currently buffered on a receiver
pub fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
