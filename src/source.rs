//! HTTP transport for the catalog and item assets.
//!
//! [`AssetSource`] is the seam between the download pipeline and the network.
//! The production implementation, [`HttpAssetSource`], owns a single
//! connection-pooling `reqwest::Client` that every fetch task shares.

use std::time::Duration;

use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{AssetKind, ItemId};

/// Raw HTTP answer: status code and full body
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedBody {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Vec<u8>,
}

impl FetchedBody {
    /// Build a response
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 200 with a non-empty body
    pub fn is_usable(&self) -> bool {
        self.status == 200 && !self.body.is_empty()
    }
}

/// Abstraction over catalog and asset fetching, enabling testability.
///
/// Implementations return `Err` only for transport failures (timeouts,
/// refused or reset connections). Any HTTP response, including error
/// statuses, comes back as `Ok(FetchedBody)` so callers can decide.
#[async_trait::async_trait]
pub trait AssetSource: Send + Sync {
    /// GET the catalog endpoint
    async fn fetch_catalog(&self) -> Result<FetchedBody>;

    /// GET one asset of one item
    async fn fetch_asset(&self, kind: AssetKind, id: ItemId) -> Result<FetchedBody>;
}

/// Production [`AssetSource`] backed by a shared `reqwest::Client`.
#[derive(Clone, Debug)]
pub struct HttpAssetSource {
    client: reqwest::Client,
    catalog_url: Url,
    maidata_base: Url,
    image_base: Url,
    track_base: Url,
}

impl HttpAssetSource {
    /// Build the client from configuration
    ///
    /// Applies the User-Agent, per-request timeout and optional proxy, and
    /// sizes the idle connection pool to the concurrency limit.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.http.user_agent.clone())
            .timeout(config.http.request_timeout)
            .pool_max_idle_per_host(config.download.max_concurrent_downloads)
            .pool_idle_timeout(Duration::from_secs(90));

        if let Some(proxy) = config.http.proxy.as_deref().map(str::trim)
            && !proxy.is_empty()
        {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| {
                Error::config(format!("invalid proxy '{}': {}", proxy, e), "proxy")
            })?;
            builder = builder.proxy(proxy);
            tracing::debug!("Routing all requests through configured proxy");
        }

        let client = builder.build().map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "Failed to create HTTP client: {}",
                e
            )))
        })?;

        Ok(Self {
            client,
            catalog_url: parse_url(&config.endpoints.catalog_url, "catalog_url")?,
            maidata_base: parse_base_url(&config.endpoints.maidata_url, "maidata_url")?,
            image_base: parse_base_url(&config.endpoints.image_url, "image_url")?,
            track_base: parse_base_url(&config.endpoints.track_url, "track_url")?,
        })
    }

    /// URL an asset of an item is fetched from
    pub fn asset_url(&self, kind: AssetKind, id: ItemId) -> Result<Url> {
        let base = match kind {
            AssetKind::Metadata => &self.maidata_base,
            AssetKind::Image => &self.image_base,
            AssetKind::Track => &self.track_base,
        };
        base.join(&id.to_string()).map_err(|e| {
            Error::config(
                format!("cannot append id {} to '{}': {}", id, base, e),
                "endpoints",
            )
        })
    }

    async fn get(&self, url: Url) -> Result<FetchedBody> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(FetchedBody::new(status, body.to_vec()))
    }
}

#[async_trait::async_trait]
impl AssetSource for HttpAssetSource {
    async fn fetch_catalog(&self) -> Result<FetchedBody> {
        self.get(self.catalog_url.clone()).await
    }

    async fn fetch_asset(&self, kind: AssetKind, id: ItemId) -> Result<FetchedBody> {
        let url = self.asset_url(kind, id)?;
        self.get(url).await
    }
}

fn parse_url(value: &str, key: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| Error::config(format!("invalid URL '{}': {}", value, e), key))
}

/// Parse a base URL, making sure the last path segment is kept on `join`.
fn parse_base_url(value: &str, key: &str) -> Result<Url> {
    if value.ends_with('/') {
        parse_url(value, key)
    } else {
        parse_url(&format!("{}/", value), key)
    }
}
