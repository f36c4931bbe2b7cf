//! Catalog listing.

use crate::error::{Error, Result};
use crate::source::AssetSource;
use crate::types::ItemRecord;

use super::CatalogDownloader;

/// Fetch and parse the catalog.
///
/// Only a 200 response whose body is a JSON array of item records succeeds;
/// everything else is [`Error::CatalogUnavailable`].
pub(crate) async fn fetch_catalog(source: &dyn AssetSource) -> Result<Vec<ItemRecord>> {
    let fetched = source
        .fetch_catalog()
        .await
        .map_err(|e| Error::CatalogUnavailable {
            status: None,
            reason: format!("request failed: {}", e),
        })?;

    if fetched.status != 200 {
        return Err(Error::CatalogUnavailable {
            status: Some(fetched.status),
            reason: format!("unexpected HTTP status {}", fetched.status),
        });
    }

    serde_json::from_slice::<Vec<ItemRecord>>(&fetched.body).map_err(|e| {
        Error::CatalogUnavailable {
            status: Some(fetched.status),
            reason: format!("unparseable catalog body: {}", e),
        }
    })
}

impl CatalogDownloader {
    /// Fetch the item catalog without downloading anything
    pub async fn list_catalog(&self) -> Result<Vec<ItemRecord>> {
        let items = fetch_catalog(self.source.as_ref()).await?;
        tracing::debug!(items = items.len(), "Catalog fetched");
        Ok(items)
    }
}
