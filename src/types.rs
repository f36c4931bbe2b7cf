//! Core types for majdata-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::sanitize_title;

/// Unique identifier of a catalog item
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl ItemId {
    /// Create a new ItemId from an i64
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ItemId> for i64 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(Self)
    }
}

/// One entry of the remote catalog
///
/// Only `Id` and `Title` are interpreted. Every other field the catalog
/// carries (artist, designer, levels, ...) is kept verbatim in `extra`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Numeric identifier used to build asset URLs
    #[serde(rename = "Id")]
    pub id: ItemId,

    /// Display title, used (sanitized) as the directory name
    #[serde(rename = "Title")]
    pub title: String,

    /// Catalog fields this crate does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ItemRecord {
    /// Create a record with no extra catalog fields
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id: ItemId(id),
            title: title.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// The three assets downloaded for every item, in fetch order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Chart text (`maidata.txt`)
    Metadata,
    /// Background image (`bg.jpg`)
    Image,
    /// Audio track (`track.mp3`)
    Track,
}

impl AssetKind {
    /// All asset kinds in the order an attempt fetches them
    pub const ALL: [AssetKind; 3] = [AssetKind::Metadata, AssetKind::Image, AssetKind::Track];

    /// File name the asset is written to inside the item directory
    pub fn file_name(&self) -> &'static str {
        match self {
            AssetKind::Metadata => "maidata.txt",
            AssetKind::Image => "bg.jpg",
            AssetKind::Track => "track.mp3",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AssetKind::Metadata => "metadata",
            AssetKind::Image => "image",
            AssetKind::Track => "track",
        };
        f.write_str(name)
    }
}

/// Where one item's assets are written
///
/// Normally `<output root>/<sanitized title>`. During a run, items whose
/// titles sanitize to a name already taken (compared case-insensitively) get
/// `_<id>` appended instead, so no two items share a directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadTarget {
    /// Sanitized directory name
    pub directory_name: String,
    /// `<output root>/<directory_name>`
    pub destination: PathBuf,
}

impl DownloadTarget {
    /// Derive the target directory for an item under `output_root`
    ///
    /// Titles that sanitize to nothing (blank or whitespace-only) fall back to
    /// the item id so the assets never land directly in the output root.
    pub fn for_item(item: &ItemRecord, output_root: &Path) -> Self {
        let mut directory_name = sanitize_title(&item.title);
        if directory_name.is_empty() {
            directory_name = item.id.to_string();
        }
        let destination = output_root.join(&directory_name);
        Self {
            directory_name,
            destination,
        }
    }

    /// Full path of the file an asset is written to
    pub fn asset_path(&self, kind: AssetKind) -> PathBuf {
        self.destination.join(kind.file_name())
    }
}

/// Terminal result of one item's fetch sequence, emitted exactly once per item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOutcome {
    /// Item identifier
    pub item_id: ItemId,
    /// Item title as listed in the catalog
    pub title: String,
    /// Whether all three assets were written in a single attempt
    pub succeeded: bool,
    /// Stage that failed on the final attempt (None on success, or when the
    /// task died before reporting a stage)
    pub failed_stage: Option<AssetKind>,
    /// Number of attempts made
    pub attempts: u32,
}

impl FetchOutcome {
    /// Outcome for an item whose assets were all written
    pub fn success(item: &ItemRecord, attempts: u32) -> Self {
        Self {
            item_id: item.id,
            title: item.title.clone(),
            succeeded: true,
            failed_stage: None,
            attempts,
        }
    }

    /// Outcome for an item that exhausted its attempts
    pub fn exhausted(item: &ItemRecord, stage: AssetKind, attempts: u32) -> Self {
        Self {
            item_id: item.id,
            title: item.title.clone(),
            succeeded: false,
            failed_stage: Some(stage),
            attempts,
        }
    }

    /// Outcome for an item whose task ended without reporting
    pub(crate) fn aborted(item: &ItemRecord) -> Self {
        Self {
            item_id: item.id,
            title: item.title.clone(),
            succeeded: false,
            failed_stage: None,
            attempts: 0,
        }
    }
}

/// Event emitted during a download run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Catalog fetched, item tasks are being scheduled
    Started {
        /// Number of items in the catalog
        total: usize,
    },

    /// All assets of an item were written
    ItemCompleted {
        /// Item identifier
        id: ItemId,
        /// Item title
        title: String,
        /// Items finished so far (success or failure)
        completed: usize,
        /// Catalog size
        total: usize,
    },

    /// An item exhausted its attempts
    ItemFailed {
        /// Item identifier
        id: ItemId,
        /// Item title
        title: String,
        /// Stage that failed on the last attempt (None if the task died)
        stage: Option<AssetKind>,
        /// Attempts made
        attempts: u32,
        /// Items finished so far (success or failure)
        completed: usize,
        /// Catalog size
        total: usize,
    },

    /// The catalog could not be fetched; nothing was downloaded
    CatalogUnavailable {
        /// HTTP status, if a response was received
        status: Option<u16>,
        /// Error message
        error: String,
    },

    /// Every item reached a terminal outcome
    Finished {
        /// Items downloaded successfully
        succeeded: usize,
        /// Items that exhausted their attempts
        failed: usize,
    },
}

/// Summary returned by a completed run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    /// Catalog size
    pub total: usize,
    /// Items downloaded successfully
    pub succeeded: usize,
    /// Outcomes of items that exhausted their attempts
    pub failed: Vec<FetchOutcome>,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the last item finished
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// Whether every item was downloaded
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.succeeded == self.total
    }
}
