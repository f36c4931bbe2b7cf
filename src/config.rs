//! Configuration types for majdata-dl

use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

use crate::error::{Error, Result};

/// Remote endpoints the downloader talks to
///
/// Asset URLs are formed by appending the item id to the base URL, so
/// `maidata_url = "https://host/api/Maidata/"` and id `12` yield
/// `https://host/api/Maidata/12`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Catalog listing endpoint (JSON array of items)
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,

    /// Base URL for chart text (`maidata.txt`)
    #[serde(default = "default_maidata_url")]
    pub maidata_url: String,

    /// Base URL for background images (`bg.jpg`)
    #[serde(default = "default_image_url")]
    pub image_url: String,

    /// Base URL for audio tracks (`track.mp3`)
    #[serde(default = "default_track_url")]
    pub track_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            catalog_url: default_catalog_url(),
            maidata_url: default_maidata_url(),
            image_url: default_image_url(),
            track_url: default_track_url(),
        }
    }
}

/// HTTP transport settings shared by every request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Optional proxy URL (http://, https:// or socks5://) applied to all requests
    #[serde(default)]
    pub proxy: Option<String>,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            proxy: None,
            request_timeout: default_request_timeout(),
        }
    }
}

/// Download behavior configuration (output directory, concurrency)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Output root; each item gets its own subdirectory (default: "./downloads")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Maximum items fetched concurrently (default: 3)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_concurrent_downloads: default_max_concurrent(),
        }
    }
}

/// Per-item retry policy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per item, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt (default: 500 milliseconds)
    #[serde(default = "default_initial_delay", with = "millis_serde")]
    pub initial_delay: Duration,

    /// Upper bound for the delay between attempts (default: 10 seconds)
    #[serde(default = "default_max_delay", with = "millis_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Main configuration for [`CatalogDownloader`](crate::CatalogDownloader)
///
/// Every section has sensible defaults pointing at the public majdata.net API,
/// so `Config::default()` works out of the box.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote endpoints
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Output directory and concurrency
    #[serde(default)]
    pub download: DownloadConfig,

    /// Per-item retry policy
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Output root directory
    pub fn output_dir(&self) -> &PathBuf {
        &self.download.output_dir
    }

    /// Parse a configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        Self::from_json_str(&content)
    }

    /// Check that the configuration can drive a run
    ///
    /// Rejects zero concurrency, zero attempts, unparseable endpoint URLs and
    /// unparseable proxy URLs.
    pub fn validate(&self) -> Result<()> {
        if self.download.max_concurrent_downloads == 0 {
            return Err(Error::config(
                "must be at least 1",
                "max_concurrent_downloads",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config("must be at least 1", "max_attempts"));
        }
        if !(self.retry.backoff_multiplier >= 1.0) {
            return Err(Error::config(
                format!(
                    "must be at least 1.0, got {}",
                    self.retry.backoff_multiplier
                ),
                "backoff_multiplier",
            ));
        }

        let urls = [
            ("catalog_url", &self.endpoints.catalog_url),
            ("maidata_url", &self.endpoints.maidata_url),
            ("image_url", &self.endpoints.image_url),
            ("track_url", &self.endpoints.track_url),
        ];
        for (key, value) in urls {
            url::Url::parse(value)
                .map_err(|e| Error::config(format!("invalid URL '{}': {}", value, e), key))?;
        }

        if let Some(proxy) = self.http.proxy.as_deref()
            && !proxy.trim().is_empty()
        {
            reqwest::Proxy::all(proxy.trim())
                .map_err(|e| Error::config(format!("invalid proxy '{}': {}", proxy, e), "proxy"))?;
        }

        Ok(())
    }
}

fn default_catalog_url() -> String {
    "https://majdata.net/api3/api/SongList".to_string()
}

fn default_maidata_url() -> String {
    "https://majdata.net/api3/api/Maidata/".to_string()
}

fn default_image_url() -> String {
    "https://majdata.net/api3/api/ImageFull/".to_string()
}

fn default_track_url() -> String {
    "https://majdata.net/api3/api/Track/".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/80.0.3987.149 Safari/537.36"
        .to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_max_concurrent() -> usize {
    3
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
