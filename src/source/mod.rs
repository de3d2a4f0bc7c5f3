pub mod decode;
pub mod fixture;

pub use decode::{decode_table, parse_csv};
pub use fixture::sample_table;

use anyhow::{bail, Context, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::scoring::RawTable;

/// Source used when neither the CLI nor the config names one
pub const DEFAULT_SOURCE: &str = "gs://lindyscore/Files.zip";
pub const DEFAULT_GCS_ENDPOINT: &str = "https://storage.googleapis.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024; // 10 MB

/// Where the graft table comes from.
///
/// Parsed from a source string:
/// - `fixture` - built-in sample table
/// - `gs://bucket/object` - public object on Cloud Storage
/// - `http://...` / `https://...` - public URL
/// - anything else - local file path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Fixture,
    Gcs { bucket: String, object: String },
    Url(String),
    File(PathBuf),
}

impl FromStr for Source {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            bail!("Source must not be empty");
        }

        if s == "fixture" {
            Ok(Source::Fixture)
        } else if let Some(rest) = s.strip_prefix("gs://") {
            match rest.split_once('/') {
                Some((bucket, object)) if !bucket.is_empty() && !object.is_empty() => {
                    Ok(Source::Gcs {
                        bucket: bucket.to_string(),
                        object: object.to_string(),
                    })
                }
                _ => bail!("Invalid Cloud Storage source '{}': expected gs://bucket/object", s),
            }
        } else if s.starts_with("http://") || s.starts_with("https://") {
            Ok(Source::Url(s.to_string()))
        } else {
            Ok(Source::File(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Fixture => write!(f, "fixture"),
            Source::Gcs { bucket, object } => write!(f, "gs://{}/{}", bucket, object),
            Source::Url(url) => write!(f, "{}", url),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Source {
    /// HTTP location to download from, for remote sources
    pub fn download_url(&self, gcs_endpoint: &str) -> Option<String> {
        match self {
            Source::Gcs { bucket, object } => Some(format!(
                "{}/{}/{}",
                gcs_endpoint.trim_end_matches('/'),
                bucket,
                object
            )),
            Source::Url(url) => Some(url.clone()),
            Source::Fixture | Source::File(_) => None,
        }
    }
}

/// Resolved fetch settings.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Glob selecting the CSV member inside zip archives
    pub entry: Option<glob::Pattern>,
    pub timeout: Duration,
    pub max_bytes: usize,
    pub gcs_endpoint: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            entry: None,
            timeout: DEFAULT_TIMEOUT,
            max_bytes: DEFAULT_MAX_BYTES,
            gcs_endpoint: DEFAULT_GCS_ENDPOINT.to_string(),
        }
    }
}

impl FetchOptions {
    pub fn from_config(config: Option<&FetchConfig>) -> Result<Self> {
        let mut options = Self::default();
        let Some(config) = config else {
            return Ok(options);
        };

        if let Some(ref entry) = config.entry {
            options.entry = Some(
                glob::Pattern::new(entry)
                    .with_context(|| format!("Invalid fetch.entry pattern '{}'", entry))?,
            );
        }
        if let Some(ref timeout) = config.timeout {
            options.timeout = humantime::parse_duration(timeout)
                .with_context(|| format!("Invalid fetch.timeout '{}'", timeout))?;
        }
        if let Some(max_bytes) = config.max_bytes {
            options.max_bytes = max_bytes;
        }
        if let Some(ref endpoint) = config.gcs_endpoint {
            options.gcs_endpoint = endpoint.clone();
        }
        Ok(options)
    }
}

/// Load the raw graft table from a source.
pub async fn load_table(source: &Source, options: &FetchOptions) -> Result<RawTable> {
    let bytes = match source {
        Source::Fixture => {
            tracing::debug!("Using built-in fixture table");
            return Ok(sample_table());
        }
        Source::File(path) => {
            tracing::debug!(path = %path.display(), "Reading graft table from file");
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            if bytes.len() > options.max_bytes {
                bail!(
                    "{} is {} bytes, over the {} byte limit",
                    path.display(),
                    bytes.len(),
                    options.max_bytes
                );
            }
            bytes
        }
        Source::Gcs { .. } | Source::Url(_) => {
            let url = source
                .download_url(&options.gcs_endpoint)
                .context("Remote source has no download URL")?;
            download(&url, options).await?
        }
    };

    let table = decode_table(&bytes, options.entry.as_ref(), options.max_bytes)
        .with_context(|| format!("Failed to decode graft table from {}", source))?;
    tracing::info!(source = %source, rows = table.len(), "Loaded graft table");
    Ok(table)
}

async fn download(url: &str, options: &FetchOptions) -> Result<Vec<u8>> {
    tracing::debug!(url, timeout = ?options.timeout, "Downloading graft table");

    let client = reqwest::Client::builder()
        .timeout(options.timeout)
        .user_agent(concat!("lindy-score/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")?;

    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", url))?
        .error_for_status()
        .with_context(|| format!("Download of {} was rejected", url))?;

    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .with_context(|| format!("Failed to read response body from {}", url))?
    {
        if bytes.len() + chunk.len() > options.max_bytes {
            bail!("Response from {} exceeds {} bytes", url, options.max_bytes);
        }
        bytes.extend_from_slice(&chunk);
    }

    tracing::debug!(url, bytes = bytes.len(), "Download complete");
    Ok(bytes)
}
