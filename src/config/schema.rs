use serde::{Deserialize, Serialize};

use crate::scoring::ScoringConfig;

/// Top-level configuration file (~/.config/lindy-score/config.yaml).
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Source string: `fixture`, `gs://bucket/object`, a URL, or a path
    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub fetch: Option<FetchConfig>,

    #[serde(default)]
    pub scoring: Option<ScoringConfig>,

    #[serde(default)]
    pub server: Option<ServerConfig>,
}

/// How the graft table is downloaded and unpacked.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    /// Glob selecting the CSV member of a zip archive (e.g. "*.csv")
    #[serde(default)]
    pub entry: Option<String>,

    /// Request timeout, humantime format (e.g. "30s")
    #[serde(default)]
    pub timeout: Option<String>,

    /// Maximum download size in bytes
    #[serde(default)]
    pub max_bytes: Option<usize>,

    /// Base URL for `gs://` sources
    #[serde(default)]
    pub gcs_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to listen on (e.g. "127.0.0.1:8080")
    #[serde(default)]
    pub bind: Option<String>,
}
