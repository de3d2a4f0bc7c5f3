mod schema;

pub use schema::{Config, FetchConfig, ServerConfig};

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::source::Source;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Get the config directory path (~/.config/lindy-score/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("lindy-score"))
}

/// Get the default config file path (~/.config/lindy-score/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Load configuration from a YAML file
///
/// With an explicit `path` the file must exist. Without one, the default
/// path is used and a missing file yields the built-in defaults.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let (config_path, explicit) = match path {
        Some(p) => (p, true),
        None => (get_config_path()?, false),
    };

    if !config_path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", config_path.display());
        }
        tracing::debug!(path = %config_path.display(), "No config file, using defaults");
        return Ok(Config::default());
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    tracing::debug!(path = %config_path.display(), "Loaded config");
    Ok(config)
}

/// Validate configuration values at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(ref source) = config.source {
        if let Err(e) = source.parse::<Source>() {
            errors.push(format!("source: {}", e));
        }
    }

    if let Some(ref fetch) = config.fetch {
        if let Some(ref entry) = fetch.entry {
            if let Err(e) = glob::Pattern::new(entry) {
                errors.push(format!("fetch.entry: invalid pattern '{}' - {}", entry, e));
            }
        }
        if let Some(ref timeout) = fetch.timeout {
            if let Err(e) = humantime::parse_duration(timeout) {
                errors.push(format!("fetch.timeout: invalid duration '{}' - {}", timeout, e));
            }
        }
        if fetch.max_bytes == Some(0) {
            errors.push("fetch.max_bytes: must be positive".to_string());
        }
        if let Some(ref endpoint) = fetch.gcs_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                errors.push(format!("fetch.gcs_endpoint: '{}' is not an http(s) URL", endpoint));
            }
        }
    }

    if let Some(ref server) = config.server {
        if let Some(ref bind) = server.bind {
            if let Err(e) = bind.parse::<SocketAddr>() {
                errors.push(format!("server.bind: invalid address '{}' - {}", bind, e));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Starter config written by `lindy-score init`
pub fn default_config() -> Config {
    Config {
        source: Some(crate::source::DEFAULT_SOURCE.to_string()),
        fetch: Some(FetchConfig {
            entry: Some("*.csv".to_string()),
            timeout: Some("30s".to_string()),
            max_bytes: None,
            gcs_endpoint: None,
        }),
        scoring: Some(crate::scoring::ScoringConfig {
            as_of_year: None,
            invalid_records: Some(crate::scoring::InvalidRecordPolicy::Fail),
        }),
        server: Some(ServerConfig {
            bind: Some(DEFAULT_BIND.to_string()),
        }),
    }
}

/// Write a config file atomically, creating parent directories.
///
/// Refuses to replace an existing file unless `force` is set.
pub fn write_config(path: &Path, config: &Config, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory at {}", parent.display()))?;
        }
    }

    let yaml = serde_saphyr::to_string(config).context("Failed to serialize config")?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(yaml.as_bytes())
        .context("Failed to write config")?;
    file.commit().context("Failed to save config")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::InvalidRecordPolicy;

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
source: "gs://lindyscore/Files.zip"
fetch:
  entry: "*.csv"
  timeout: "10s"
  max_bytes: 2048
scoring:
  as_of_year: 2024
  invalid_records: skip
server:
  bind: "0.0.0.0:9000"
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.source.as_deref(), Some("gs://lindyscore/Files.zip"));
        let fetch = config.fetch.as_ref().unwrap();
        assert_eq!(fetch.entry.as_deref(), Some("*.csv"));
        assert_eq!(fetch.max_bytes, Some(2048));
        let scoring = config.scoring.as_ref().unwrap();
        assert_eq!(scoring.invalid_records, Some(InvalidRecordPolicy::Skip));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_config_parse() {
        let config: Config = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let yaml = "sources: fixture";
        assert!(serde_saphyr::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = Config {
            source: Some("gs://bucket-only".to_string()),
            fetch: Some(FetchConfig {
                entry: Some("[".to_string()),
                timeout: Some("eventually".to_string()),
                max_bytes: Some(0),
                gcs_endpoint: Some("storage.local".to_string()),
            }),
            scoring: None,
            server: Some(ServerConfig {
                bind: Some("localhost".to_string()),
            }),
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert!(errors[0].starts_with("source:"));
        assert!(errors.iter().any(|e| e.starts_with("server.bind")));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&default_config()).is_ok());
    }

    #[test]
    fn test_write_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        write_config(&path, &default_config(), false).unwrap();
        let loaded = load_config(Some(path.clone())).unwrap();
        assert_eq!(loaded, default_config());

        assert!(write_config(&path, &default_config(), false).is_err());
        assert!(write_config(&path, &Config::default(), true).is_ok());
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(dir.path().join("missing.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
