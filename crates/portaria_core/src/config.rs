//! Backend configuration.
//!
//! # Responsibility
//! - Describe which persistence backend the core talks to.
//! - Load that choice from `PORTARIA_*` environment variables.
//!
//! # Invariants
//! - A remote backend always carries an absolute `http`/`https` base URL.
//! - Timeouts are at least one second.

use reqwest::Url;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const ENV_BACKEND: &str = "PORTARIA_BACKEND";
pub const ENV_DB_PATH: &str = "PORTARIA_DB_PATH";
pub const ENV_API_URL: &str = "PORTARIA_API_URL";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "PORTARIA_HTTP_TIMEOUT_SECS";

const DEFAULT_DB_FILE_NAME: &str = "portaria.sqlite3";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unsupported backend `{0}`; expected local|remote")]
    UnsupportedBackend(String),
    #[error("`{0}` is required for the remote backend")]
    MissingApiUrl(&'static str),
    #[error("invalid api url `{value}`: {reason}")]
    InvalidApiUrl { value: String, reason: String },
    #[error("invalid http timeout `{0}`; expected a positive number of seconds")]
    InvalidTimeout(String),
    #[error("unreadable config document: {0}")]
    InvalidDocument(String),
}

/// Persistence backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// SQLite-backed key-value store at `db_path`.
    Local { db_path: PathBuf },
    /// REST collaborator at `base_url`.
    Remote {
        base_url: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl BackendConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Local { .. } => "local",
            Self::Remote { .. } => "remote",
        }
    }
}

/// Top-level core configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PortariaConfig {
    pub backend: BackendConfig,
}

impl Default for PortariaConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::Local {
                db_path: default_db_path(),
            },
        }
    }
}

impl PortariaConfig {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let backend = match read(ENV_BACKEND)
            .map(|value| value.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("local") => BackendConfig::Local {
                db_path: read(ENV_DB_PATH)
                    .map(PathBuf::from)
                    .unwrap_or_else(default_db_path),
            },
            Some("remote") => {
                let base_url = read(ENV_API_URL).ok_or(ConfigError::MissingApiUrl(ENV_API_URL))?;
                let timeout_secs = match read(ENV_HTTP_TIMEOUT_SECS) {
                    Some(raw) => parse_timeout(&raw)?,
                    None => DEFAULT_HTTP_TIMEOUT_SECS,
                };
                BackendConfig::Remote {
                    base_url,
                    timeout_secs,
                }
            }
            Some(other) => return Err(ConfigError::UnsupportedBackend(other.to_string())),
        };

        let config = Self { backend };
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON configuration document and validates it.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|err| ConfigError::InvalidDocument(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field rules not expressible in the types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let BackendConfig::Remote {
            base_url,
            timeout_secs,
        } = &self.backend
        {
            parse_api_url(base_url)?;
            if *timeout_secs == 0 {
                return Err(ConfigError::InvalidTimeout(timeout_secs.to_string()));
            }
        }
        Ok(())
    }
}

/// Parses and checks a REST base URL.
pub fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|err| ConfigError::InvalidApiUrl {
        value: raw.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::InvalidApiUrl {
            value: raw.to_string(),
            reason: "expected an absolute http(s) url".to_string(),
        });
    }
    Ok(url)
}

pub fn timeout_from_secs(timeout_secs: u64) -> Duration {
    Duration::from_secs(timeout_secs.max(1))
}

fn parse_timeout(raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_db_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::{BackendConfig, ConfigError, PortariaConfig};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_local_backend() {
        let config = PortariaConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.backend.kind(), "local");

        let config =
            PortariaConfig::from_lookup(lookup(&[("PORTARIA_DB_PATH", "/data/desk.db")])).unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Local {
                db_path: PathBuf::from("/data/desk.db")
            }
        );
    }

    #[test]
    fn remote_requires_valid_url_and_timeout() {
        let missing = PortariaConfig::from_lookup(lookup(&[("PORTARIA_BACKEND", "remote")]));
        assert_eq!(
            missing.unwrap_err(),
            ConfigError::MissingApiUrl("PORTARIA_API_URL")
        );

        let bad_url = PortariaConfig::from_lookup(lookup(&[
            ("PORTARIA_BACKEND", "REMOTE"),
            ("PORTARIA_API_URL", "not a url"),
        ]));
        assert!(matches!(bad_url, Err(ConfigError::InvalidApiUrl { .. })));

        let bad_timeout = PortariaConfig::from_lookup(lookup(&[
            ("PORTARIA_BACKEND", "remote"),
            ("PORTARIA_API_URL", "http://localhost:8080/api"),
            ("PORTARIA_HTTP_TIMEOUT_SECS", "0"),
        ]));
        assert!(matches!(bad_timeout, Err(ConfigError::InvalidTimeout(_))));

        let ok = PortariaConfig::from_lookup(lookup(&[
            ("PORTARIA_BACKEND", "remote"),
            ("PORTARIA_API_URL", "http://localhost:8080/api"),
        ]))
        .unwrap();
        assert_eq!(
            ok.backend,
            BackendConfig::Remote {
                base_url: "http://localhost:8080/api".to_string(),
                timeout_secs: 15
            }
        );
    }

    #[test]
    fn rejects_unknown_backend_and_reads_json() {
        let err = PortariaConfig::from_lookup(lookup(&[("PORTARIA_BACKEND", "cloud")]));
        assert_eq!(
            err.unwrap_err(),
            ConfigError::UnsupportedBackend("cloud".to_string())
        );

        let config = PortariaConfig::from_json(
            r#"{"backend":{"kind":"remote","base_url":"https://desk.example/api"}}"#,
        )
        .unwrap();
        assert_eq!(config.backend.kind(), "remote");
    }
}
