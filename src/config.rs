//! YAML configuration file.
//!
//! A missing file is not an error: the defaults below apply.  The API token
//! comes from the command line or the environment, never from this file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::remote::DEFAULT_ENDPOINT;
use crate::rules::{Filter, Rule};

const APP_DIR: &str = "gh-inbox";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub cache: CacheConfig,
    pub http: HttpConfig,
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub path: PathBuf,
    pub ttl_in_hours: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// First retry delay; doubles per attempt.
    pub backoff_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            cache: CacheConfig::default(),
            http: HttpConfig::default(),
            rules: vec![Rule {
                name: "closed pull requests".into(),
                action: "done".into(),
                filter: Filter {
                    kinds: vec!["PullRequest".into()],
                    states: vec!["closed".into(), "merged".into()],
                    ..Filter::default()
                },
            }],
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_DIR)
                .join("notifications.json"),
            ttl_in_hours: 1,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            backoff_ms: 500,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl Config {
    /// `<config_dir>/gh-inbox/config.yaml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.yaml")
    }

    /// Read and validate `path`, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".into()));
        }
        if self.cache.ttl_in_hours <= 0 {
            return Err(ConfigError::Invalid(format!(
                "cache.ttl_in_hours must be positive, got {}",
                self.cache.ttl_in_hours
            )));
        }
        if let Some(rule) = self.rules.iter().find(|r| r.action.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "rule {:?} has no action",
                rule.name
            )));
        }
        Ok(())
    }

    /// TTL in whole hours; only meaningful after [`validate`](Self::validate).
    pub fn ttl_in_hours(&self) -> u64 {
        self.cache.ttl_in_hours.max(1).unsigned_abs()
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
