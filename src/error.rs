//! Error types.
//!
//! Fetch errors are fatal to a run; cache errors are downgraded to warnings by
//! the manager; config errors stop the process before anything is fetched.

use std::path::PathBuf;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{method} {url} → HTTP {status}")]
    Status {
        method: String,
        url: String,
        status: u16,
    },

    #[error("{method} {url} failed: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("decoding response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("pagination loops back to {url}")]
    PageLoop { url: String },

    #[error("retry exceeded for {url} after {attempts} attempts")]
    RetryExceeded { url: String, attempts: u32 },
}

impl FetchError {
    /// Bad gateway and gateway timeout are the only statuses worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Status { status: 502 | 504, .. })
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("no cache file at {}", path.display())]
    Missing { path: PathBuf },

    #[error("cache file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache file {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serializing cache: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T, E = FetchError> = std::result::Result<T, E>;
