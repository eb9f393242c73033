//! Thread pool configuration.
//!
//! Pools are matched against thread names by literal substring, in the order
//! they are listed. Accepts the JSON shape used by existing tooling:
//!
//! ```json
//! { "threadGroups": [ { "poolName": "http-nio" }, { "poolName": "ForkJoinPool" } ] }
//! ```
//!
//! or the equivalent TOML:
//!
//! ```toml
//! [[thread_groups]]
//! pool_name = "http-nio"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ThreadlensError;

/// Ordered list of named pools.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    #[serde(rename = "threadGroups", alias = "thread_groups")]
    pub thread_groups: Vec<PoolEntry>,
}

/// One named pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEntry {
    #[serde(rename = "poolName", alias = "pool_name")]
    pub pool_name: String,
}

impl PoolConfig {
    /// Build a config from pool names, keeping their order.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            thread_groups: names
                .into_iter()
                .map(|name| PoolEntry {
                    pool_name: name.into(),
                })
                .collect(),
        }
    }

    pub fn pool_names(&self) -> impl Iterator<Item = &str> {
        self.thread_groups.iter().map(|entry| entry.pool_name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.thread_groups.is_empty()
    }

    /// Parse a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load from a `.json` or `.toml` file.
    pub fn load_from_path(path: &Path) -> Result<Self, ThreadlensError> {
        let content = std::fs::read_to_string(path).map_err(|source| ThreadlensError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let parse_error = |message: String| ThreadlensError::ConfigParse {
            path: path.to_path_buf(),
            message,
        };

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content).map_err(|e| parse_error(e.to_string())),
            Some("toml") => Self::from_toml_str(&content).map_err(|e| parse_error(e.to_string())),
            _ => Err(ThreadlensError::UnsupportedConfigFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Like [`load_from_path`](Self::load_from_path), but degrades to the
    /// empty default when the file is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_path(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{e}; using no pools");
                Self::default()
            }
        }
    }
}
