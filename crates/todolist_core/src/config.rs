//! Runtime configuration for the task core.
//!
//! # Responsibility
//! - Describe file locations, the seed endpoint and optional logging setup.
//! - Provide defaults so embedders only override what they need.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid config.

use crate::seed::SeedFallback;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_SEED_ENDPOINT: &str = "https://dummyjson.com/todos";
pub const DB_FILE_NAME: &str = "todolist.sqlite3";
pub const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// Top-level configuration consumed by `TaskRepository::open`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub preferences_path: PathBuf,
    pub seed: SeedConfig,
    /// Passed to [`crate::logging::init_logging_from_config`] by the embedder.
    pub log: Option<LogConfig>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::in_dir(".")
    }
}

impl CoreConfig {
    /// Places the database and preferences files inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            db_path: dir.join(DB_FILE_NAME),
            preferences_path: dir.join(PREFERENCES_FILE_NAME),
            seed: SeedConfig::default(),
            log: None,
        }
    }

    /// Parses a config from JSON, filling absent fields with defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Seed source settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// `None` skips the remote stage and goes straight to the fallback.
    pub endpoint: Option<String>,
    pub fallback: SeedFallback,
    /// Request timeout. `None` waits as long as the transport allows.
    pub timeout_ms: Option<u64>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            endpoint: Some(DEFAULT_SEED_ENDPOINT.to_string()),
            fallback: SeedFallback::Bundled,
            timeout_ms: None,
        }
    }
}

/// File logging settings, see [`crate::logging::init_logging`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_level")]
    pub level: String,
    pub dir: PathBuf,
}

fn default_level() -> String {
    crate::logging::default_log_level().to_string()
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, SeedConfig, DEFAULT_SEED_ENDPOINT};
    use crate::seed::SeedFallback;
    use std::path::PathBuf;

    #[test]
    fn empty_object_yields_defaults() {
        let config = CoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(
            config.seed.endpoint.as_deref(),
            Some(DEFAULT_SEED_ENDPOINT)
        );
        assert_eq!(config.seed.fallback, SeedFallback::Bundled);
        assert!(config.log.is_none());
    }

    #[test]
    fn in_dir_derives_file_names() {
        let config = CoreConfig::in_dir("/data/app");
        assert_eq!(config.db_path, PathBuf::from("/data/app/todolist.sqlite3"));
        assert_eq!(
            config.preferences_path,
            PathBuf::from("/data/app/preferences.json")
        );
    }

    #[test]
    fn partial_json_overrides_selected_fields() {
        let config = CoreConfig::from_json_str(
            r#"{
                "db_path": "/tmp/tasks.db",
                "seed": {
                    "endpoint": null,
                    "fallback": {"kind": "file", "path": "/tmp/seed.json"},
                    "timeout_ms": 2500
                },
                "log": {"dir": "/tmp/logs"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/tasks.db"));
        assert_eq!(
            config.seed,
            SeedConfig {
                endpoint: None,
                fallback: SeedFallback::File(PathBuf::from("/tmp/seed.json")),
                timeout_ms: Some(2500),
            }
        );
        let log = config.log.unwrap();
        assert_eq!(log.dir, PathBuf::from("/tmp/logs"));
        assert!(!log.level.is_empty());
    }
}
