//! Fallback seed dataset shipped with the application.

use super::{decode_seed_payload, FetchError, SeedTask};
use serde::Deserialize;
use std::path::PathBuf;

/// Seed payload compiled into the crate.
pub const BUNDLED_SEED_JSON: &str = include_str!("../../assets/todos.json");

/// Where the second seed stage reads its dataset from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum SeedFallback {
    /// The dataset embedded at build time.
    #[default]
    Bundled,
    /// A JSON file on disk with the endpoint's payload shape.
    File(PathBuf),
}

impl SeedFallback {
    /// Reads and decodes the fallback dataset.
    pub fn load(&self) -> Result<Vec<SeedTask>, FetchError> {
        match self {
            Self::Bundled => decode_seed_payload(BUNDLED_SEED_JSON.as_bytes()),
            Self::File(path) => {
                let bytes = std::fs::read(path)?;
                decode_seed_payload(&bytes)
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Bundled => "bundled",
            Self::File(_) => "file",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SeedFallback;
    use crate::seed::FetchError;

    #[test]
    fn bundled_dataset_decodes() {
        let tasks = SeedFallback::Bundled.load().unwrap();
        assert!(!tasks.is_empty());
        assert!(tasks.iter().all(|task| !task.text.is_empty()));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = SeedFallback::File(dir.path().join("absent.json"));

        assert!(matches!(fallback.load(), Err(FetchError::Io(_))));
    }
}
