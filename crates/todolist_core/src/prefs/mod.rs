//! Lightweight persisted preferences.
//!
//! # Responsibility
//! - Hold small process-wide settings such as the bootstrap flag.
//! - Keep the storage medium behind a `get`/`set` contract so the repository
//!   receives it as an explicit dependency.
//!
//! # Invariants
//! - A key that was never written reads as `false`.
//! - `JsonFilePreferences` never leaves a half-written file behind.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Preference key recording that the seed import committed.
pub const BOOTSTRAP_FLAG_KEY: &str = "didImportDummyTodos";

pub type PrefsResult<T> = Result<T, PrefsError>;

#[derive(Debug)]
pub enum PrefsError {
    Io(std::io::Error),
    Decode(serde_json::Error),
}

impl Display for PrefsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "preferences io failed: {err}"),
            Self::Decode(err) => write!(f, "preferences file is malformed: {err}"),
        }
    }
}

impl Error for PrefsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Decode(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for PrefsError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for PrefsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value)
    }
}

/// Boolean key-value settings store.
pub trait Preferences: Send + Sync {
    fn bool_value(&self, key: &str) -> PrefsResult<bool>;
    fn set_bool(&self, key: &str, value: bool) -> PrefsResult<()>;
}

/// Preferences persisted as one JSON object file.
pub struct JsonFilePreferences {
    path: PathBuf,
}

impl JsonFilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> PrefsResult<Map<String, Value>> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(Map::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_all(&self, values: &Map<String, Value>) -> PrefsResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, serde_json::to_vec_pretty(values)?)?;
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

impl Preferences for JsonFilePreferences {
    fn bool_value(&self, key: &str) -> PrefsResult<bool> {
        let values = self.read_all()?;
        Ok(values.get(key).and_then(Value::as_bool).unwrap_or(false))
    }

    fn set_bool(&self, key: &str, value: bool) -> PrefsResult<()> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), Value::Bool(value));
        self.write_all(&values)
    }
}

/// Process-local preferences, lost when dropped.
#[derive(Default)]
pub struct InMemoryPreferences {
    values: Mutex<BTreeMap<String, bool>>,
}

impl InMemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Preferences for InMemoryPreferences {
    fn bool_value(&self, key: &str) -> PrefsResult<bool> {
        let values = self
            .values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(values.get(key).copied().unwrap_or(false))
    }

    fn set_bool(&self, key: &str, value: bool) -> PrefsResult<()> {
        let mut values = self
            .values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        values.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryPreferences, JsonFilePreferences, PrefsError, Preferences};

    #[test]
    fn missing_file_reads_as_unset() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = JsonFilePreferences::new(dir.path().join("prefs.json"));

        assert!(!prefs.bool_value("anything").unwrap());
    }

    #[test]
    fn json_file_roundtrips_and_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");
        let prefs = JsonFilePreferences::new(&path);

        prefs.set_bool("first", true).unwrap();
        prefs.set_bool("second", false).unwrap();

        let reopened = JsonFilePreferences::new(&path);
        assert!(reopened.bool_value("first").unwrap());
        assert!(!reopened.bool_value("second").unwrap());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();

        let err = JsonFilePreferences::new(&path)
            .bool_value("key")
            .unwrap_err();
        assert!(matches!(err, PrefsError::Decode(_)));
    }

    #[test]
    fn in_memory_defaults_to_false() {
        let prefs = InMemoryPreferences::new();
        assert!(!prefs.bool_value("flag").unwrap());

        prefs.set_bool("flag", true).unwrap();
        assert!(prefs.bool_value("flag").unwrap());
    }
}
