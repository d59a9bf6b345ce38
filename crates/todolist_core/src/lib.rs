//! Core persistence and synchronization layer for the task list.
//! This crate is the single source of truth for task data invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod prefs;
pub mod repo;
pub mod search;
pub mod seed;
pub mod store;

pub use config::{CoreConfig, LogConfig, SeedConfig};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::task::{TaskId, TaskModel};
pub use prefs::{
    InMemoryPreferences, JsonFilePreferences, Preferences, PrefsError, BOOTSTRAP_FLAG_KEY,
};
pub use repo::task_repository::{BootstrapOutcome, RepoError, RepoResult, TaskRepository};
pub use seed::{
    FetchError, HttpSeedSource, SeedError, SeedFallback, SeedResult, SeedSource, SeedTask,
};
pub use store::task_store::{SqliteTaskStore, StoreError, StoreResult, TaskStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
