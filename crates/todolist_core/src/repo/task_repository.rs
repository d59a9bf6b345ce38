//! Task repository: single-writer queue over the local task store.
//!
//! # Responsibility
//! - Own the SQLite connection on one dedicated worker thread.
//! - Run bootstrap/fetch/create/update/delete as serialized units of work.
//! - Orchestrate the one-time seed import and its persisted flag.
//!
//! # Invariants
//! - At most one unit of work touches the store at a time, in submission order.
//! - Every unit runs inside its own transaction; failures leave no writes.
//! - The bootstrap flag is set only after the import transaction committed.
//! - Callers only ever receive detached `TaskModel` snapshots.

use crate::config::CoreConfig;
use crate::db::{open_db, with_read_transaction, with_transaction, DbError};
use crate::model::task::{TaskId, TaskModel};
use crate::prefs::{JsonFilePreferences, Preferences, PrefsError, BOOTSTRAP_FLAG_KEY};
use crate::seed::{HttpSeedSource, SeedError, SeedSource, SeedTask};
use crate::store::task_store::{has_any_task, SqliteTaskStore, StoreError, StoreResult, TaskStore};
use log::{error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};

const WORKER_THREAD_NAME: &str = "task-repository";

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors delivered to repository callers.
#[derive(Debug)]
pub enum RepoError {
    /// Update/delete target does not exist.
    NotFound(TaskId),
    /// Remote endpoint and fallback dataset both failed.
    SeedUnavailable(SeedError),
    /// Store statement or commit failed; the unit was rolled back.
    TransactionFailed(DbError),
    /// Persisted rows could not be decoded.
    InvalidData(String),
    /// Underlying storage, preferences or transport setup failure.
    Io(Box<dyn Error + Send + Sync>),
    /// The worker is gone and the request was not (or no longer) processed.
    QueueClosed,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::SeedUnavailable(err) => write!(f, "{err}"),
            Self::TransactionFailed(err) => write!(f, "transaction failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::QueueClosed => write!(f, "task repository worker is not running"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SeedUnavailable(err) => Some(err),
            Self::TransactionFailed(err) => Some(err),
            Self::Io(err) => Some(err.as_ref()),
            Self::NotFound(_) | Self::InvalidData(_) | Self::QueueClosed => None,
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Db(err) => Self::TransactionFailed(err),
            StoreError::InvalidData(message) => Self::InvalidData(message),
        }
    }
}

impl From<SeedError> for RepoError {
    fn from(value: SeedError) -> Self {
        Self::SeedUnavailable(value)
    }
}

impl From<PrefsError> for RepoError {
    fn from(value: PrefsError) -> Self {
        Self::Io(Box::new(value))
    }
}

/// Result of a successful `bootstrap_if_needed` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The flag was already set; nothing was fetched.
    AlreadyImported,
    /// The store already held tasks, so no seed row was inserted.
    SkippedNonEmpty,
    /// This many seed tasks were inserted.
    Imported(usize),
}

type Reply<T> = oneshot::Sender<RepoResult<T>>;

enum Command {
    Bootstrap {
        reply: Reply<BootstrapOutcome>,
    },
    Fetch {
        search_text: Option<String>,
        reply: Reply<Vec<TaskModel>>,
    },
    Create {
        title: String,
        details: String,
        reply: Reply<TaskModel>,
    },
    Update {
        task: TaskModel,
        reply: Reply<()>,
    },
    Delete {
        id: TaskId,
        reply: Reply<()>,
    },
}

/// Serialized, transactional access point for task data.
///
/// Every operation enqueues its unit of work when called; the returned
/// future only waits for the result.
///
/// Dropping the repository closes the queue; units already queued still run.
/// Outside a tokio runtime the drop blocks until the worker exits. Inside a
/// runtime the worker is detached and finishes on its own thread, so the
/// dropping task is never blocked.
pub struct TaskRepository {
    commands: Option<mpsc::UnboundedSender<Command>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl TaskRepository {
    /// Opens the database, preferences file and HTTP seed source from config.
    ///
    /// # Errors
    /// - `RepoError::Io` when the database cannot be opened or migrated, or the
    ///   HTTP client cannot be built.
    pub fn open(config: &CoreConfig) -> RepoResult<Self> {
        let conn = open_db(&config.db_path).map_err(|err| RepoError::Io(Box::new(err)))?;
        let seed_source =
            HttpSeedSource::from_config(&config.seed).map_err(|err| RepoError::Io(Box::new(err)))?;
        let preferences = JsonFilePreferences::new(&config.preferences_path);

        Self::with_parts(conn, Arc::new(seed_source), Arc::new(preferences))
    }

    /// Starts the worker over an already migrated connection.
    ///
    /// The connection must come from `db::open_db`/`db::open_db_in_memory` so
    /// the schema and `fold_text` function are in place.
    pub fn with_parts(
        conn: Connection,
        seed_source: Arc<dyn SeedSource>,
        preferences: Arc<dyn Preferences>,
    ) -> RepoResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| RepoError::Io(Box::new(err)))?;

        let (commands, receiver) = mpsc::unbounded_channel();
        let worker = Worker {
            conn,
            seed_source,
            preferences,
        };
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || runtime.block_on(worker.run(receiver)))
            .map_err(|err| RepoError::Io(Box::new(err)))?;

        Ok(Self {
            commands: Some(commands),
            worker: Some(handle),
        })
    }

    /// Imports the seed list once, unless it already happened.
    pub fn bootstrap_if_needed(
        &self,
    ) -> impl Future<Output = RepoResult<BootstrapOutcome>> + Send + 'static {
        self.submit(|reply| Command::Bootstrap { reply })
    }

    /// Lists tasks newest first; blank or absent `search_text` lists all.
    pub fn fetch_tasks(
        &self,
        search_text: Option<&str>,
    ) -> impl Future<Output = RepoResult<Vec<TaskModel>>> + Send + 'static {
        let search_text = search_text.map(str::to_owned);
        self.submit(move |reply| Command::Fetch { search_text, reply })
    }

    /// Inserts a new, not completed task and returns its snapshot.
    pub fn create_task(
        &self,
        title: impl Into<String>,
        details: impl Into<String>,
    ) -> impl Future<Output = RepoResult<TaskModel>> + Send + 'static {
        let title = title.into();
        let details = details.into();
        self.submit(move |reply| Command::Create {
            title,
            details,
            reply,
        })
    }

    /// Overwrites title, details and completion of the task with `task.id`.
    pub fn update_task(
        &self,
        task: &TaskModel,
    ) -> impl Future<Output = RepoResult<()>> + Send + 'static {
        let task = task.clone();
        self.submit(move |reply| Command::Update { task, reply })
    }

    pub fn delete_task(&self, id: TaskId) -> impl Future<Output = RepoResult<()>> + Send + 'static {
        self.submit(move |reply| Command::Delete { id, reply })
    }

    fn submit<T, F>(&self, build: F) -> impl Future<Output = RepoResult<T>> + Send + 'static
    where
        T: Send + 'static,
        F: FnOnce(Reply<T>) -> Command,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let queued = match &self.commands {
            Some(commands) => commands.send(build(reply_tx)).is_ok(),
            None => false,
        };

        async move {
            if !queued {
                return Err(RepoError::QueueClosed);
            }
            reply_rx.await.map_err(|_| RepoError::QueueClosed)?
        }
    }
}

impl Drop for TaskRepository {
    fn drop(&mut self) {
        // Closing the sender lets the worker drain queued units and exit.
        drop(self.commands.take());
        let Some(handle) = self.worker.take() else {
            return;
        };

        // Joining would stall an async caller until the queue drains.
        if tokio::runtime::Handle::try_current().is_ok() {
            info!("event=repo_worker module=repo status=detached");
            return;
        }

        if handle.join().is_err() {
            error!("event=repo_worker module=repo status=error error_code=worker_panicked");
        }
    }
}

struct Worker {
    conn: Connection,
    seed_source: Arc<dyn SeedSource>,
    preferences: Arc<dyn Preferences>,
}

impl Worker {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        info!("event=repo_worker module=repo status=start");

        while let Some(command) = commands.recv().await {
            let started_at = Instant::now();
            match command {
                Command::Bootstrap { reply } => {
                    let result = self.bootstrap().await;
                    deliver("bootstrap", started_at, result, reply);
                }
                Command::Fetch { search_text, reply } => {
                    let result = self.fetch(search_text.as_deref());
                    deliver("fetch", started_at, result, reply);
                }
                Command::Create {
                    title,
                    details,
                    reply,
                } => {
                    let result = self.create(title, details);
                    deliver("create", started_at, result, reply);
                }
                Command::Update { task, reply } => {
                    let result = self.update(task);
                    deliver("update", started_at, result, reply);
                }
                Command::Delete { id, reply } => {
                    let result = self.delete(id);
                    deliver("delete", started_at, result, reply);
                }
            }
        }

        info!("event=repo_worker module=repo status=stop");
    }

    async fn bootstrap(&mut self) -> RepoResult<BootstrapOutcome> {
        if self.preferences.bool_value(BOOTSTRAP_FLAG_KEY)? {
            return Ok(BootstrapOutcome::AlreadyImported);
        }

        let seed_tasks = self.seed_source.load_seed_tasks().await?;

        let outcome = with_transaction(&mut self.conn, |tx| -> StoreResult<_> {
            // Any existing row counts as a prior import.
            if has_any_task(tx)? {
                return Ok(BootstrapOutcome::SkippedNonEmpty);
            }

            let store = SqliteTaskStore::new(tx);
            for item in &seed_tasks {
                store.insert(&imported_task(item))?;
            }
            Ok(BootstrapOutcome::Imported(seed_tasks.len()))
        })?;

        self.preferences.set_bool(BOOTSTRAP_FLAG_KEY, true)?;
        Ok(outcome)
    }

    fn fetch(&mut self, search_text: Option<&str>) -> RepoResult<Vec<TaskModel>> {
        let tasks = with_read_transaction(&mut self.conn, |tx| {
            SqliteTaskStore::new(tx).fetch_all(search_text)
        })?;
        Ok(tasks)
    }

    fn create(&mut self, title: String, details: String) -> RepoResult<TaskModel> {
        let task = TaskModel::new(title, details);
        with_transaction(&mut self.conn, |tx| SqliteTaskStore::new(tx).insert(&task))?;
        Ok(task)
    }

    fn update(&mut self, task: TaskModel) -> RepoResult<()> {
        let TaskModel {
            id,
            title,
            details,
            is_completed,
            ..
        } = task;

        with_transaction(&mut self.conn, |tx| {
            SqliteTaskStore::new(tx).update(id, |stored| {
                stored.title = title;
                stored.details = details;
                stored.is_completed = is_completed;
            })
        })?;
        Ok(())
    }

    fn delete(&mut self, id: TaskId) -> RepoResult<()> {
        with_transaction(&mut self.conn, |tx| SqliteTaskStore::new(tx).delete(id))?;
        Ok(())
    }
}

fn imported_task(item: &SeedTask) -> TaskModel {
    TaskModel::imported(
        item.id,
        item.text.clone(),
        format!("Imported from dummyjson (userId: {})", item.owner_id),
        item.completed,
    )
}

fn deliver<T>(op: &'static str, started_at: Instant, result: RepoResult<T>, reply: Reply<T>) {
    let duration_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => info!("event=repo_{op} module=repo status=ok duration_ms={duration_ms}"),
        Err(err) => warn!(
            "event=repo_{op} module=repo status=error duration_ms={duration_ms} error={err}"
        ),
    }

    if reply.send(result).is_err() {
        warn!("event=repo_{op} module=repo status=dropped reason=caller_gone");
    }
}
