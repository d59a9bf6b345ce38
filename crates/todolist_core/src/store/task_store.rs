//! Task store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and filtered listing over the `tasks` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Listing order is `created_at DESC`, ties newest insert first.
//! - `update` only ever writes `title`, `details` and `is_completed`.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::task::{TaskId, TaskModel};
use crate::search::fold::search_needle;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    remote_id,
    title,
    details,
    created_at,
    is_completed
FROM tasks";

const TASK_ORDER_SQL: &str = "ORDER BY created_at DESC, rowid DESC";

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by task store operations.
#[derive(Debug)]
pub enum StoreError {
    /// No row matches the requested id.
    NotFound(TaskId),
    Db(DbError),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage interface for task records.
pub trait TaskStore {
    /// Lists tasks newest first, optionally narrowed by a search filter.
    fn fetch_all(&self, filter: Option<&str>) -> StoreResult<Vec<TaskModel>>;
    fn get(&self, id: TaskId) -> StoreResult<Option<TaskModel>>;
    fn insert(&self, task: &TaskModel) -> StoreResult<TaskId>;
    /// Loads `id`, applies `mutator` and persists the mutable fields.
    fn update<F>(&self, id: TaskId, mutator: F) -> StoreResult<TaskModel>
    where
        F: FnOnce(&mut TaskModel);
    fn delete(&self, id: TaskId) -> StoreResult<()>;
    fn count(&self) -> StoreResult<u64>;
}

/// SQLite-backed task store.
///
/// Borrows a connection; pass a `Transaction` (which derefs to `Connection`)
/// to make several calls one atomic unit.
pub struct SqliteTaskStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskStore for SqliteTaskStore<'_> {
    fn fetch_all(&self, filter: Option<&str>) -> StoreResult<Vec<TaskModel>> {
        let needle = search_needle(filter);
        let sql = if needle.is_some() {
            format!(
                "{TASK_SELECT_SQL}
                 WHERE instr(fold_text(title), ?1) > 0
                    OR instr(fold_text(details), ?1) > 0
                 {TASK_ORDER_SQL};"
            )
        } else {
            format!("{TASK_SELECT_SQL} {TASK_ORDER_SQL};")
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = match needle.as_deref() {
            Some(needle) => stmt.query([needle])?,
            None => stmt.query([])?,
        };

        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn get(&self, id: TaskId) -> StoreResult<Option<TaskModel>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_task_row(row)?)),
            None => Ok(None),
        }
    }

    fn insert(&self, task: &TaskModel) -> StoreResult<TaskId> {
        self.conn.execute(
            "INSERT INTO tasks (
                id,
                remote_id,
                title,
                details,
                created_at,
                is_completed
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                task.id.to_string(),
                task.remote_id,
                task.title.as_str(),
                task.details.as_str(),
                task.created_at,
                bool_to_int(task.is_completed),
            ],
        )?;

        Ok(task.id)
    }

    fn update<F>(&self, id: TaskId, mutator: F) -> StoreResult<TaskModel>
    where
        F: FnOnce(&mut TaskModel),
    {
        let stored = self.get(id)?.ok_or(StoreError::NotFound(id))?;

        let mut edited = stored.clone();
        mutator(&mut edited);
        let updated = TaskModel {
            title: edited.title,
            details: edited.details,
            is_completed: edited.is_completed,
            ..stored
        };

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                details = ?2,
                is_completed = ?3
             WHERE id = ?4;",
            params![
                updated.title.as_str(),
                updated.details.as_str(),
                bool_to_int(updated.is_completed),
                id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(updated)
    }

    fn delete(&self, id: TaskId) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn count(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("negative task count `{count}`")))
    }
}

/// Returns whether any task row exists, without counting the whole table.
pub fn has_any_task(conn: &Connection) -> StoreResult<bool> {
    let found = conn
        .query_row("SELECT 1 FROM tasks LIMIT 1;", [], |row| row.get::<_, i64>(0))
        .optional()?;
    Ok(found.is_some())
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<TaskModel> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        StoreError::InvalidData(format!("invalid uuid value `{id_text}` in tasks.id"))
    })?;

    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid is_completed value `{other}` in tasks.is_completed"
            )));
        }
    };

    Ok(TaskModel {
        id,
        remote_id: row.get("remote_id")?,
        title: row.get("title")?,
        details: row.get("details")?,
        created_at: row.get("created_at")?,
        is_completed,
    })
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}
