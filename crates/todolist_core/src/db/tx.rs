//! Transaction scoping for store units of work.

use log::warn;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Runs `work` inside one IMMEDIATE transaction.
///
/// Commits when `work` returns `Ok`, rolls back when it returns `Err`. The
/// error returned by `work` is passed through unchanged; a failing rollback
/// is only logged because SQLite discards the transaction on close anyway.
///
/// # Errors
/// - Any error produced by `work`.
/// - Begin/commit failures, converted through `E: From<rusqlite::Error>`.
pub fn with_transaction<T, E, F>(conn: &mut Connection, work: F) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    run_in_transaction(conn, TransactionBehavior::Immediate, work)
}

/// Runs read-only `work` inside one DEFERRED transaction.
///
/// No write lock is taken until a statement writes, so listings never
/// contend with other connections for the reserved lock.
pub fn with_read_transaction<T, E, F>(conn: &mut Connection, work: F) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    run_in_transaction(conn, TransactionBehavior::Deferred, work)
}

fn run_in_transaction<T, E, F>(
    conn: &mut Connection,
    behavior: TransactionBehavior,
    work: F,
) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    let tx = conn.transaction_with_behavior(behavior)?;

    match work(&tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(
                    "event=db_rollback module=db status=error error={}",
                    rollback_err
                );
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{with_read_transaction, with_transaction};
    use rusqlite::Connection;
    use std::time::Duration;

    fn seeded_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE kv (k TEXT PRIMARY KEY, v INTEGER NOT NULL);")
            .unwrap();
        conn
    }

    fn row_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM kv;", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn commits_when_work_succeeds() {
        let mut conn = seeded_conn();

        let inserted = with_transaction(&mut conn, |tx| -> Result<usize, rusqlite::Error> {
            tx.execute("INSERT INTO kv (k, v) VALUES ('a', 1);", [])
        })
        .unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(row_count(&conn), 1);
    }

    #[test]
    fn rolls_back_every_write_when_work_fails() {
        let mut conn = seeded_conn();

        let result = with_transaction(&mut conn, |tx| -> Result<(), rusqlite::Error> {
            tx.execute("INSERT INTO kv (k, v) VALUES ('a', 1);", [])?;
            // Duplicate primary key aborts the unit after one successful write.
            tx.execute("INSERT INTO kv (k, v) VALUES ('a', 2);", [])?;
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(row_count(&conn), 0);
    }

    #[test]
    fn read_transaction_does_not_wait_for_write_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locks.db");

        let writer = Connection::open(&path).unwrap();
        writer
            .execute_batch(
                "CREATE TABLE kv (k TEXT PRIMARY KEY, v INTEGER NOT NULL);
                 INSERT INTO kv (k, v) VALUES ('a', 1);",
            )
            .unwrap();

        let mut reader = Connection::open(&path).unwrap();
        reader.busy_timeout(Duration::ZERO).unwrap();

        writer
            .execute_batch("BEGIN IMMEDIATE; INSERT INTO kv (k, v) VALUES ('b', 2);")
            .unwrap();

        let visible = with_read_transaction(&mut reader, |tx| -> Result<i64, rusqlite::Error> {
            tx.query_row("SELECT COUNT(*) FROM kv;", [], |row| row.get(0))
        })
        .unwrap();
        assert_eq!(visible, 1);

        let blocked =
            with_transaction(&mut reader, |_tx| -> Result<(), rusqlite::Error> { Ok(()) });
        assert!(blocked.is_err());

        writer.execute_batch("COMMIT;").unwrap();
    }
}
