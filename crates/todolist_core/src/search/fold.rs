//! Case- and diacritic-insensitive text folding for task search.
//!
//! # Responsibility
//! - Normalize text so "Café", "CAFE" and "cafe" compare equal.
//! - Expose the same folding to SQL as the `fold_text(text)` scalar function.
//!
//! # Invariants
//! - Folding is deterministic and idempotent.
//! - `NULL` input folds to `NULL`.

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Name of the SQL scalar function registered by [`register_fold_function`].
pub const FOLD_FUNCTION_NAME: &str = "fold_text";

/// Lowercases `value` and strips combining marks after canonical decomposition.
pub fn fold_text(value: &str) -> String {
    value
        .to_lowercase()
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect()
}

/// Returns the search needle for `filter`, or `None` when it is blank.
///
/// Blank detection trims whitespace, the needle itself keeps the caller's
/// spacing.
pub fn search_needle(filter: Option<&str>) -> Option<String> {
    let filter = filter?;
    if filter.trim().is_empty() {
        return None;
    }
    Some(fold_text(filter))
}

/// Registers `fold_text(text)` on the given connection.
pub fn register_fold_function(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        FOLD_FUNCTION_NAME,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value = ctx.get::<Option<String>>(0)?;
            Ok(value.map(|text| fold_text(&text)))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::{fold_text, register_fold_function, search_needle};
    use rusqlite::Connection;

    #[test]
    fn fold_text_ignores_case_and_accents() {
        assert_eq!(fold_text("Café"), "cafe");
        assert_eq!(fold_text("CRÈME Brûlée"), "creme brulee");
        assert_eq!(fold_text("Ёлка"), "елка");
    }

    #[test]
    fn fold_text_is_idempotent() {
        let once = fold_text("Ünïcödé");
        assert_eq!(fold_text(&once), once);
    }

    #[test]
    fn search_needle_treats_blank_as_absent() {
        assert_eq!(search_needle(None), None);
        assert_eq!(search_needle(Some("")), None);
        assert_eq!(search_needle(Some(" \t\n")), None);
        assert_eq!(search_needle(Some("Milk")), Some("milk".to_string()));
    }

    #[test]
    fn sql_function_matches_rust_folding() {
        let conn = Connection::open_in_memory().unwrap();
        register_fold_function(&conn).unwrap();

        let folded: String = conn
            .query_row("SELECT fold_text('Crème')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(folded, "creme");

        let null: Option<String> = conn
            .query_row("SELECT fold_text(NULL)", [], |row| row.get(0))
            .unwrap();
        assert_eq!(null, None);
    }
}
