//! Local task store.
//!
//! # Responsibility
//! - Define the data access contract for task records.
//! - Isolate SQLite query details from repository orchestration.
//!
//! # Invariants
//! - Store APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - The store never validates titles; callers own input validation.

pub mod task_store;
