//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task snapshot shared by store and repository.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod task;
