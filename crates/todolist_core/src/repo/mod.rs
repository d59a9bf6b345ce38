//! Repository layer: the single authority over task data access.
//!
//! # Responsibility
//! - Serialize every store interaction through one worker queue.
//! - Map store, seed and preferences failures to typed caller errors.
//!
//! # Invariants
//! - No code outside the worker touches the SQLite connection.
//! - A failed unit of work never leaves partial writes behind.

pub mod task_repository;
