//! Search text normalization.
//!
//! # Responsibility
//! - Provide folding shared by Rust callers and the SQLite `fold_text` function.

pub mod fold;
