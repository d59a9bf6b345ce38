//! Remote seed source used by the one-time bootstrap import.
//!
//! # Responsibility
//! - Define the seed item shape and the async source contract.
//! - Provide the HTTP source with a bundled/file fallback dataset.
//!
//! # Invariants
//! - Sources make exactly one attempt per stage; there is no retry.
//! - `SeedError::Unavailable` is only produced when every stage failed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod fallback;
mod http;

pub use fallback::{SeedFallback, BUNDLED_SEED_JSON};
pub use http::HttpSeedSource;

pub type SeedResult<T> = Result<T, SeedError>;

/// One record of the external seed list.
///
/// Serialized with the endpoint's wire names (`todo`, `userId`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedTask {
    pub id: i64,
    #[serde(rename = "todo")]
    pub text: String,
    pub completed: bool,
    #[serde(rename = "userId")]
    pub owner_id: i64,
}

/// Top-level payload of both the endpoint and the fallback dataset.
///
/// Pagination fields (`total`, `skip`, `limit`) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedPayload {
    pub todos: Vec<SeedTask>,
}

/// Failure of a single seed stage (remote or fallback).
#[derive(Debug)]
pub enum FetchError {
    /// No endpoint configured.
    MissingUrl,
    InvalidUrl(String),
    Http(reqwest::Error),
    Status(u16),
    Decode(serde_json::Error),
    Io(std::io::Error),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingUrl => write!(f, "no seed url configured"),
            Self::InvalidUrl(value) => write!(f, "invalid seed url `{value}`"),
            Self::Http(err) => write!(f, "seed request failed: {err}"),
            Self::Status(code) => write!(f, "seed endpoint returned status {code}"),
            Self::Decode(err) => write!(f, "seed payload could not be decoded: {err}"),
            Self::Io(err) => write!(f, "seed dataset could not be read: {err}"),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::MissingUrl | Self::InvalidUrl(_) | Self::Status(_) => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value)
    }
}

impl From<std::io::Error> for FetchError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Error surfaced to the repository when no seed data can be produced.
#[derive(Debug)]
pub enum SeedError {
    /// Both the remote endpoint and the fallback dataset failed.
    Unavailable { remote: FetchError, fallback: FetchError },
}

impl Display for SeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { remote, fallback } => write!(
                f,
                "seed data unavailable: remote: {remote}; fallback: {fallback}"
            ),
        }
    }
}

impl Error for SeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable { fallback, .. } => Some(fallback),
        }
    }
}

/// Producer of the seed list consumed by the bootstrap import.
#[async_trait]
pub trait SeedSource: Send + Sync {
    async fn load_seed_tasks(&self) -> SeedResult<Vec<SeedTask>>;
}

/// Decodes a seed payload from raw JSON bytes.
pub fn decode_seed_payload(bytes: &[u8]) -> Result<Vec<SeedTask>, FetchError> {
    let payload: SeedPayload = serde_json::from_slice(bytes)?;
    Ok(payload.todos)
}

#[cfg(test)]
mod tests {
    use super::{decode_seed_payload, FetchError, SeedTask};

    #[test]
    fn decode_uses_endpoint_field_names() {
        let body = br#"{
            "todos": [{"id": 7, "todo": "Buy milk", "completed": true, "userId": 3}],
            "total": 1, "skip": 0, "limit": 30
        }"#;

        let tasks = decode_seed_payload(body).unwrap();
        assert_eq!(
            tasks,
            vec![SeedTask {
                id: 7,
                text: "Buy milk".to_string(),
                completed: true,
                owner_id: 3,
            }]
        );
    }

    #[test]
    fn decode_rejects_missing_todos_key() {
        let err = decode_seed_payload(br#"{"items": []}"#).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
