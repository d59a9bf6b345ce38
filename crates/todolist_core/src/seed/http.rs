//! HTTP seed source with a single fallback stage.
//!
//! # Responsibility
//! - Fetch the seed list from the configured JSON endpoint.
//! - Fall back to the configured dataset on any remote failure.
//!
//! # Invariants
//! - One request per call, no retry.
//! - The fallback stage runs only after the remote stage failed.

use super::{
    decode_seed_payload, FetchError, SeedError, SeedFallback, SeedResult, SeedSource, SeedTask,
};
use crate::config::SeedConfig;
use async_trait::async_trait;
use log::{info, warn};
use reqwest::{Client, Url};
use std::time::{Duration, Instant};

/// Seed source backed by an HTTP endpoint plus a fallback dataset.
pub struct HttpSeedSource {
    client: Client,
    endpoint: Option<String>,
    fallback: SeedFallback,
}

impl HttpSeedSource {
    /// Builds a source from config, honoring the optional request timeout.
    ///
    /// # Errors
    /// - Returns `FetchError::Http` when the HTTP client cannot be built.
    pub fn from_config(config: &SeedConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if let Some(timeout_ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder.build()?;

        Ok(Self::with_client(
            client,
            config.endpoint.clone(),
            config.fallback.clone(),
        ))
    }

    pub fn with_client(client: Client, endpoint: Option<String>, fallback: SeedFallback) -> Self {
        Self {
            client,
            endpoint,
            fallback,
        }
    }

    async fn fetch_remote(&self) -> Result<Vec<SeedTask>, FetchError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or(FetchError::MissingUrl)?;
        let url = Url::parse(endpoint).map_err(|_| FetchError::InvalidUrl(endpoint.to_string()))?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        decode_seed_payload(&body)
    }
}

#[async_trait]
impl SeedSource for HttpSeedSource {
    async fn load_seed_tasks(&self) -> SeedResult<Vec<SeedTask>> {
        let started_at = Instant::now();

        let remote = match self.fetch_remote().await {
            Ok(tasks) => {
                info!(
                    "event=seed_load module=seed status=ok stage=remote count={} duration_ms={}",
                    tasks.len(),
                    started_at.elapsed().as_millis()
                );
                return Ok(tasks);
            }
            Err(err) => err,
        };

        warn!(
            "event=seed_load module=seed status=fallback stage=remote error={}",
            remote
        );

        match self.fallback.load() {
            Ok(tasks) => {
                info!(
                    "event=seed_load module=seed status=ok stage={} count={} duration_ms={}",
                    self.fallback.label(),
                    tasks.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(tasks)
            }
            Err(fallback) => {
                warn!(
                    "event=seed_load module=seed status=error stage={} error={}",
                    self.fallback.label(),
                    fallback
                );
                Err(SeedError::Unavailable { remote, fallback })
            }
        }
    }
}
