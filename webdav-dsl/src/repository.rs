use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;
use webdav_core::{Credentials, WebDavClient};

use crate::backoff::Backoff;
use crate::config::DslConfig;
use crate::error::DslError;
use crate::paths::{escape_for_transport, resolve};

/// Repository-side lookups the DSL needs beyond plain WebDAV.
#[async_trait]
pub trait ContentService: Send + Sync {
    async fn node_ref_by_path(
        &self,
        user: &Credentials,
        repository_path: &str,
    ) -> Result<Option<String>, DslError>;

    /// Resolves once `repository_path` is gone from the repository.
    async fn wait_until_deleted(
        &self,
        user: &Credentials,
        repository_path: &str,
    ) -> Result<(), DslError>;
}

/// Polls the WebDAV URL of a path until the server answers 404.
pub struct PollingContentService {
    prefix: String,
    timeout: Duration,
    backoff: Backoff,
}

impl PollingContentService {
    pub fn new(config: &DslConfig) -> Self {
        Self {
            prefix: config.prefix_space(),
            timeout: config.delete_timeout,
            backoff: Backoff::polling(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ContentService for PollingContentService {
    async fn node_ref_by_path(
        &self,
        _user: &Credentials,
        _repository_path: &str,
    ) -> Result<Option<String>, DslError> {
        Ok(None)
    }

    async fn wait_until_deleted(
        &self,
        user: &Credentials,
        repository_path: &str,
    ) -> Result<(), DslError> {
        let client = WebDavClient::with_credentials(user.clone())?;
        let url = escape_for_transport(&resolve(&self.prefix, &[repository_path]));
        let started = Instant::now();
        let mut attempt = 0;
        loop {
            let status = client.get_status(&url).await?;
            if status == StatusCode::NOT_FOUND {
                return Ok(());
            }
            let waited = started.elapsed();
            if waited >= self.timeout {
                return Err(DslError::Timeout {
                    path: repository_path.to_string(),
                    waited,
                });
            }
            let delay = self.backoff.delay(attempt);
            debug!(%url, %status, ?delay, "waiting for removal");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
