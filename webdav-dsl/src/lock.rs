use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, warn};
use webdav_core::{Depth, WebDavClient};

use crate::error::DslError;

pub const LOCK_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockState {
    #[default]
    Unlocked,
    LockPending,
    Locked,
    UnlockPending,
}

/// Exclusive write lock held by one session. An empty token means no lock.
#[derive(Debug, Default)]
pub struct LockCoordinator {
    state: LockState,
    token: String,
}

impl LockCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub async fn lock(
        &mut self,
        client: &WebDavClient,
        url: &str,
        owner: &str,
    ) -> Result<StatusCode, DslError> {
        self.token.clear();
        self.state = LockState::LockPending;
        debug!(%url, %owner, "LOCK");
        let response = match client.lock(url, owner, LOCK_TIMEOUT).await {
            Ok(response) => response,
            Err(err) => {
                self.state = LockState::Unlocked;
                return Err(err.into());
            }
        };
        match (response.status, response.token) {
            (StatusCode::OK, Some(token)) => {
                self.token = token;
                self.state = LockState::Locked;
            }
            _ => self.state = LockState::Unlocked,
        }
        Ok(response.status)
    }

    /// True when the resource's lockdiscovery carries an active lock.
    pub async fn is_locked(client: &WebDavClient, url: &str) -> Result<bool, DslError> {
        let response = client.propfind(url, Depth::Zero).await?;
        let Ok(status) = response.multi_status() else {
            return Ok(false);
        };
        Ok(status.responses.first().is_some_and(|entry| entry.is_locked))
    }

    /// Re-checks a known token against the server, then sends UNLOCK with
    /// whatever token is left. The token is cleared only on `204`.
    pub async fn unlock(
        &mut self,
        client: &WebDavClient,
        url: &str,
    ) -> Result<StatusCode, DslError> {
        if !self.token.is_empty() && !Self::is_locked(client, url).await? {
            self.token.clear();
        }
        self.release(client, url).await
    }

    async fn release(&mut self, client: &WebDavClient, url: &str) -> Result<StatusCode, DslError> {
        let held = if self.token.is_empty() {
            LockState::Unlocked
        } else {
            LockState::Locked
        };
        self.state = LockState::UnlockPending;
        debug!(%url, "UNLOCK");
        let status = match client.unlock(url, &self.token).await {
            Ok(status) => status,
            Err(err) => {
                self.state = held;
                return Err(err.into());
            }
        };
        if status == StatusCode::NO_CONTENT {
            self.token.clear();
            self.state = LockState::Unlocked;
        } else {
            self.state = held;
        }
        Ok(status)
    }

    async fn release_quietly(&mut self, client: &WebDavClient, url: &str) {
        match self.release(client, url).await {
            Ok(StatusCode::NO_CONTENT) => {}
            Ok(status) => warn!(%url, %status, "lock release after failed upload was refused"),
            Err(err) => warn!(%url, error = %err, "lock release after failed upload failed"),
        }
    }

    /// Placeholder PUT, LOCK, locked PUT of `content`, UNLOCK.
    ///
    /// Returns the status of the last step. Once the lock is held a failing
    /// locked PUT still releases it before the fault is returned.
    pub async fn upload(
        &mut self,
        client: &WebDavClient,
        url: &str,
        owner: &str,
        content: Vec<u8>,
    ) -> Result<StatusCode, DslError> {
        debug!(%url, "PUT placeholder");
        let status = client.put(url, Vec::new()).await?;
        expect_status("PUT", status, StatusCode::CREATED, url)?;

        let status = self.lock(client, url, owner).await?;
        expect_status("LOCK", status, StatusCode::OK, url)?;
        if self.token.is_empty() {
            return Err(fault("LOCK", status, url));
        }

        debug!(%url, bytes = content.len(), "PUT locked");
        let status = match client.put_locked(url, content, &self.token).await {
            Ok(status) => status,
            Err(err) => {
                self.release_quietly(client, url).await;
                return Err(err.into());
            }
        };
        if status != StatusCode::NO_CONTENT {
            self.release_quietly(client, url).await;
            return Err(fault("PUT", status, url));
        }

        let status = self.release(client, url).await?;
        expect_status("UNLOCK", status, StatusCode::NO_CONTENT, url)?;
        Ok(status)
    }
}

fn fault(step: &'static str, status: StatusCode, url: &str) -> DslError {
    DslError::ProtocolFault {
        step,
        status,
        target: url.to_string(),
    }
}

fn expect_status(
    step: &'static str,
    actual: StatusCode,
    expected: StatusCode,
    url: &str,
) -> Result<(), DslError> {
    if actual == expected {
        Ok(())
    } else {
        Err(fault(step, actual, url))
    }
}
