use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::DslError;
use crate::model::{ResourceRef, Scope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Transport,
    MappedDrive,
}

/// Result of one content operation.
///
/// `applied` is whether the backend considers the change made on the
/// repository: a `201` for creates, a confirmed-gone resource for deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub status: Option<StatusCode>,
    pub applied: bool,
}

impl Outcome {
    pub fn local() -> Self {
        Self {
            status: None,
            applied: true,
        }
    }

    pub fn remote(status: StatusCode, applied: bool) -> Self {
        Self {
            status: Some(status),
            applied,
        }
    }

    pub fn skipped() -> Self {
        Self {
            status: None,
            applied: false,
        }
    }
}

/// Content operations shared by the HTTP and mapped-drive modes.
///
/// Every path argument is absolute and starts with [`ContentBackend::prefix`].
#[async_trait]
pub trait ContentBackend: Send + Sync {
    fn mode(&self) -> Mode;

    fn prefix(&self) -> &str;

    /// Confirms a navigation target can be listed.
    async fn probe_space(&self, path: &str) -> Result<Outcome, DslError>;

    /// `applied` is whether `path` is present.
    async fn exists(&self, path: &str) -> Result<Outcome, DslError>;

    async fn create_folder(&self, path: &str) -> Result<Outcome, DslError>;

    async fn create_file(&self, path: &str, content: &[u8]) -> Result<Outcome, DslError>;

    async fn rename(&self, source: &str, destination: &str) -> Result<Outcome, DslError>;

    async fn update(&self, path: &str, content: &[u8]) -> Result<Outcome, DslError>;

    async fn delete(&self, path: &str) -> Result<Outcome, DslError>;

    async fn copy(
        &self,
        source: &str,
        destination: &str,
        overwrite: bool,
    ) -> Result<Outcome, DslError>;

    async fn move_to(
        &self,
        source: &str,
        destination: &str,
        overwrite: bool,
    ) -> Result<Outcome, DslError>;

    async fn list(&self, space: &str, scope: Scope) -> Result<Vec<ResourceRef>, DslError>;

    async fn read(&self, path: &str) -> Result<Vec<u8>, DslError>;
}
