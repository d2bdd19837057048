use reqwest::StatusCode;
use tracing::info;

use crate::error::DslError;
use crate::listing::contains_named;
use crate::model::ResourceRef;
use crate::paths::name_of;
use crate::session::{STEP_PREFIX, Session};

/// Checks against the session's current space or last resource.
///
/// Each check consumes the view and hands the session back, so a test can
/// keep chaining steps after it.
pub struct Verify<'a> {
    session: &'a mut Session,
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<(), DslError> {
    if condition {
        Ok(())
    } else {
        Err(DslError::Assertion(message()))
    }
}

impl<'a> Verify<'a> {
    pub(crate) fn new(session: &'a mut Session) -> Self {
        Self { session }
    }

    fn last_name(&self) -> String {
        name_of(self.session.last_resource()).to_string()
    }

    fn ensure_listed(
        &self,
        kind: &str,
        expected: &[ResourceRef],
        listed: &[ResourceRef],
    ) -> Result<(), DslError> {
        let space = self.session.current_space();
        for resource in expected {
            info!(
                "{STEP_PREFIX} Verify that {kind} {} is in {space}",
                resource.name
            );
            ensure(contains_named(listed, resource), || {
                format!("{kind} {} is not in {space}", resource.name)
            })?;
        }
        Ok(())
    }

    pub async fn has_folders(self, folders: &[ResourceRef]) -> Result<&'a mut Session, DslError> {
        let listed = self.session.get_folders().await?;
        self.ensure_listed("folder", folders, &listed)?;
        Ok(self.session)
    }

    pub async fn has_files(self, files: &[ResourceRef]) -> Result<&'a mut Session, DslError> {
        let listed = self.session.get_files().await?;
        self.ensure_listed("file", files, &listed)?;
        Ok(self.session)
    }

    pub async fn has_children(
        self,
        children: &[ResourceRef],
    ) -> Result<&'a mut Session, DslError> {
        let listed = self.session.get_children().await?;
        self.ensure_listed("content", children, &listed)?;
        Ok(self.session)
    }

    pub fn has_status(self, expected: StatusCode) -> Result<&'a mut Session, DslError> {
        info!("{STEP_PREFIX} Verify status is {expected}");
        let actual = self.session.status();
        ensure(actual == Some(expected), || {
            format!("expected status {expected}, got {actual:?}")
        })?;
        Ok(self.session)
    }

    pub async fn content_is(self, expected: &str) -> Result<&'a mut Session, DslError> {
        info!("{STEP_PREFIX} Verify that content '{expected}' is the expected one");
        let actual = self.session.content().await?;
        ensure(actual == expected, || {
            format!("file content is '{actual}', expected '{expected}'")
        })?;
        Ok(self.session)
    }

    pub async fn exists_in_webdav(self) -> Result<&'a mut Session, DslError> {
        let name = self.last_name();
        info!("{STEP_PREFIX} Verify that content '{name}' exists in webdav");
        let exists = self.session.content_exists().await?;
        ensure(exists, || format!("content {name} does not exist in webdav"))?;
        Ok(self.session)
    }

    pub async fn does_not_exist_in_webdav(self) -> Result<&'a mut Session, DslError> {
        let name = self.last_name();
        info!("{STEP_PREFIX} Verify that content '{name}' does not exist in webdav");
        let exists = self.session.content_exists().await?;
        ensure(!exists, || format!("content {name} still exists in webdav"))?;
        Ok(self.session)
    }

    pub async fn is_downloaded(self) -> Result<&'a mut Session, DslError> {
        let name = self.last_name();
        info!("{STEP_PREFIX} Verify that {name} is downloaded");
        let path = self.session.download_path();
        let present = tokio::fs::try_exists(&path).await?;
        ensure(present, || format!("{} was not downloaded", path.display()))?;
        Ok(self.session)
    }

    pub async fn is_locked(self) -> Result<&'a mut Session, DslError> {
        let name = self.last_name();
        info!("{STEP_PREFIX} Verify that '{name}' is locked");
        let locked = self.session.is_locked().await?;
        ensure(locked, || format!("content {name} is not locked"))?;
        Ok(self.session)
    }

    pub async fn is_unlocked(self) -> Result<&'a mut Session, DslError> {
        let name = self.last_name();
        info!("{STEP_PREFIX} Verify that '{name}' is unlocked");
        let locked = self.session.is_locked().await?;
        ensure(!locked, || format!("content {name} is locked"))?;
        Ok(self.session)
    }

    /// Passes when the header value contains `expected`.
    pub async fn has_response_header_value(
        self,
        header: &str,
        expected: &str,
    ) -> Result<&'a mut Session, DslError> {
        info!("{STEP_PREFIX} Verify that the header value for '{header}' is correct");
        let actual = self.session.response_header_value(header).await?;
        ensure(actual.contains(expected), || {
            format!("header [{header}] is '{actual}', expected it to contain '{expected}'")
        })?;
        Ok(self.session)
    }
}
