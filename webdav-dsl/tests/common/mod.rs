use std::sync::Mutex;

use async_trait::async_trait;
use webdav_dsl::{ContentService, Credentials, DslError};

/// Hands out predictable node refs and records every deletion wait.
#[derive(Default)]
pub struct RecordingService {
    waits: Mutex<Vec<String>>,
}

impl RecordingService {
    pub fn waits(&self) -> Vec<String> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentService for RecordingService {
    async fn node_ref_by_path(
        &self,
        _user: &Credentials,
        repository_path: &str,
    ) -> Result<Option<String>, DslError> {
        Ok(Some(format!("workspace://SpacesStore{repository_path}")))
    }

    async fn wait_until_deleted(
        &self,
        _user: &Credentials,
        repository_path: &str,
    ) -> Result<(), DslError> {
        self.waits.lock().unwrap().push(repository_path.to_string());
        Ok(())
    }
}
