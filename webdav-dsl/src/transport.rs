use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;
use webdav_core::{Depth, WebDavClient};

use crate::backend::{ContentBackend, Mode, Outcome};
use crate::config::DslConfig;
use crate::error::DslError;
use crate::listing::children_from_multistatus;
use crate::model::{ResourceRef, Scope};
use crate::paths::escape_for_transport;

/// Issues WebDAV methods against `scheme://host:port/<context>`.
pub struct TransportBackend {
    client: WebDavClient,
    prefix: String,
    server_url: String,
    context_prefix: String,
}

impl TransportBackend {
    pub fn new(client: WebDavClient, config: &DslConfig) -> Self {
        Self {
            client,
            prefix: config.prefix_space(),
            server_url: config.full_server_url(),
            context_prefix: config.context_prefix(),
        }
    }

    async fn transfer(
        &self,
        verb: &'static str,
        source: &str,
        destination: &str,
        overwrite: bool,
    ) -> Result<Outcome, DslError> {
        let from = escape_for_transport(source);
        let to = escape_for_transport(destination);
        debug!(%from, %to, overwrite, "{verb}");
        let status = if verb == "COPY" {
            self.client.copy_resource(&from, &to, overwrite).await?
        } else {
            self.client.move_resource(&from, &to, overwrite).await?
        };
        Ok(Outcome::remote(status, status.is_success()))
    }
}

#[async_trait]
impl ContentBackend for TransportBackend {
    fn mode(&self) -> Mode {
        Mode::Transport
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }

    async fn probe_space(&self, path: &str) -> Result<Outcome, DslError> {
        let url = escape_for_transport(path);
        debug!(%url, "PROPFIND depth 1");
        let response = self.client.propfind(&url, Depth::One).await?;
        response.multi_status()?;
        Ok(Outcome::remote(response.status, true))
    }

    async fn exists(&self, path: &str) -> Result<Outcome, DslError> {
        let status = self.client.get_status(&escape_for_transport(path)).await?;
        Ok(Outcome::remote(status, status == StatusCode::OK))
    }

    async fn create_folder(&self, path: &str) -> Result<Outcome, DslError> {
        let url = escape_for_transport(path);
        debug!(%url, "MKCOL");
        let status = self.client.mkcol(&url).await?;
        Ok(Outcome::remote(status, status == StatusCode::CREATED))
    }

    async fn create_file(&self, path: &str, content: &[u8]) -> Result<Outcome, DslError> {
        let url = escape_for_transport(path);
        debug!(%url, bytes = content.len(), "PUT");
        let status = self.client.put(&url, content.to_vec()).await?;
        Ok(Outcome::remote(status, status == StatusCode::CREATED))
    }

    async fn rename(&self, source: &str, destination: &str) -> Result<Outcome, DslError> {
        self.transfer("MOVE", source, destination, false).await
    }

    async fn update(&self, path: &str, content: &[u8]) -> Result<Outcome, DslError> {
        if !self.exists(path).await?.applied {
            return Ok(Outcome::skipped());
        }
        let url = escape_for_transport(path);
        debug!(%url, bytes = content.len(), "PUT (update)");
        let status = self.client.put(&url, content.to_vec()).await?;
        // Any reply counts as applied; update has never checked the status.
        Ok(Outcome::remote(status, true))
    }

    async fn delete(&self, path: &str) -> Result<Outcome, DslError> {
        let url = escape_for_transport(path);
        debug!(%url, "DELETE");
        let status = self.client.delete(&url).await?;
        let probe = self.client.propfind(&url, Depth::One).await?;
        let gone = probe.multi_status().is_err();
        Ok(Outcome::remote(status, gone && status.is_success()))
    }

    async fn copy(
        &self,
        source: &str,
        destination: &str,
        overwrite: bool,
    ) -> Result<Outcome, DslError> {
        self.transfer("COPY", source, destination, overwrite).await
    }

    async fn move_to(
        &self,
        source: &str,
        destination: &str,
        overwrite: bool,
    ) -> Result<Outcome, DslError> {
        self.transfer("MOVE", source, destination, overwrite).await
    }

    async fn list(&self, space: &str, scope: Scope) -> Result<Vec<ResourceRef>, DslError> {
        let url = escape_for_transport(space);
        debug!(%url, ?scope, "PROPFIND depth 1");
        let status = self.client.propfind(&url, Depth::One).await?.multi_status()?;
        let relative_space = space.strip_prefix(self.server_url.as_str()).unwrap_or(space);
        Ok(children_from_multistatus(
            &status,
            relative_space,
            &self.context_prefix,
            &self.prefix,
            scope,
        ))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, DslError> {
        let url = escape_for_transport(path);
        let response = self.client.get(&url).await?;
        if !response.status.is_success() {
            return Err(DslError::ProtocolFault {
                step: "GET",
                status: response.status,
                target: url,
            });
        }
        Ok(response.body)
    }
}
