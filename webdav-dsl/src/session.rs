use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::StatusCode;
use tracing::info;
use webdav_core::{Credentials, WebDavClient, WebDavError};

use crate::backend::{ContentBackend, Mode, Outcome};
use crate::config::DslConfig;
use crate::drive::{DriveBackend, MappedDrive};
use crate::error::DslError;
use crate::lock::{LockCoordinator, LockState};
use crate::model::{ResourceRef, Scope};
use crate::paths::{escape_for_transport, name_of, parent_of, require_initialized, resolve};
use crate::repository::{ContentService, PollingContentService};
use crate::state::ResourceState;
use crate::transport::TransportBackend;
use crate::verify::Verify;

pub const STEP_PREFIX: &str = "WebDav:";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_DISPOSITION: &str = "Content-Disposition";

const NAVIGATION_EXPECTED: &str = "Navigating to site should complete successfully";
const SITE_NOT_FOUND: &str = "Site was not found";

/// One authenticated user driving a WebDAV server, either over HTTP or
/// through a mapped drive.
///
/// Steps return `&mut Self` and chain:
///
/// ```no_run
/// # async fn demo(session: &mut webdav_dsl::Session) -> Result<(), webdav_dsl::DslError> {
/// use webdav_dsl::ResourceRef;
///
/// let mut folder = ResourceRef::folder("Reports");
/// session
///     .using_site("marketing")
///     .await?
///     .create_folder(&mut folder)
///     .await?
///     .assert_that()
///     .exists_in_webdav()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Session {
    config: DslConfig,
    user: Credentials,
    client: WebDavClient,
    backend: Box<dyn ContentBackend>,
    content_service: Arc<dyn ContentService>,
    drive: Option<MappedDrive>,
    state: ResourceState,
    lock: LockCoordinator,
    status: Option<StatusCode>,
    overwrite: bool,
    last_content: Option<ResourceRef>,
}

impl Session {
    pub fn authenticate(config: DslConfig, user: Credentials) -> Result<Self, DslError> {
        info!("{STEP_PREFIX} Authenticate user '{}'", user.username);
        let client = WebDavClient::with_credentials(user.clone())?;
        let backend = TransportBackend::new(client.clone(), &config);
        let state = ResourceState::new(backend.prefix());
        let content_service = Arc::new(PollingContentService::new(&config));
        Ok(Self {
            config,
            user,
            client,
            backend: Box::new(backend),
            content_service,
            drive: None,
            state,
            lock: LockCoordinator::new(),
            status: None,
            overwrite: false,
            last_content: None,
        })
    }

    pub fn with_content_service(mut self, service: Arc<dyn ContentService>) -> Self {
        self.content_service = service;
        self
    }

    /// Drive used by [`Session::using_network_drive`].
    pub fn with_network_drive(mut self, drive: MappedDrive) -> Self {
        self.drive = Some(drive);
        self
    }

    /// Drops pooled connections and starts over at the protocol root.
    pub fn disconnect(&mut self) -> Result<&mut Self, DslError> {
        info!("{STEP_PREFIX} Disconnect user '{}'", self.user.username);
        self.client = WebDavClient::with_credentials(self.user.clone())?;
        if self.backend.mode() == Mode::Transport {
            self.backend = Box::new(TransportBackend::new(self.client.clone(), &self.config));
        }
        self.state = ResourceState::new(self.backend.prefix());
        self.status = None;
        Ok(self)
    }

    pub fn config(&self) -> &DslConfig {
        &self.config
    }

    pub fn user(&self) -> &Credentials {
        &self.user
    }

    pub fn client(&self) -> &WebDavClient {
        &self.client
    }

    pub fn mode(&self) -> Mode {
        self.backend.mode()
    }

    pub fn prefix(&self) -> &str {
        self.state.prefix()
    }

    pub fn current_space(&self) -> &str {
        self.state.current_space()
    }

    pub fn last_resource(&self) -> &str {
        self.state.last_resource()
    }

    pub fn last_resource_without_prefix(&self) -> String {
        self.state.last_resource_without_prefix()
    }

    /// Status of the last HTTP exchange, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn lock_token(&self) -> &str {
        self.lock.token()
    }

    pub fn lock_state(&self) -> LockState {
        self.lock.state()
    }

    pub fn last_content(&self) -> Option<&ResourceRef> {
        self.last_content.as_ref()
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn root_path(&self) -> String {
        self.state.prefix().to_string()
    }

    pub fn sites_path(&self) -> String {
        resolve(self.state.prefix(), &["Sites"])
    }

    pub fn site_document_library_path(&self, site_id: &str) -> String {
        resolve(self.state.prefix(), &["Sites", site_id, "documentLibrary"])
    }

    pub fn user_homes_path(&self) -> String {
        resolve(self.state.prefix(), &["User Homes"])
    }

    pub fn user_home_path(&self, username: &str) -> String {
        resolve(self.state.prefix(), &["User Homes", username])
    }

    pub fn data_dictionary_path(&self) -> String {
        resolve(self.state.prefix(), &["Data Dictionary"])
    }

    fn record(&mut self, outcome: Outcome) {
        if let Some(status) = outcome.status {
            self.status = Some(status);
        }
    }

    fn transport_only(&self, operation: &'static str) -> Result<(), DslError> {
        match self.backend.mode() {
            Mode::Transport => Ok(()),
            Mode::MappedDrive => Err(DslError::UnsupportedOnMappedDrive(operation)),
        }
    }

    fn last_resource_url(&self, what: &str) -> Result<String, DslError> {
        require_initialized(self.state.last_resource(), what).map(escape_for_transport)
    }

    pub async fn using_site(&mut self, site_id: &str) -> Result<&mut Self, DslError> {
        info!("{STEP_PREFIX} Navigate to site '{site_id}/documentLibrary/'");
        require_initialized(site_id, "SiteID")?;
        let path = self.site_document_library_path(site_id);
        match self.backend.probe_space(&path).await {
            Ok(outcome) => {
                self.record(outcome);
                self.state.set_current_space(path);
                Ok(self)
            }
            Err(err) => {
                if let DslError::Transport(WebDavError::NotMultiStatus { status }) = &err {
                    self.status = Some(*status);
                }
                let detail = if err.is_protocol_fault() {
                    SITE_NOT_FOUND.to_string()
                } else {
                    err.to_string()
                };
                Err(DslError::StepFailed {
                    expected: NAVIGATION_EXPECTED.to_string(),
                    detail,
                })
            }
        }
    }

    pub fn using_user_home(&mut self, username: &str) -> Result<&mut Self, DslError> {
        info!("{STEP_PREFIX} Navigate to 'User Homes/{username}/'");
        require_initialized(username, "username")?;
        let path = self.user_home_path(username);
        self.state.set_current_space(path);
        Ok(self)
    }

    pub fn using_own_user_home(&mut self) -> Result<&mut Self, DslError> {
        let username = self.user.username.clone();
        self.using_user_home(&username)
    }

    pub fn using_root(&mut self) -> &mut Self {
        info!("{STEP_PREFIX} Navigate to root ./");
        let root = self.root_path();
        self.state.set_current_space(root);
        self
    }

    /// Enters `resource`: by its repository location when it has one,
    /// otherwise as a child of the current space.
    pub fn using_resource(&mut self, resource: &ResourceRef) -> Result<&mut Self, DslError> {
        info!("{STEP_PREFIX} Navigate to '{}'", resource.name);
        require_initialized(&resource.name, "contentName")?;
        let space = match resource.repository_location.as_deref() {
            Some(location) if location != resource.name => {
                let location = require_initialized(location, "repository location")?;
                resolve(self.state.prefix(), &[location])
            }
            _ => resolve(self.state.current_space(), &[resource.name.as_str()]),
        };
        self.state.set_current_space(space.clone());
        self.state.set_last_resource(space);
        self.last_content = Some(resource.clone());
        Ok(self)
    }

    /// Switches every later call to the mapped drive, mounting it first if
    /// needed.
    pub async fn using_network_drive(&mut self) -> Result<&mut Self, DslError> {
        info!("{STEP_PREFIX} map a drive");
        let drive = self
            .drive
            .clone()
            .ok_or_else(|| DslError::InvalidArgument("network drive".to_string()))?;
        if !drive.is_mounted().await {
            drive.mount().await?;
        }
        self.state = ResourceState::new(drive.local_volume());
        self.backend = Box::new(DriveBackend::new(drive));
        Ok(self)
    }

    pub async fn unmount_network_drive(&mut self) -> Result<&mut Self, DslError> {
        info!("{STEP_PREFIX} unmount drive");
        if let Some(drive) = &self.drive {
            if drive.is_mounted().await {
                drive.unmount().await?;
            }
        }
        Ok(self)
    }

    async fn register_created(
        &mut self,
        resource: &mut ResourceRef,
        target: &str,
    ) -> Result<(), DslError> {
        let repository_location = self.state.without_prefix(target);
        resource.node_ref = self
            .content_service
            .node_ref_by_path(&self.user, &repository_location)
            .await?;
        resource.repository_location = Some(repository_location);
        Ok(())
    }

    pub async fn create_folder(&mut self, folder: &mut ResourceRef) -> Result<&mut Self, DslError> {
        info!("{STEP_PREFIX} Create folder '{}'", folder.name);
        require_initialized(&folder.name, "new folder")?;
        let target = resolve(self.state.current_space(), &[folder.name.as_str()]);
        folder.protocol_location = Some(target.clone());
        let outcome = self.backend.create_folder(&target).await?;
        self.record(outcome);
        self.state.set_last_resource(target.clone());
        if outcome.applied {
            self.register_created(folder, &target).await?;
        }
        self.last_content = Some(folder.clone());
        Ok(self)
    }

    pub async fn create_file(&mut self, file: &mut ResourceRef) -> Result<&mut Self, DslError> {
        info!("{STEP_PREFIX} Create file '{}'", file.name);
        require_initialized(&file.name, "create file")?;
        let target = resolve(self.state.current_space(), &[file.name.as_str()]);
        file.protocol_location = Some(target.clone());
        let outcome = self
            .backend
            .create_file(&target, file.content.as_bytes())
            .await?;
        self.record(outcome);
        self.state.set_last_resource(target.clone());
        if outcome.applied {
            self.register_created(file, &target).await?;
        }
        self.last_content = Some(file.clone());
        Ok(self)
    }

    /// Renames the last resource in place, keeping its parent.
    pub async fn rename(&mut self, new_name: &str) -> Result<&mut Self, DslError> {
        require_initialized(new_name, "new name")?;
        let source_relative = self.state.last_resource_without_prefix();
        require_initialized(&source_relative, "renamed resource")?;
        info!(
            "{STEP_PREFIX} rename '{}' to '{new_name}'",
            name_of(&source_relative)
        );
        let new_relative = resolve(parent_of(&source_relative), &[new_name]);
        let source = resolve(self.state.prefix(), &[source_relative.as_str()]);
        let destination = resolve(self.state.prefix(), &[new_relative.as_str()]);

        let outcome = self.backend.rename(&source, &destination).await?;
        self.record(outcome);
        self.state.set_last_resource(destination.clone());
        if let Some(content) = self.last_content.as_mut() {
            content.repository_location = Some(new_relative);
            content.protocol_location = Some(destination);
        }
        Ok(self)
    }

    pub async fn update(&mut self, content: &str) -> Result<&mut Self, DslError> {
        let target = require_initialized(self.state.last_resource(), "updating resource")?.to_string();
        info!("{STEP_PREFIX} Update file '{target}' with '{content}'");
        let outcome = self.backend.update(&target, content.as_bytes()).await?;
        self.record(outcome);
        Ok(self)
    }

    /// Deletes the last resource and, once the backend reports it gone,
    /// waits for the repository to catch up.
    pub async fn delete(&mut self) -> Result<&mut Self, DslError> {
        let target = require_initialized(self.state.last_resource(), "delete folder")?.to_string();
        info!("{STEP_PREFIX} Delete '{target}'");
        let outcome = self.backend.delete(&target).await?;
        self.record(outcome);
        if outcome.applied {
            let repository_location = self.state.last_resource_without_prefix();
            self.content_service
                .wait_until_deleted(&self.user, &repository_location)
                .await?;
        }
        Ok(self)
    }

    pub async fn copy_to(&mut self, destination: &ResourceRef) -> Result<&mut Self, DslError> {
        self.copy_or_move(destination, true).await
    }

    pub async fn move_to(&mut self, destination: &ResourceRef) -> Result<&mut Self, DslError> {
        self.copy_or_move(destination, false).await
    }

    async fn copy_or_move(
        &mut self,
        destination: &ResourceRef,
        is_copy: bool,
    ) -> Result<&mut Self, DslError> {
        let source = require_initialized(self.state.last_resource(), "source")?.to_string();
        let location = destination
            .repository_location
            .as_deref()
            .ok_or_else(|| DslError::InvalidArgument("destination".to_string()))?;
        let location = require_initialized(location, "destination")?;
        let destination_path = resolve(self.state.prefix(), &[location]);
        let source_name = name_of(&source).to_string();
        let target = resolve(&destination_path, &[source_name.as_str()]);

        let outcome = if is_copy {
            info!("{STEP_PREFIX} Copy '{source_name}' to '{destination_path}'");
            self.backend.copy(&source, &target, self.overwrite).await?
        } else {
            info!("{STEP_PREFIX} Move '{source_name}' to '{destination_path}'");
            self.backend.move_to(&source, &target, self.overwrite).await?
        };
        self.record(outcome);
        self.state.set_last_resource(target);
        Ok(self)
    }

    pub fn overwrite_if_exists(&mut self) -> &mut Self {
        self.overwrite = true;
        self
    }

    pub fn do_not_overwrite_if_exists(&mut self) -> &mut Self {
        self.overwrite = false;
        self
    }

    /// Uploads `local_file` into the last resource under a write lock.
    pub async fn upload_file(&mut self, local_file: &Path) -> Result<&mut Self, DslError> {
        self.transport_only("upload")?;
        let base = require_initialized(self.state.last_resource(), "uploading resource")?.to_string();
        info!(
            "{STEP_PREFIX} Upload file '{}' to '{base}'",
            local_file.display()
        );
        let file_name = local_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| DslError::InvalidArgument("upload file name".to_string()))?;
        let content = tokio::fs::read(local_file).await?;

        let target = resolve(&base, &[file_name.as_str()]);
        self.state.set_last_resource(target.clone());
        let url = escape_for_transport(&target);
        match self
            .lock
            .upload(&self.client, &url, &self.user.username, content)
            .await
        {
            Ok(status) => {
                self.status = Some(status);
                Ok(self)
            }
            Err(err) => {
                if let DslError::ProtocolFault { status, .. } = &err {
                    self.status = Some(*status);
                }
                Err(err)
            }
        }
    }

    /// Where [`Session::download`] writes the last resource.
    pub fn download_path(&self) -> PathBuf {
        self.config
            .download_dir
            .join(name_of(self.state.last_resource()))
    }

    pub async fn download(&mut self) -> Result<&mut Self, DslError> {
        let target = require_initialized(self.state.last_resource(), "downloaded resource")?.to_string();
        info!("{STEP_PREFIX} Download '{target}'");
        let body = match self.backend.mode() {
            Mode::Transport => {
                let response = self.client.get(&escape_for_transport(&target)).await?;
                self.status = Some(response.status);
                response.body
            }
            Mode::MappedDrive => self.backend.read(&target).await?,
        };
        tokio::fs::create_dir_all(&self.config.download_dir).await?;
        tokio::fs::write(self.download_path(), body).await?;
        Ok(self)
    }

    /// Value of `header` on a GET of the last resource.
    pub async fn response_header_value(&mut self, header: &str) -> Result<String, DslError> {
        self.transport_only("response headers")?;
        let url = self.last_resource_url("resource")?;
        let response = self.client.get(&url).await?;
        self.status = Some(response.status);
        if !response.status.is_success() {
            return Err(DslError::ProtocolFault {
                step: "GET",
                status: response.status,
                target: url,
            });
        }
        response
            .header(header)
            .map(str::to_string)
            .ok_or_else(|| DslError::MissingHeader {
                header: header.to_string(),
                status: response.status,
            })
    }

    pub async fn lock(&mut self) -> Result<&mut Self, DslError> {
        self.transport_only("lock")?;
        let url = self.last_resource_url("locked resource")?;
        info!("{STEP_PREFIX} Lock file: {url}");
        let status = self
            .lock
            .lock(&self.client, &url, &self.user.username)
            .await?;
        self.status = Some(status);
        Ok(self)
    }

    pub async fn unlock(&mut self) -> Result<&mut Self, DslError> {
        self.transport_only("unlock")?;
        let url = self.last_resource_url("unlocked resource")?;
        info!("{STEP_PREFIX} Unlock file: {url}");
        let status = self.lock.unlock(&self.client, &url).await?;
        self.status = Some(status);
        Ok(self)
    }

    pub async fn is_locked(&self) -> Result<bool, DslError> {
        self.transport_only("lock discovery")?;
        let url = self.last_resource_url("resource")?;
        LockCoordinator::is_locked(&self.client, &url).await
    }

    /// Body of the last resource as text.
    pub async fn content(&self) -> Result<String, DslError> {
        let target = require_initialized(self.state.last_resource(), "resource")?;
        let bytes = self.backend.read(target).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Whether the last resource is present. Over HTTP the GET status is
    /// recorded.
    pub async fn content_exists(&mut self) -> Result<bool, DslError> {
        let target = require_initialized(self.state.last_resource(), "resource")?;
        let outcome = self.backend.exists(target).await?;
        self.record(outcome);
        Ok(outcome.applied)
    }

    pub async fn get_files(&mut self) -> Result<Vec<ResourceRef>, DslError> {
        info!("{STEP_PREFIX} Get files from '{}'", self.state.current_space());
        self.backend
            .list(self.state.current_space(), Scope::Files)
            .await
    }

    pub async fn get_folders(&mut self) -> Result<Vec<ResourceRef>, DslError> {
        info!("{STEP_PREFIX} Get folders from '{}'", self.state.current_space());
        self.backend
            .list(self.state.current_space(), Scope::Folders)
            .await
    }

    pub async fn get_children(&mut self) -> Result<Vec<ResourceRef>, DslError> {
        info!("{STEP_PREFIX} Get children from '{}'", self.state.current_space());
        self.backend
            .list(self.state.current_space(), Scope::All)
            .await
    }

    pub fn assert_that(&mut self) -> Verify<'_> {
        Verify::new(self)
    }
}
