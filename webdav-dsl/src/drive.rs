use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};
use walkdir::WalkDir;
use webdav_core::Credentials;

use crate::backend::{ContentBackend, Mode, Outcome};
use crate::config::DslConfig;
use crate::error::DslError;
use crate::listing::walk_children;
use crate::model::{ResourceRef, Scope};
use crate::paths::local_path_for;

#[derive(Debug, Clone)]
pub enum DriveMounter {
    /// `net use` against the server's WebDAV share (Windows only).
    NetUse { user: Credentials },
    /// The volume is mounted by something else, or is a plain directory.
    Preexisting,
}

/// A WebDAV share exposed as a local volume.
#[derive(Debug, Clone)]
pub struct MappedDrive {
    local_volume: String,
    server_network_path: String,
    mounter: DriveMounter,
}

impl MappedDrive {
    pub fn net_use(config: &DslConfig, user: Credentials) -> Self {
        Self {
            local_volume: config.drive_letter.clone(),
            server_network_path: config.server_network_path(),
            mounter: DriveMounter::NetUse { user },
        }
    }

    pub fn preexisting(local_volume: impl AsRef<Path>) -> Self {
        Self {
            local_volume: local_volume
                .as_ref()
                .to_string_lossy()
                .replace('\\', "/")
                .trim_end_matches('/')
                .to_string(),
            server_network_path: String::new(),
            mounter: DriveMounter::Preexisting,
        }
    }

    pub fn local_volume(&self) -> &str {
        &self.local_volume
    }

    pub fn server_network_path(&self) -> &str {
        &self.server_network_path
    }

    fn volume_root(&self) -> PathBuf {
        if self.local_volume.ends_with(':') {
            PathBuf::from(format!("{}\\", self.local_volume))
        } else {
            PathBuf::from(&self.local_volume)
        }
    }

    pub fn local_path(&self, repository_path: &str) -> Result<PathBuf, DslError> {
        local_path_for(&self.volume_root(), repository_path)
    }

    pub async fn is_mounted(&self) -> bool {
        tokio::fs::try_exists(self.volume_root())
            .await
            .unwrap_or(false)
    }

    pub async fn mount(&self) -> Result<(), DslError> {
        match &self.mounter {
            DriveMounter::NetUse { user } => {
                let user_arg = format!("/user:{}", user.username);
                info!(
                    volume = %self.local_volume,
                    share = %self.server_network_path,
                    "mounting network drive"
                );
                run_net_use(
                    &[
                        self.local_volume.as_str(),
                        self.server_network_path.as_str(),
                        user_arg.as_str(),
                        user.password.as_str(),
                        "/persistent:no",
                    ],
                    format!(
                        "net use {} {} {user_arg} ***",
                        self.local_volume, self.server_network_path
                    ),
                )
                .await
            }
            DriveMounter::Preexisting => {
                if self.is_mounted().await {
                    Ok(())
                } else {
                    Err(DslError::NotFound(self.local_volume.clone()))
                }
            }
        }
    }

    pub async fn unmount(&self) -> Result<(), DslError> {
        match &self.mounter {
            DriveMounter::NetUse { .. } => {
                info!(volume = %self.local_volume, "unmounting network drive");
                run_net_use(&["*", "/d", "/y"], "net use * /d /y".to_string()).await
            }
            DriveMounter::Preexisting => Ok(()),
        }
    }
}

async fn run_net_use(args: &[&str], display: String) -> Result<(), DslError> {
    if !cfg!(windows) {
        return Err(DslError::UnsupportedPlatform(std::env::consts::OS));
    }
    let output = Command::new("net").arg("use").args(args).output().await?;
    if output.status.success() {
        Ok(())
    } else {
        Err(DslError::MountFailed {
            command: display,
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Filesystem calls against a mapped drive.
pub struct DriveBackend {
    drive: MappedDrive,
}

impl DriveBackend {
    pub fn new(drive: MappedDrive) -> Self {
        Self { drive }
    }

    fn local(&self, path: &str) -> Result<PathBuf, DslError> {
        let relative = path
            .strip_prefix(self.drive.local_volume())
            .unwrap_or(path)
            .replace('\\', "/");
        self.drive.local_path(&relative)
    }

    async fn guard_destination(&self, target: &Path, overwrite: bool) -> Result<(), DslError> {
        if !tokio::fs::try_exists(target).await? {
            return Ok(());
        }
        if !overwrite {
            return Err(DslError::AlreadyExists(target.display().to_string()));
        }
        remove(target).await
    }
}

async fn remove(target: &Path) -> Result<(), DslError> {
    if tokio::fs::metadata(target).await?.is_dir() {
        tokio::fs::remove_dir_all(target).await?;
    } else {
        tokio::fs::remove_file(target).await?;
    }
    Ok(())
}

fn copy_tree(source: &Path, destination: &Path) -> Result<(), DslError> {
    for entry in WalkDir::new(source) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[async_trait]
impl ContentBackend for DriveBackend {
    fn mode(&self) -> Mode {
        Mode::MappedDrive
    }

    fn prefix(&self) -> &str {
        self.drive.local_volume()
    }

    async fn probe_space(&self, _path: &str) -> Result<Outcome, DslError> {
        Ok(Outcome::local())
    }

    async fn exists(&self, path: &str) -> Result<Outcome, DslError> {
        let present = tokio::fs::try_exists(self.local(path)?).await?;
        Ok(Outcome {
            status: None,
            applied: present,
        })
    }

    async fn create_folder(&self, path: &str) -> Result<Outcome, DslError> {
        let target = self.local(path)?;
        if tokio::fs::try_exists(&target).await? {
            return Err(DslError::AlreadyExists(path.to_string()));
        }
        debug!(target = %target.display(), "create_dir");
        tokio::fs::create_dir(&target).await?;
        Ok(Outcome::local())
    }

    async fn create_file(&self, path: &str, content: &[u8]) -> Result<Outcome, DslError> {
        let target = self.local(path)?;
        if tokio::fs::try_exists(&target).await? {
            return Err(DslError::AlreadyExists(path.to_string()));
        }
        debug!(target = %target.display(), bytes = content.len(), "write");
        tokio::fs::write(&target, content).await?;
        Ok(Outcome::local())
    }

    async fn rename(&self, source: &str, destination: &str) -> Result<Outcome, DslError> {
        let from = self.local(source)?;
        let to = self.local(destination)?;
        self.guard_destination(&to, false).await?;
        tokio::fs::rename(&from, &to).await?;
        Ok(Outcome::local())
    }

    async fn update(&self, path: &str, content: &[u8]) -> Result<Outcome, DslError> {
        let target = self.local(path)?;
        if !tokio::fs::try_exists(&target).await? {
            return Err(DslError::NotFound(path.to_string()));
        }
        tokio::fs::write(&target, content).await?;
        Ok(Outcome::local())
    }

    async fn delete(&self, path: &str) -> Result<Outcome, DslError> {
        let target = self.local(path)?;
        if !tokio::fs::try_exists(&target).await? {
            return Err(DslError::NotFound(path.to_string()));
        }
        remove(&target).await?;
        Ok(Outcome::local())
    }

    async fn copy(
        &self,
        source: &str,
        destination: &str,
        overwrite: bool,
    ) -> Result<Outcome, DslError> {
        let from = self.local(source)?;
        let to = self.local(destination)?;
        self.guard_destination(&to, overwrite).await?;
        if tokio::fs::metadata(&from).await?.is_dir() {
            tokio::task::spawn_blocking(move || copy_tree(&from, &to)).await??;
        } else {
            tokio::fs::copy(&from, &to).await?;
        }
        Ok(Outcome::local())
    }

    async fn move_to(
        &self,
        source: &str,
        destination: &str,
        overwrite: bool,
    ) -> Result<Outcome, DslError> {
        let from = self.local(source)?;
        let to = self.local(destination)?;
        self.guard_destination(&to, overwrite).await?;
        tokio::fs::rename(&from, &to).await?;
        Ok(Outcome::local())
    }

    async fn list(&self, space: &str, scope: Scope) -> Result<Vec<ResourceRef>, DslError> {
        let start = self.local(space)?;
        let root = self.drive.volume_root();
        let prefix = self.drive.local_volume().to_string();
        tokio::task::spawn_blocking(move || walk_children(&root, &start, &prefix, scope)).await?
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, DslError> {
        Ok(tokio::fs::read(self.local(path)?).await?)
    }
}
