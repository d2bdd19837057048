use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use url::Url;

use crate::error::DslError;

const DEFAULT_SCHEME: &str = "http";
const DEFAULT_SERVER: &str = "localhost";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CONTEXT: &str = "alfresco/webdav";
const DEFAULT_DRIVE: &str = "M:";
const DEFAULT_DOWNLOAD_DIR: &str = "target";
const DEFAULT_DELETE_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct DslConfig {
    pub scheme: String,
    pub server: String,
    pub port: u16,
    pub context_path: String,
    pub drive_letter: String,
    pub download_dir: PathBuf,
    pub delete_timeout: Duration,
}

impl DslConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let scheme = std::env::var("WEBDAV_SCHEME").unwrap_or_else(|_| DEFAULT_SCHEME.to_string());
        let server = std::env::var("WEBDAV_SERVER").unwrap_or_else(|_| DEFAULT_SERVER.to_string());
        let port = match std::env::var("WEBDAV_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("WEBDAV_PORT is not a valid port: {value}"))?,
            Err(_) => DEFAULT_PORT,
        };
        let context_path =
            std::env::var("WEBDAV_CONTEXT").unwrap_or_else(|_| DEFAULT_CONTEXT.to_string());
        let drive_letter =
            std::env::var("WEBDAV_DRIVE").unwrap_or_else(|_| DEFAULT_DRIVE.to_string());
        let download_dir = std::env::var("WEBDAV_DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_download_dir());
        let delete_timeout = Duration::from_secs(read_u64_env(
            "WEBDAV_DELETE_TIMEOUT_SECS",
            DEFAULT_DELETE_TIMEOUT_SECS,
        ));

        Ok(Self {
            scheme,
            server,
            port,
            context_path: context_path.trim_matches('/').to_string(),
            drive_letter,
            download_dir,
            delete_timeout,
        })
    }

    /// Builds a config for `scheme://host:port`, keeping every other default.
    pub fn for_server_url(server_url: &str) -> Result<Self, DslError> {
        let url = Url::parse(server_url)?;
        let server = url
            .host_str()
            .ok_or(url::ParseError::EmptyHost)?
            .to_string();
        let port = url.port_or_known_default().unwrap_or(DEFAULT_PORT);
        Ok(Self {
            scheme: url.scheme().to_string(),
            server,
            port,
            context_path: DEFAULT_CONTEXT.to_string(),
            drive_letter: DEFAULT_DRIVE.to_string(),
            download_dir: default_download_dir(),
            delete_timeout: Duration::from_secs(DEFAULT_DELETE_TIMEOUT_SECS),
        })
    }

    pub fn full_server_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.server, self.port)
    }

    /// Absolute URL every transport path starts with.
    pub fn prefix_space(&self) -> String {
        format!("{}/{}", self.full_server_url(), self.context_path)
    }

    /// Server-relative form of the context, as it appears in PROPFIND hrefs.
    pub fn context_prefix(&self) -> String {
        format!("/{}", self.context_path)
    }

    pub fn server_network_path(&self) -> String {
        format!(
            "\\\\{}@{}\\{}",
            self.server,
            self.port,
            self.context_path.replace('/', "\\")
        )
    }
}

fn default_download_dir() -> PathBuf {
    std::env::current_dir()
        .map(|dir| dir.join(DEFAULT_DOWNLOAD_DIR))
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DOWNLOAD_DIR))
}

fn read_u64_env(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}
