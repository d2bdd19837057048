use std::io;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use webdav_core::WebDavError;

#[derive(Debug, Error)]
pub enum DslError {
    #[error("{0} is not initialized")]
    InvalidArgument(String),
    #[error("content already exists: {0}")]
    AlreadyExists(String),
    #[error("content not found: {0}")]
    NotFound(String),
    #[error("{expected}: {detail}")]
    StepFailed { expected: String, detail: String },
    #[error("WebDAV {step} method failed for {target} with code {status}")]
    ProtocolFault {
        step: &'static str,
        status: StatusCode,
        target: String,
    },
    #[error("response status is {status} but header {header} is missing")]
    MissingHeader { header: String, status: StatusCode },
    #[error("{0} cannot be executed on a mapped drive")]
    UnsupportedOnMappedDrive(&'static str),
    #[error("network drive is not configured for this operating system: {0}")]
    UnsupportedPlatform(&'static str),
    #[error("`{command}` failed: {detail}")]
    MountFailed { command: String, detail: String },
    #[error("assertion failed: {0}")]
    Assertion(String),
    #[error("{path} still present after {waited:?}")]
    Timeout { path: String, waited: Duration },
    #[error("invalid server url: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Transport(#[from] WebDavError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl DslError {
    /// True for replies that a PROPFIND caller treats as "resource missing".
    pub fn is_protocol_fault(&self) -> bool {
        matches!(
            self,
            DslError::Transport(
                WebDavError::NotMultiStatus { .. }
                    | WebDavError::MissingMultiStatus
                    | WebDavError::Xml(_)
            )
        )
    }
}
