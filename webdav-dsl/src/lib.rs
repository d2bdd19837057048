mod backend;
mod backoff;
mod config;
mod drive;
mod error;
mod listing;
mod lock;
mod model;
mod paths;
mod repository;
mod session;
mod state;
mod transport;
mod verify;

pub use backend::{ContentBackend, Mode, Outcome};
pub use backoff::Backoff;
pub use config::DslConfig;
pub use drive::{DriveBackend, DriveMounter, MappedDrive};
pub use error::DslError;
pub use listing::contains_named;
pub use lock::{LOCK_TIMEOUT, LockCoordinator, LockState};
pub use model::{ContentKind, ResourceRef, Scope};
pub use paths::{escape_for_transport, name_of, parent_of, require_initialized, resolve};
pub use repository::{ContentService, PollingContentService};
pub use session::{CONTENT_DISPOSITION, CONTENT_TYPE, STEP_PREFIX, Session};
pub use state::ResourceState;
pub use transport::TransportBackend;
pub use verify::Verify;
pub use webdav_core::Credentials;
