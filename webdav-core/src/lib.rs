mod client;
mod multistatus;

pub use client::{
    Credentials, Depth, GetResponse, LockResponse, PropfindResponse, WebDavClient, WebDavError,
};
pub use multistatus::{MultiStatus, MultiStatusEntry, parse_lock_token, parse_multistatus};
