//! Error types for mailstore
//!
//! [`Error`] is the underlying provider cause. The lifecycle errors
//! wrap it with the operation and target that failed, one enum per
//! kind of step so callers can branch on what went wrong.

use std::time::Duration;
use thiserror::Error;

/// Underlying failure raised by a protocol provider.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IMAP error: {0}")]
    Imap(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Not connected")]
    NotConnected,
}

impl From<async_imap::error::Error> for Error {
    fn from(e: async_imap::error::Error) -> Self {
        Self::Imap(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A store could not be acquired for a protocol.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("No provider for protocol '{protocol}'")]
    Unsupported { protocol: String },

    #[error("Invalid {protocol} configuration: {reason}")]
    Misconfigured { protocol: String, reason: String },
}

/// Connecting a store failed. The store stays disconnected.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Connection to {host} failed: {source}")]
    ConnectionFailed {
        host: String,
        #[source]
        source: Error,
    },

    #[error("Store is already connected")]
    AlreadyConnected,
}

/// A folder handle could not be resolved from its store.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Cannot resolve {path}: store is not connected")]
    NotConnected { path: String },

    #[error("Failed to resolve {path}: {source}")]
    Provider {
        path: String,
        #[source]
        source: Error,
    },
}

/// A folder operation failed. Recoverable per folder.
#[derive(Error, Debug)]
pub enum FolderError {
    #[error("Cannot open {path}: store is not connected")]
    StoreNotConnected { path: String },

    #[error("Folder {path} is already open")]
    AlreadyOpen { path: String },

    #[error("Folder {path} is not open")]
    NotOpen { path: String },

    #[error("Folder {path} is open read-only")]
    ReadOnly { path: String },

    #[error("Message UID {uid} does not belong to the current open of {path}")]
    StaleMessage { path: String, uid: u32 },

    #[error("Failed to check whether {path} exists: {source}")]
    ExistsFailed {
        path: String,
        #[source]
        source: Error,
    },

    #[error("Failed to create {path}: {source}")]
    CreateFailed {
        path: String,
        #[source]
        source: Error,
    },

    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: Error,
    },

    #[error("Operation on {path} failed: {source}")]
    OperationFailed {
        path: String,
        #[source]
        source: Error,
    },

    #[error("Failed to close {path}: {source}")]
    CloseFailed {
        path: String,
        #[source]
        source: Error,
    },
}

/// Closing a store failed or was refused.
#[derive(Error, Debug)]
pub enum CloseError {
    #[error("{count} folder(s) still open")]
    FoldersOpen { count: usize },

    #[error("Network error while closing store: {source}")]
    Network {
        #[source]
        source: Error,
    },
}

/// Any failure surfaced by the lifecycle coordinator before the
/// caller's operation could run.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Folder(#[from] FolderError),
}
