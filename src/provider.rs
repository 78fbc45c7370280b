//! Protocol provider seam
//!
//! The wire protocol lives behind these traits. [`Store`](crate::Store)
//! and [`Folder`](crate::Folder) own the lifecycle state and call into
//! a backend only when the state allows it; backends just do the I/O.

use crate::config::Properties;
use crate::error::{ProviderError, Result};
use crate::flag::Flag;
use crate::folder::{CreateMode, OpenMode};
use crate::message::Message;
use std::future::Future;

/// Resolves a protocol tag into a store backend.
pub trait Provider {
    type Store: StoreBackend;

    /// Build an unconnected store for `protocol`. Performs no I/O.
    ///
    /// # Errors
    ///
    /// [`ProviderError::Unsupported`] when this provider does not
    /// speak `protocol`.
    fn store(
        &self,
        protocol: &str,
        properties: &Properties,
    ) -> std::result::Result<Self::Store, ProviderError>;
}

/// One provider connection.
pub trait StoreBackend: Send {
    type Folder: FolderBackend;

    fn connect(
        &mut self,
        host: &str,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// A handle for `path`. Does not check that the folder exists.
    fn folder(&self, path: &str) -> Result<Self::Folder>;

    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// One node of a store's folder namespace.
pub trait FolderBackend: Send {
    fn exists(&mut self) -> impl Future<Output = Result<bool>> + Send;

    fn create(&mut self, mode: CreateMode) -> impl Future<Output = Result<()>> + Send;

    fn open(&mut self, mode: OpenMode) -> impl Future<Output = Result<()>> + Send;

    /// Every message in the open folder, in sequence order.
    fn messages(&mut self) -> impl Future<Output = Result<Vec<Message>>> + Send;

    /// Messages matching IMAP SEARCH criteria, in sequence order.
    fn search(&mut self, query: &str) -> impl Future<Output = Result<Vec<Message>>> + Send;

    /// Add (`add = true`) or remove flags on the messages with `uids`.
    fn store_flags(
        &mut self,
        uids: &[u32],
        flags: &[Flag],
        add: bool,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Permanently remove `\Deleted` messages, returning them.
    fn expunge(&mut self) -> impl Future<Output = Result<Vec<Message>>> + Send;

    fn close(&mut self, save_changes: bool) -> impl Future<Output = Result<()>> + Send;
}
