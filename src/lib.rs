//! Mail session, store and folder lifecycle
//!
//! Resources are acquired as [`Session`] -> [`Store`] -> [`Folder`]
//! and released in reverse. Each handle tracks its own state, so a
//! folder cannot be opened on a disconnected store and a store cannot
//! be closed while folders are still open on it.
//!
//! Folder reads are fail-soft: [`Folder::fetch_all`] and
//! [`Folder::fetch_matching`] return a [`Fetched`] that carries
//! whatever was read plus the failure, if any. Every failure is also
//! reported once to the session's [`FailureSink`].
//!
//! The built-in provider speaks IMAP over STARTTLS (`imap`) or
//! implicit TLS (`imaps`); other protocols plug in through
//! [`Provider`].
//!
//! ```no_run
//! use mailstore::{
//!     Credentials, Flag, Folder, FolderAccess, ImapFolder, OpenMode, Teardown, Term,
//!     ConnectionConfig, create_session, with_folder,
//! };
//!
//! # async fn run() -> Result<(), mailstore::LifecycleError> {
//! let session = create_session(ConnectionConfig::new("imaps", "mail.example.com", 993));
//! let credentials = Credentials {
//!     username: "alice".into(),
//!     password: "secret".into(),
//! };
//!
//! let unread = with_folder(
//!     &session,
//!     &credentials,
//!     "INBOX",
//!     FolderAccess::Open(OpenMode::ReadOnly),
//!     Teardown::DISCARD,
//!     async |folder: &mut Folder<ImapFolder>| {
//!         folder.fetch_matching(&Term::NotFlag(Flag::Seen)).await.len()
//!     },
//! )
//! .await?;
//! println!("{unread} unread");
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod flag;
mod folder;
mod imap;
mod lifecycle;
mod mailbox;
mod message;
mod provider;
mod report;
mod search;
mod session;
mod store;

#[cfg(test)]
mod testing;

pub use config::{AccountConfig, ConnectionConfig, Credentials, Properties, STORE_PROTOCOL_KEY};
pub use error::{
    AuthError, CloseError, Error, FolderError, LifecycleError, LookupError, ProviderError, Result,
};
pub use flag::Flag;
pub use folder::{CreateMode, Folder, FolderState, OpenMode};
pub use imap::{ImapFolder, ImapProvider, ImapSettings, ImapStore, TlsMode};
pub use lifecycle::{FolderAccess, FolderOf, Teardown, close_folder, close_store, with_folder};
pub use mailbox::Fetched;
pub use message::Message;
pub use provider::{FolderBackend, Provider, StoreBackend};
pub use report::{Failure, FailureSink, MemorySink, Operation, SharedSink, TracingSink};
pub use search::{SearchPredicate, Term};
pub use session::{Session, create_session};
pub use store::{Store, StoreState};
