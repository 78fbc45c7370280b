//! Lifecycle coordination
//!
//! Resources are acquired as session -> store -> folder and released
//! in reverse. [`with_folder`] runs a caller's operation inside that
//! bracket and always attempts the folder close and store close once
//! the store has connected, whatever the operation did.

use crate::config::Credentials;
use crate::error::LifecycleError;
use crate::folder::{CreateMode, Folder, OpenMode};
use crate::provider::{FolderBackend, Provider, StoreBackend};
use crate::session::Session;
use crate::store::Store;
use tracing::debug;

/// The folder handle type a provider yields.
pub type FolderOf<P> = Folder<<<P as Provider>::Store as StoreBackend>::Folder>;

/// How to close a folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Teardown {
    /// Persist flag changes on close.
    pub save_changes: bool,
    /// Expunge deleted messages before closing.
    pub expunge: bool,
}

impl Teardown {
    /// Close without persisting or expunging anything.
    pub const DISCARD: Self = Self {
        save_changes: false,
        expunge: false,
    };

    /// Expunge, then close saving changes.
    pub const EXPUNGE: Self = Self {
        save_changes: true,
        expunge: true,
    };
}

/// How to get a folder open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderAccess {
    /// Open an existing folder.
    Open(OpenMode),
    /// Create the folder first if it is missing.
    EnsureExists { create: CreateMode, open: OpenMode },
}

/// Close a folder per `teardown`. Never fails; a close failure has
/// already been reported by the folder.
pub async fn close_folder<F: FolderBackend>(folder: &mut Folder<F>, teardown: Teardown) {
    if let Err(e) = folder.close(teardown.save_changes, teardown.expunge).await {
        debug!("Ignoring close failure during teardown: {}", e);
    }
}

/// Close a store. Never fails; a close failure has already been
/// reported by the store.
pub async fn close_store<B: StoreBackend>(store: &mut Store<B>) {
    if let Err(e) = store.close().await {
        debug!("Ignoring store close failure during teardown: {}", e);
    }
}

/// Connect to the session's configured store, open `path`, run `op`
/// on the open folder, then tear everything down.
///
/// # Errors
///
/// Fails only if the folder could not be brought open: the store
/// could not be acquired or connected, the folder could not be
/// resolved, created or opened. Teardown failures are reported to
/// the session's sink, never returned.
pub async fn with_folder<P, R>(
    session: &Session<P>,
    credentials: &Credentials,
    path: &str,
    access: FolderAccess,
    teardown: Teardown,
    op: impl AsyncFnOnce(&mut FolderOf<P>) -> R,
) -> Result<R, LifecycleError>
where
    P: Provider,
{
    let mut store = session.default_store()?;
    store
        .connect(
            session.config().host(),
            &credentials.username,
            &credentials.password,
        )
        .await?;

    let outcome = run_in_folder(&store, path, access, teardown, op).await;
    close_store(&mut store).await;
    outcome
}

async fn run_in_folder<B, R>(
    store: &Store<B>,
    path: &str,
    access: FolderAccess,
    teardown: Teardown,
    op: impl AsyncFnOnce(&mut Folder<B::Folder>) -> R,
) -> Result<R, LifecycleError>
where
    B: StoreBackend,
{
    let mut folder = store.folder(path)?;
    let opened = match access {
        FolderAccess::Open(mode) => folder.open(mode).await,
        FolderAccess::EnsureExists { create, open } => {
            folder.ensure_exists_and_open(create, open).await
        }
    };
    opened?;

    let output = op(&mut folder).await;
    close_folder(&mut folder, teardown).await;
    Ok(output)
}
