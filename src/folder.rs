//! Folder handles
//!
//! A [`Folder`] is a node in a store's namespace. It owns its
//! open/closed state explicitly: operations check the state rather
//! than re-querying the provider, and close is safe to call on a
//! folder that was never opened.

use crate::error::FolderError;
use crate::provider::FolderBackend;
use crate::report::{Failure, Operation, SharedSink};
use crate::store::Link;
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Whether a folder is opened for reading only or for changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ReadOnly => "read-only",
            Self::ReadWrite => "read-write",
        })
    }
}

/// What a newly created folder may contain.
///
/// # Examples
///
/// ```
/// use mailstore::CreateMode;
///
/// let both = CreateMode::HOLDS_MESSAGES | CreateMode::HOLDS_FOLDERS;
/// assert!(both.holds_messages() && both.holds_folders());
/// assert!(!CreateMode::HOLDS_FOLDERS.holds_messages());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CreateMode(u8);

impl CreateMode {
    pub const HOLDS_MESSAGES: Self = Self(0b01);
    pub const HOLDS_FOLDERS: Self = Self(0b10);

    #[must_use]
    pub const fn holds_messages(self) -> bool {
        self.0 & Self::HOLDS_MESSAGES.0 != 0
    }

    #[must_use]
    pub const fn holds_folders(self) -> bool {
        self.0 & Self::HOLDS_FOLDERS.0 != 0
    }
}

impl BitOr for CreateMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Lifecycle state of a folder handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderState {
    /// Resolved, never opened. Existence unknown.
    Unopened,
    /// Checked and found missing; create before opening.
    NonExistent,
    Open(OpenMode),
    Closed,
}

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// A folder in a store.
#[derive(Debug)]
pub struct Folder<F> {
    pub(crate) backend: F,
    pub(crate) path: String,
    pub(crate) state: FolderState,
    pub(crate) generation: u64,
    link: Arc<Link>,
    pub(crate) sink: SharedSink,
}

impl<F> Folder<F> {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn state(&self) -> FolderState {
        self.state
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, FolderState::Open(_))
    }

    /// The open mode, if open.
    #[must_use]
    pub const fn mode(&self) -> Option<OpenMode> {
        match self.state {
            FolderState::Open(mode) => Some(mode),
            _ => None,
        }
    }

    pub(crate) fn report(&self, operation: Operation, err: &FolderError) {
        self.sink
            .record(Failure::new(operation, self.path.clone(), err));
    }

    fn mark_closed(&mut self) {
        self.state = FolderState::Closed;
        self.generation = 0;
        self.link.folder_closed();
    }
}

impl<F: FolderBackend> Folder<F> {
    pub(crate) fn new(backend: F, path: &str, link: Arc<Link>, sink: SharedSink) -> Self {
        Self {
            backend,
            path: path.to_string(),
            state: FolderState::Unopened,
            generation: 0,
            link,
            sink,
        }
    }

    /// Open without checking existence.
    ///
    /// # Errors
    ///
    /// [`FolderError::StoreNotConnected`] if the owning store is not
    /// connected, [`FolderError::AlreadyOpen`] if open, or
    /// [`FolderError::OpenFailed`] if the provider refused.
    pub async fn open(&mut self, mode: OpenMode) -> Result<(), FolderError> {
        if let Err(err) = self.check_openable() {
            self.report(Operation::OpenFolder, &err);
            return Err(err);
        }

        if let Err(source) = self.backend.open(mode).await {
            let err = FolderError::OpenFailed {
                path: self.path.clone(),
                source,
            };
            self.report(Operation::OpenFolder, &err);
            return Err(err);
        }

        self.state = FolderState::Open(mode);
        self.generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        self.link.folder_opened();
        info!("Opened {} {}", self.path, mode);
        Ok(())
    }

    /// Create the folder with `create_mode` if it does not exist,
    /// then open it with `open_mode`.
    ///
    /// # Errors
    ///
    /// [`FolderError::ExistsFailed`], [`FolderError::CreateFailed`]
    /// or any error of [`Folder::open`].
    pub async fn ensure_exists_and_open(
        &mut self,
        create_mode: CreateMode,
        open_mode: OpenMode,
    ) -> Result<(), FolderError> {
        if let Err(err) = self.check_openable() {
            self.report(Operation::OpenFolder, &err);
            return Err(err);
        }

        let exists = match self.backend.exists().await {
            Ok(exists) => exists,
            Err(source) => {
                let err = FolderError::ExistsFailed {
                    path: self.path.clone(),
                    source,
                };
                self.report(Operation::CheckExists, &err);
                return Err(err);
            }
        };

        if !exists {
            self.state = FolderState::NonExistent;
            debug!("Creating missing folder {}", self.path);
            if let Err(source) = self.backend.create(create_mode).await {
                let err = FolderError::CreateFailed {
                    path: self.path.clone(),
                    source,
                };
                self.report(Operation::CreateFolder, &err);
                return Err(err);
            }
            self.state = FolderState::Unopened;
            info!("Created folder {}", self.path);
        }

        self.open(open_mode).await
    }

    /// Close the folder. A no-op unless open.
    ///
    /// With `expunge_first`, deleted messages are expunged before the
    /// close; an expunge failure is reported and the close still
    /// happens. `save_changes` is handed to the provider's close.
    ///
    /// # Errors
    ///
    /// [`FolderError::CloseFailed`] if the provider's close failed.
    /// The folder is considered closed either way.
    pub async fn close(
        &mut self,
        save_changes: bool,
        expunge_first: bool,
    ) -> Result<(), FolderError> {
        if !self.is_open() {
            return Ok(());
        }

        if expunge_first {
            let expunged = self.expunge().await;
            debug!("Expunged {} message(s) before closing {}", expunged.len(), self.path);
        }

        let result = self.backend.close(save_changes).await;
        self.mark_closed();

        match result {
            Ok(()) => {
                info!("Closed {}", self.path);
                Ok(())
            }
            Err(source) => {
                let err = FolderError::CloseFailed {
                    path: self.path.clone(),
                    source,
                };
                self.report(Operation::CloseFolder, &err);
                Err(err)
            }
        }
    }

    fn check_openable(&self) -> Result<(), FolderError> {
        if self.is_open() {
            return Err(FolderError::AlreadyOpen {
                path: self.path.clone(),
            });
        }
        if !self.link.is_connected() {
            return Err(FolderError::StoreNotConnected {
                path: self.path.clone(),
            });
        }
        Ok(())
    }
}

impl<F> Drop for Folder<F> {
    fn drop(&mut self) {
        if self.is_open() {
            warn!("Folder {} dropped while open", self.path);
            self.link.folder_closed();
        }
    }
}
