//! Store handles
//!
//! A [`Store`] is one provider connection and the root of its folder
//! namespace. It tracks its own connection state and, through a link
//! shared with every folder resolved from it, how many of those
//! folders are open.

use crate::error::{AuthError, CloseError, LookupError};
use crate::folder::Folder;
use crate::provider::StoreBackend;
use crate::report::{Failure, Operation, SharedSink};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, info};

/// Connection state of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Disconnected,
    Connected,
}

/// State a store shares with its folders.
#[derive(Debug, Default)]
pub(crate) struct Link {
    connected: AtomicBool,
    open_folders: AtomicUsize,
}

impl Link {
    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) fn folder_opened(&self) {
        self.open_folders.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn folder_closed(&self) {
        let _ = self
            .open_folders
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }

    fn open_folders(&self) -> usize {
        self.open_folders.load(Ordering::Acquire)
    }
}

/// A connectable store.
#[derive(Debug)]
pub struct Store<B> {
    backend: B,
    protocol: String,
    host: Option<String>,
    state: StoreState,
    link: Arc<Link>,
    sink: SharedSink,
}

impl<B: StoreBackend> Store<B> {
    pub(crate) fn new(backend: B, protocol: &str, sink: SharedSink) -> Self {
        Self {
            backend,
            protocol: protocol.to_string(),
            host: None,
            state: StoreState::Disconnected,
            link: Arc::new(Link::default()),
            sink,
        }
    }

    #[must_use]
    pub const fn state(&self) -> StoreState {
        self.state
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == StoreState::Connected
    }

    #[must_use]
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Host of the current connection, if connected.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Number of folders resolved from this store that are open.
    #[must_use]
    pub fn open_folders(&self) -> usize {
        self.link.open_folders()
    }

    /// Connect and authenticate.
    ///
    /// # Errors
    ///
    /// [`AuthError::AlreadyConnected`] if the store is connected;
    /// [`AuthError::ConnectionFailed`] on any network or login
    /// failure, in which case the store stays disconnected and may be
    /// retried.
    pub async fn connect(
        &mut self,
        host: &str,
        username: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        if self.is_connected() {
            return Err(AuthError::AlreadyConnected);
        }

        debug!("Connecting {} store to {}", self.protocol, host);
        if let Err(source) = self.backend.connect(host, username, password).await {
            self.sink
                .record(Failure::new(Operation::Connect, host, &source));
            return Err(AuthError::ConnectionFailed {
                host: host.to_string(),
                source,
            });
        }

        self.state = StoreState::Connected;
        self.host = Some(host.to_string());
        self.link.connected.store(true, Ordering::Release);
        info!("Connected to {} as {}", host, username);
        Ok(())
    }

    /// Resolve a folder handle by path. Does not check existence.
    ///
    /// # Errors
    ///
    /// [`LookupError::NotConnected`] if the store is disconnected;
    /// [`LookupError::Provider`] if the provider rejects the path.
    pub fn folder(&self, path: &str) -> Result<Folder<B::Folder>, LookupError> {
        if !self.is_connected() {
            let err = LookupError::NotConnected {
                path: path.to_string(),
            };
            self.sink
                .record(Failure::new(Operation::ResolveFolder, path, &err));
            return Err(err);
        }

        match self.backend.folder(path) {
            Ok(backend) => Ok(Folder::new(
                backend,
                path,
                Arc::clone(&self.link),
                self.sink.clone(),
            )),
            Err(source) => {
                self.sink
                    .record(Failure::new(Operation::ResolveFolder, path, &source));
                Err(LookupError::Provider {
                    path: path.to_string(),
                    source,
                })
            }
        }
    }

    /// Disconnect. A no-op when already disconnected.
    ///
    /// # Errors
    ///
    /// [`CloseError::FoldersOpen`] while folders resolved from this
    /// store are open (the store stays connected);
    /// [`CloseError::Network`] if the provider's close failed, after
    /// which the store is disconnected anyway.
    pub async fn close(&mut self) -> Result<(), CloseError> {
        if !self.is_connected() {
            return Ok(());
        }

        let target = self.host.clone().unwrap_or_else(|| self.protocol.clone());
        let count = self.link.open_folders();
        if count > 0 {
            let err = CloseError::FoldersOpen { count };
            self.sink
                .record(Failure::new(Operation::CloseStore, target, &err));
            return Err(err);
        }

        let result = self.backend.close().await;
        self.state = StoreState::Disconnected;
        self.host = None;
        self.link.connected.store(false, Ordering::Release);

        match result {
            Ok(()) => {
                info!("Closed {} store", self.protocol);
                Ok(())
            }
            Err(source) => {
                self.sink
                    .record(Failure::new(Operation::CloseStore, target, &source));
                Err(CloseError::Network { source })
            }
        }
    }
}
