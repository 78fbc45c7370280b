use super::connection::{self, ImapSession, ImapSettings};
use super::folder::ImapFolder;
use crate::error::{Error, Result};
use crate::folder::OpenMode;
use crate::provider::StoreBackend;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// The connection, plus the mailbox it has selected and how.
///
/// An IMAP session selects one mailbox at a time. Folders sharing the
/// session compare `selected` with their own path and mode and
/// re-select before issuing commands when it differs.
#[derive(Default)]
pub(super) struct Slot {
    pub(super) session: Option<ImapSession>,
    pub(super) selected: Option<(String, OpenMode)>,
}

/// Slot shared by a store and every folder resolved from it.
pub(super) type SharedSession = Arc<Mutex<Slot>>;

/// One IMAP connection. Folders resolved from it issue their commands
/// over the same session, one at a time.
pub struct ImapStore {
    settings: ImapSettings,
    session: SharedSession,
}

impl ImapStore {
    pub(super) fn new(settings: ImapSettings) -> Self {
        Self {
            settings,
            session: SharedSession::default(),
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &ImapSettings {
        &self.settings
    }
}

impl fmt::Debug for ImapStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImapStore")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl StoreBackend for ImapStore {
    type Folder = ImapFolder;

    async fn connect(&mut self, host: &str, username: &str, password: &str) -> Result<()> {
        let session = connection::connect(&self.settings, host, username, password).await?;
        let mut slot = self.session.lock().await;
        slot.session = Some(session);
        slot.selected = None;
        Ok(())
    }

    fn folder(&self, path: &str) -> Result<ImapFolder> {
        if path.contains(['\r', '\n', '\0']) {
            return Err(Error::Imap(format!("Invalid mailbox name {path:?}")));
        }
        Ok(ImapFolder::new(path, Arc::clone(&self.session)))
    }

    async fn close(&mut self) -> Result<()> {
        let session = {
            let mut slot = self.session.lock().await;
            slot.selected = None;
            slot.session.take()
        };
        let Some(mut session) = session else {
            return Ok(());
        };
        debug!("Logging out");
        session
            .logout()
            .await
            .map_err(|e| Error::Imap(format!("Logout failed: {e}")))
    }
}
