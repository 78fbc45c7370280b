//! Operations on an open folder
//!
//! Reads (fetch, search, expunge) are fail-soft: a provider failure
//! is reported to the sink and the caller gets an empty [`Fetched`]
//! carrying the failure instead of an error. Flag changes are
//! mutations and return an explicit `Result`.

use crate::error::FolderError;
use crate::flag::Flag;
use crate::folder::{Folder, FolderState, OpenMode};
use crate::message::Message;
use crate::provider::FolderBackend;
use crate::report::Operation;
use crate::search::SearchPredicate;
use tracing::debug;

/// Outcome of a fail-soft read.
///
/// Always holds a message list; on failure the list is empty and
/// [`Fetched::failure`] says why, so "no messages" and "could not
/// read" stay distinguishable.
#[must_use]
#[derive(Debug)]
pub struct Fetched {
    messages: Vec<Message>,
    failure: Option<FolderError>,
}

impl Fetched {
    const fn complete(messages: Vec<Message>) -> Self {
        Self {
            messages,
            failure: None,
        }
    }

    const fn failed(failure: FolderError) -> Self {
        Self {
            messages: Vec::new(),
            failure: Some(failure),
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Why the read degraded, if it did.
    #[must_use]
    pub const fn failure(&self) -> Option<&FolderError> {
        self.failure.as_ref()
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl IntoIterator for Fetched {
    type Item = Message;
    type IntoIter = std::vec::IntoIter<Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

impl<'a> IntoIterator for &'a Fetched {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

impl<F: FolderBackend> Folder<F> {
    /// Every message currently in the folder.
    pub async fn fetch_all(&mut self) -> Fetched {
        if let Err(err) = self.require_open() {
            return self.degrade(Operation::FetchAll, err);
        }
        let result = self.backend.messages().await;
        self.settle(Operation::FetchAll, result)
    }

    /// Messages matching `predicate`.
    ///
    /// Searched server-side when the predicate has a server query;
    /// otherwise every message is fetched and filtered with
    /// [`SearchPredicate::evaluate`]. No match is an empty, complete
    /// result.
    pub async fn fetch_matching<P>(&mut self, predicate: &P) -> Fetched
    where
        P: SearchPredicate + ?Sized,
    {
        if let Err(err) = self.require_open() {
            return self.degrade(Operation::FetchMatching, err);
        }
        if let Some(query) = predicate.server_query() {
            debug!("Searching {} for {}", self.path, query);
            let result = self.backend.search(&query).await;
            return self.settle(Operation::FetchMatching, result);
        }

        let result = self.backend.messages().await;
        let mut fetched = self.settle(Operation::FetchMatching, result);
        fetched.messages.retain(|m| predicate.evaluate(m));
        fetched
    }

    /// Permanently remove messages flagged `\Deleted`, returning them.
    ///
    /// Requires the folder to be open read-write.
    pub async fn expunge(&mut self) -> Fetched {
        if let Err(err) = self.require_writable() {
            return self.degrade(Operation::Expunge, err);
        }
        let result = self.backend.expunge().await;
        self.settle(Operation::Expunge, result)
    }

    /// Set (`value = true`) or clear `flags` on `messages`.
    ///
    /// # Errors
    ///
    /// [`FolderError::NotOpen`] / [`FolderError::ReadOnly`] when the
    /// folder is not open read-write, [`FolderError::StaleMessage`]
    /// when a message was not produced by the current open of this
    /// folder, or [`FolderError::OperationFailed`] from the provider.
    pub async fn set_flags(
        &mut self,
        messages: &[Message],
        flags: &[Flag],
        value: bool,
    ) -> Result<(), FolderError> {
        if let Err(err) = self.require_writable() {
            self.report(Operation::SetFlags, &err);
            return Err(err);
        }
        if let Some(stale) = messages.iter().find(|m| m.generation() != self.generation) {
            let err = FolderError::StaleMessage {
                path: self.path.clone(),
                uid: stale.uid,
            };
            self.report(Operation::SetFlags, &err);
            return Err(err);
        }

        let flags: Vec<Flag> = flags.iter().filter(|f| f.is_settable()).cloned().collect();
        if messages.is_empty() || flags.is_empty() {
            return Ok(());
        }

        let uids: Vec<u32> = messages.iter().map(|m| m.uid).collect();
        if let Err(source) = self.backend.store_flags(&uids, &flags, value).await {
            let err = FolderError::OperationFailed {
                path: self.path.clone(),
                source,
            };
            self.report(Operation::SetFlags, &err);
            return Err(err);
        }
        Ok(())
    }

    /// Flag `messages` for deletion by the next expunge.
    ///
    /// # Errors
    ///
    /// See [`Folder::set_flags`].
    pub async fn mark_deleted(&mut self, messages: &[Message]) -> Result<(), FolderError> {
        self.set_flags(messages, &[Flag::Deleted], true).await
    }

    fn require_open(&self) -> Result<OpenMode, FolderError> {
        match self.state {
            FolderState::Open(mode) => Ok(mode),
            _ => Err(FolderError::NotOpen {
                path: self.path.clone(),
            }),
        }
    }

    fn require_writable(&self) -> Result<(), FolderError> {
        match self.require_open()? {
            OpenMode::ReadWrite => Ok(()),
            OpenMode::ReadOnly => Err(FolderError::ReadOnly {
                path: self.path.clone(),
            }),
        }
    }

    fn degrade(&self, operation: Operation, err: FolderError) -> Fetched {
        self.report(operation, &err);
        Fetched::failed(err)
    }

    fn settle(&self, operation: Operation, result: crate::error::Result<Vec<Message>>) -> Fetched {
        match result {
            Ok(mut messages) => {
                for message in &mut messages {
                    message.stamp(&self.path, self.generation);
                }
                Fetched::complete(messages)
            }
            Err(source) => self.degrade(
                operation,
                FolderError::OperationFailed {
                    path: self.path.clone(),
                    source,
                },
            ),
        }
    }
}
