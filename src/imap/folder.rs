use super::connection::ImapSession;
use super::store::{SharedSession, Slot};
use crate::error::{Error, Result};
use crate::flag::Flag;
use crate::folder::{CreateMode, OpenMode};
use crate::message::Message;
use crate::provider::FolderBackend;
use async_imap::imap_proto::types::Address;
use async_imap::types::{Fetch, Flag as ImapFlag};
use chrono::DateTime;
use futures::{StreamExt, TryStreamExt};
use std::fmt;
use tracing::{debug, info, warn};

/// Items fetched for every message.
const FETCH_ITEMS: &str = "(UID FLAGS RFC822.SIZE ENVELOPE)";

/// A mailbox on an [`ImapStore`](super::ImapStore).
pub struct ImapFolder {
    path: String,
    mode: Option<OpenMode>,
    session: SharedSession,
}

impl ImapFolder {
    pub(super) fn new(path: &str, session: SharedSession) -> Self {
        Self {
            path: path.to_string(),
            mode: None,
            session,
        }
    }

    /// `INBOX` is case-insensitive; every other name is compared exactly.
    fn names_match(&self, name: &str) -> bool {
        if self.path.eq_ignore_ascii_case("INBOX") {
            name.eq_ignore_ascii_case("INBOX")
        } else {
            name == self.path
        }
    }
}

impl fmt::Debug for ImapFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImapFolder")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn uid_set(uids: &[u32]) -> String {
    uids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Reject criteria that cannot travel inside one command line.
fn check_criteria(query: &str) -> Result<()> {
    if query.contains(['\r', '\n', '\0']) || !query.is_ascii() {
        return Err(Error::Imap(format!("Invalid search criteria {query:?}")));
    }
    Ok(())
}

fn session_of(slot: &mut Slot) -> Result<&mut ImapSession> {
    slot.session.as_mut().ok_or(Error::NotConnected)
}

/// SELECT or EXAMINE `path` on `session`.
async fn select(session: &mut ImapSession, path: &str, mode: OpenMode) -> Result<()> {
    match mode {
        OpenMode::ReadOnly => session.examine(path).await,
        OpenMode::ReadWrite => session.select(path).await,
    }
    .map(drop)
    .map_err(|e| Error::Imap(format!("Failed to select {path}: {e}")))
}

/// The shared session with `path` selected in `mode`, re-selecting it
/// if another folder has since selected a different mailbox.
async fn reselect<'a>(
    slot: &'a mut Slot,
    path: &str,
    mode: Option<OpenMode>,
) -> Result<&'a mut ImapSession> {
    let mode = mode.ok_or_else(|| Error::Imap(format!("{path} is not open")))?;
    let current = slot
        .selected
        .as_ref()
        .is_some_and(|(p, m)| p == path && *m == mode);
    if !current {
        slot.selected = None;
        let session = session_of(slot)?;
        debug!("Re-selecting {} {}", path, mode);
        select(session, path, mode).await?;
        slot.selected = Some((path.to_string(), mode));
    }
    session_of(slot)
}

/// Hierarchy delimiter of the personal namespace, `/` if the server
/// does not say.
async fn delimiter(session: &mut ImapSession) -> Result<String> {
    let names: Vec<_> = session
        .list(Some(""), Some("\"\""))
        .await
        .map_err(|e| Error::Imap(format!("List failed: {e}")))?
        .try_collect()
        .await?;
    Ok(names
        .first()
        .and_then(|n| n.delimiter())
        .unwrap_or("/")
        .to_string())
}

async fn fetch_uids(session: &mut ImapSession, uids: &str) -> Result<Vec<Message>> {
    let mut stream = session
        .uid_fetch(uids, FETCH_ITEMS)
        .await
        .map_err(|e| Error::Imap(format!("Fetch failed: {e}")))?;

    let mut messages = Vec::new();
    while let Some(item) = stream.next().await {
        let fetch = item.map_err(|e| Error::Imap(format!("Fetch error: {e}")))?;
        match to_message(&fetch) {
            Some(message) => messages.push(message),
            None => warn!("Skipping FETCH response {} without UID", fetch.message),
        }
    }
    drop(stream);

    messages.sort_by_key(|m| m.number);
    Ok(messages)
}

async fn search_uids(session: &mut ImapSession, query: &str) -> Result<Vec<Message>> {
    let uids = session
        .uid_search(query)
        .await
        .map_err(|e| Error::Imap(format!("Search failed: {e}")))?;

    let mut uid_list: Vec<u32> = uids.into_iter().collect();
    if uid_list.is_empty() {
        return Ok(vec![]);
    }
    uid_list.sort_unstable();

    info!("Found {} messages matching '{}'", uid_list.len(), query);
    fetch_uids(session, &uid_set(&uid_list)).await
}

fn to_message(fetch: &Fetch) -> Option<Message> {
    let mut message = Message::new(fetch.message, fetch.uid?);
    message.flags = fetch.flags().filter_map(|f| convert_flag(&f)).collect();
    message.size = fetch.size;

    if let Some(envelope) = fetch.envelope() {
        message.subject = envelope
            .subject
            .as_deref()
            .map(|s| String::from_utf8_lossy(s).into_owned());
        message.date = envelope
            .date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc2822(String::from_utf8_lossy(d).trim()).ok());
        message.from = envelope
            .from
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(address)
            .collect();
    }
    Some(message)
}

fn address(addr: &Address<'_>) -> Option<String> {
    let mailbox = String::from_utf8_lossy(addr.mailbox.as_deref()?);
    let host = String::from_utf8_lossy(addr.host.as_deref()?);
    Some(format!("{mailbox}@{host}"))
}

fn convert_flag(flag: &ImapFlag<'_>) -> Option<Flag> {
    Some(match flag {
        ImapFlag::Seen => Flag::Seen,
        ImapFlag::Answered => Flag::Answered,
        ImapFlag::Flagged => Flag::Flagged,
        ImapFlag::Deleted => Flag::Deleted,
        ImapFlag::Draft => Flag::Draft,
        ImapFlag::Recent => Flag::Recent,
        ImapFlag::Custom(name) => Flag::parse(name),
        ImapFlag::MayCreate => return None,
    })
}

impl FolderBackend for ImapFolder {
    async fn exists(&mut self) -> Result<bool> {
        let mut slot = self.session.lock().await;
        let session = session_of(&mut slot)?;

        let mut stream = session
            .list(Some(""), Some(&quote(&self.path)))
            .await
            .map_err(|e| Error::Imap(format!("List failed: {e}")))?;

        let mut found = false;
        while let Some(item) = stream.next().await {
            let name = item.map_err(|e| Error::Imap(format!("List error: {e}")))?;
            found |= self.names_match(name.name());
        }
        Ok(found)
    }

    async fn create(&mut self, mode: CreateMode) -> Result<()> {
        let mut slot = self.session.lock().await;
        let session = session_of(&mut slot)?;

        let name = if mode.holds_folders() && !mode.holds_messages() {
            format!("{}{}", self.path, delimiter(session).await?)
        } else {
            self.path.clone()
        };

        debug!("Creating mailbox {}", name);
        session
            .create(&name)
            .await
            .map_err(|e| Error::Imap(format!("Failed to create {name}: {e}")))
    }

    async fn open(&mut self, mode: OpenMode) -> Result<()> {
        let mut slot = self.session.lock().await;
        slot.selected = None;
        reselect(&mut slot, &self.path, Some(mode)).await?;
        self.mode = Some(mode);
        Ok(())
    }

    async fn messages(&mut self) -> Result<Vec<Message>> {
        let mut slot = self.session.lock().await;
        let session = reselect(&mut slot, &self.path, self.mode).await?;
        search_uids(session, "ALL").await
    }

    async fn search(&mut self, query: &str) -> Result<Vec<Message>> {
        check_criteria(query)?;
        let mut slot = self.session.lock().await;
        let session = reselect(&mut slot, &self.path, self.mode).await?;
        search_uids(session, query).await
    }

    async fn store_flags(&mut self, uids: &[u32], flags: &[Flag], add: bool) -> Result<()> {
        if let Some(bad) = flags.iter().find(|f| !f.is_well_formed()) {
            return Err(Error::Imap(format!("Invalid keyword {:?}", bad.as_imap_str())));
        }
        let mut slot = self.session.lock().await;
        let session = reselect(&mut slot, &self.path, self.mode).await?;

        let names: Vec<&str> = flags.iter().map(Flag::as_imap_str).collect();
        let sign = if add { '+' } else { '-' };
        let items = format!("{sign}FLAGS.SILENT ({})", names.join(" "));

        let _: Vec<_> = session
            .uid_store(uid_set(uids), &items)
            .await
            .map_err(|e| Error::Imap(format!("Store failed: {e}")))?
            .try_collect()
            .await?;
        Ok(())
    }

    async fn expunge(&mut self) -> Result<Vec<Message>> {
        let mut slot = self.session.lock().await;
        let session = reselect(&mut slot, &self.path, self.mode).await?;

        let removed = search_uids(session, "DELETED").await?;
        let _: Vec<_> = session
            .expunge()
            .await
            .map_err(|e| Error::Imap(format!("Expunge failed: {e}")))?
            .try_collect()
            .await?;

        info!("Expunged {} messages from {}", removed.len(), self.path);
        Ok(removed)
    }

    async fn close(&mut self, save_changes: bool) -> Result<()> {
        let mut slot = self.session.lock().await;
        let session = reselect(&mut slot, &self.path, self.mode).await?;

        // CLOSE on a read-write mailbox expunges; re-EXAMINE to discard.
        let discard = !save_changes && self.mode == Some(OpenMode::ReadWrite);
        let result = close_selected(session, &self.path, discard).await;

        slot.selected = None;
        self.mode = None;
        result
    }
}

async fn close_selected(session: &mut ImapSession, path: &str, discard: bool) -> Result<()> {
    if discard {
        select(session, path, OpenMode::ReadOnly).await?;
    }
    session
        .close()
        .await
        .map_err(|e| Error::Imap(format!("Close failed: {e}")))
}
