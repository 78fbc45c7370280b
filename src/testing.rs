//! Recording in-memory provider for unit tests.

use crate::config::{ConnectionConfig, Properties};
use crate::error::{Error, ProviderError, Result};
use crate::flag::Flag;
use crate::folder::{CreateMode, Folder, OpenMode};
use crate::message::Message;
use crate::provider::{FolderBackend, Provider, StoreBackend};
use crate::report::MemorySink;
use crate::session::Session;
use crate::store::Store;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// A provider call, as recorded by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect { host: String, username: String },
    Exists { path: String },
    Create { path: String, mode: CreateMode },
    Open { path: String, mode: OpenMode },
    Messages { path: String },
    Search { path: String, query: String },
    StoreFlags { path: String, uids: Vec<u32>, add: bool },
    Expunge { path: String },
    CloseFolder { path: String, save_changes: bool },
    CloseStore,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    folders: BTreeMap<String, Vec<Message>>,
    failing: HashSet<&'static str>,
    /// UIDs the next searches report; every message when unset.
    search_hits: Option<Vec<u32>>,
    reject_login: bool,
    last_properties: Option<Properties>,
}

/// Shared handle onto the mock's state; clones observe the same calls.
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    state: Arc<Mutex<State>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn last_properties(&self) -> Option<Properties> {
        self.lock().last_properties.clone()
    }

    pub fn reject_login(&self) {
        self.lock().reject_login = true;
    }

    pub fn accept_login(&self) {
        self.lock().reject_login = false;
    }

    /// Make the named backend operation fail until cleared.
    pub fn fail_on(&self, operation: &'static str) {
        self.lock().failing.insert(operation);
    }

    pub fn clear_failures(&self) {
        self.lock().failing.clear();
    }

    pub fn add_folder(&self, path: &str) {
        self.lock().folders.entry(path.to_string()).or_default();
    }

    pub fn add_message(&self, path: &str, message: Message) {
        self.lock()
            .folders
            .entry(path.to_string())
            .or_default()
            .push(message);
    }

    /// Script the server's answer to every later search.
    pub fn answer_search(&self, uids: &[u32]) {
        self.lock().search_hits = Some(uids.to_vec());
    }

    pub fn folder_exists(&self, path: &str) -> bool {
        self.lock().folders.contains_key(path)
    }

    pub fn backend(&self) -> MockStore {
        MockStore {
            state: Arc::clone(&self.state),
        }
    }
}

impl Provider for MockProvider {
    type Store = MockStore;

    fn store(
        &self,
        protocol: &str,
        properties: &Properties,
    ) -> std::result::Result<MockStore, ProviderError> {
        self.lock().last_properties = Some(properties.clone());
        match protocol {
            "imap" | "imaps" => Ok(self.backend()),
            other => Err(ProviderError::Unsupported {
                protocol: other.to_string(),
            }),
        }
    }
}

/// Record `call`, then fail if `operation` is armed.
fn record<'a>(state: &'a Mutex<State>, operation: &str, call: Call) -> Result<MutexGuard<'a, State>> {
    let mut st = state.lock().unwrap();
    st.calls.push(call);
    if st.failing.contains(operation) {
        return Err(Error::Imap(format!("{operation} failed")));
    }
    Ok(st)
}

#[derive(Debug)]
pub struct MockStore {
    state: Arc<Mutex<State>>,
}

impl StoreBackend for MockStore {
    type Folder = MockFolder;

    async fn connect(&mut self, host: &str, username: &str, _password: &str) -> Result<()> {
        let st = record(
            &self.state,
            "connect",
            Call::Connect {
                host: host.to_string(),
                username: username.to_string(),
            },
        )?;
        if st.reject_login {
            return Err(Error::Imap("NO [AUTHENTICATIONFAILED] Invalid credentials".into()));
        }
        Ok(())
    }

    fn folder(&self, path: &str) -> Result<MockFolder> {
        if self.state.lock().unwrap().failing.contains("resolve") {
            return Err(Error::Imap("resolve failed".into()));
        }
        Ok(MockFolder {
            state: Arc::clone(&self.state),
            path: path.to_string(),
        })
    }

    async fn close(&mut self) -> Result<()> {
        record(&self.state, "close_store", Call::CloseStore).map(drop)
    }
}

#[derive(Debug)]
pub struct MockFolder {
    state: Arc<Mutex<State>>,
    path: String,
}

impl MockFolder {
    fn numbered(messages: &[Message]) -> Vec<Message> {
        messages
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let mut m = m.clone();
                m.number = u32::try_from(i + 1).unwrap();
                m
            })
            .collect()
    }
}

impl FolderBackend for MockFolder {
    async fn exists(&mut self) -> Result<bool> {
        let path = self.path.clone();
        let st = record(&self.state, "exists", Call::Exists { path: path.clone() })?;
        Ok(st.folders.contains_key(&path))
    }

    async fn create(&mut self, mode: CreateMode) -> Result<()> {
        let path = self.path.clone();
        let mut st = record(
            &self.state,
            "create",
            Call::Create {
                path: path.clone(),
                mode,
            },
        )?;
        st.folders.entry(path).or_default();
        Ok(())
    }

    async fn open(&mut self, mode: OpenMode) -> Result<()> {
        record(
            &self.state,
            "open",
            Call::Open {
                path: self.path.clone(),
                mode,
            },
        )
        .map(drop)
    }

    async fn messages(&mut self) -> Result<Vec<Message>> {
        let path = self.path.clone();
        let st = record(&self.state, "messages", Call::Messages { path: path.clone() })?;
        Ok(st.folders.get(&path).map(|m| Self::numbered(m)).unwrap_or_default())
    }

    async fn search(&mut self, query: &str) -> Result<Vec<Message>> {
        let path = self.path.clone();
        let st = record(
            &self.state,
            "search",
            Call::Search {
                path: path.clone(),
                query: query.to_string(),
            },
        )?;
        let all = st.folders.get(&path).map(|m| Self::numbered(m)).unwrap_or_default();
        Ok(match &st.search_hits {
            Some(hits) => all.into_iter().filter(|m| hits.contains(&m.uid)).collect(),
            None => all,
        })
    }

    async fn store_flags(&mut self, uids: &[u32], flags: &[Flag], add: bool) -> Result<()> {
        let path = self.path.clone();
        let mut st = record(
            &self.state,
            "store_flags",
            Call::StoreFlags {
                path: path.clone(),
                uids: uids.to_vec(),
                add,
            },
        )?;
        for message in st.folders.entry(path).or_default() {
            if !uids.contains(&message.uid) {
                continue;
            }
            for flag in flags {
                if add && !message.flags.contains(flag) {
                    message.flags.push(flag.clone());
                } else if !add {
                    message.flags.retain(|f| f != flag);
                }
            }
        }
        Ok(())
    }

    async fn expunge(&mut self) -> Result<Vec<Message>> {
        let path = self.path.clone();
        let mut st = record(&self.state, "expunge", Call::Expunge { path: path.clone() })?;
        let messages = st.folders.entry(path).or_default();
        let numbered = Self::numbered(messages);
        messages.retain(|m| !m.has_flag(&Flag::Deleted));
        Ok(numbered
            .into_iter()
            .filter(|m| m.has_flag(&Flag::Deleted))
            .collect())
    }

    async fn close(&mut self, save_changes: bool) -> Result<()> {
        record(
            &self.state,
            "close_folder",
            Call::CloseFolder {
                path: self.path.clone(),
                save_changes,
            },
        )
        .map(drop)
    }
}

pub fn sample_message(uid: u32, from: &str, subject: &str) -> Message {
    Message::new(0, uid).with_from(from).with_subject(subject)
}

pub fn mock_session() -> (MockProvider, Session<MockProvider>, MemorySink) {
    let provider = MockProvider::new();
    let sink = MemorySink::new();
    let session = Session::with_provider(
        ConnectionConfig::new("imaps", "mail.example.com", 993),
        provider.clone(),
    )
    .with_sink(sink.clone());
    (provider, session, sink)
}

pub fn mock_store() -> (MockProvider, Store<MockStore>, MemorySink) {
    let (provider, session, sink) = mock_session();
    let store = session.default_store().unwrap();
    (provider, store, sink)
}

/// A resolved, unopened folder on a connected store.
pub async fn connected_folder(path: &str) -> (MockProvider, Folder<MockFolder>, MemorySink) {
    let (provider, mut store, sink) = mock_store();
    store.connect("mail.example.com", "alice", "secret").await.unwrap();
    let folder = store.folder(path).unwrap();
    (provider, folder, sink)
}
