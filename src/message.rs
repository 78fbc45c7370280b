//! Message references returned by folder operations

use crate::flag::Flag;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Which open of which folder produced a message.
///
/// Generation 0 is never handed out by a folder, so a message built
/// by a provider and not yet stamped is stale everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Origin {
    pub(crate) folder: String,
    pub(crate) generation: u64,
}

/// A message in a folder.
///
/// Only valid while the producing folder stays open: once the folder
/// closes (or is reopened) the message is stale and write operations
/// taking it are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Sequence number within the folder at fetch time (1-based).
    pub number: u32,
    /// Unique identifier, stable for the folder's lifetime.
    pub uid: u32,
    pub flags: Vec<Flag>,
    /// Sender addresses.
    pub from: Vec<String>,
    pub subject: Option<String>,
    pub date: Option<DateTime<FixedOffset>>,
    /// Size in octets, when the provider reports it.
    pub size: Option<u32>,
    #[serde(skip)]
    pub(crate) origin: Origin,
}

impl Message {
    #[must_use]
    pub fn new(number: u32, uid: u32) -> Self {
        Self {
            number,
            uid,
            flags: Vec::new(),
            from: Vec::new(),
            subject: None,
            date: None,
            size: None,
            origin: Origin::default(),
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: Vec<Flag>) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from.push(from.into());
        self
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub const fn with_date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn has_flag(&self, flag: &Flag) -> bool {
        self.flags.contains(flag)
    }

    /// Path of the folder that produced this message.
    #[must_use]
    pub fn folder(&self) -> &str {
        &self.origin.folder
    }

    pub(crate) fn stamp(&mut self, folder: &str, generation: u64) {
        folder.clone_into(&mut self.origin.folder);
        self.origin.generation = generation;
    }

    pub(crate) const fn generation(&self) -> u64 {
        self.origin.generation
    }
}
