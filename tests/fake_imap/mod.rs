//! Fake IMAP server for integration testing
//!
//! This module provides an in-process IMAP server that speaks enough
//! of the protocol to drive `Store` and `Folder` end-to-end over real
//! TCP and TLS, with either STARTTLS or implicit TLS.
//!
//! ## Module layout
//!
//! - `server` -- TCP listener, TLS setup, and connection dispatch
//! - `handlers/` -- one file per IMAP command (LIST, SELECT, etc.)
//! - `mailbox` -- test data model (folders, emails, builder)
//! - `io` -- shared write helpers

// Each test binary uses a different subset of the harness.
#![allow(dead_code)]


pub use mailbox::{MailboxBuilder, TestEmail};
pub use server::{FakeImapServer, Transport};
