//! Search predicates
//!
//! A [`SearchPredicate`] decides whether a message matches. Predicates
//! that can be expressed in IMAP SEARCH syntax also offer a server
//! query, and the server's answer is taken as the result. Predicates
//! without one are evaluated client-side over every message.

use crate::flag::Flag;
use crate::message::Message;
use chrono::NaiveDate;

/// A boolean predicate over message metadata.
pub trait SearchPredicate: Send + Sync {
    fn evaluate(&self, message: &Message) -> bool;

    /// IMAP SEARCH criteria equivalent to this predicate, if any.
    /// When present, the server decides what matches and
    /// [`SearchPredicate::evaluate`] is not consulted.
    fn server_query(&self) -> Option<String> {
        None
    }
}

impl<F> SearchPredicate for F
where
    F: Fn(&Message) -> bool + Send + Sync,
{
    fn evaluate(&self, message: &Message) -> bool {
        self(message)
    }
}

/// Composable search term.
///
/// # Examples
///
/// ```
/// use mailstore::{Flag, Term};
///
/// let term = Term::from("alice@example.com").and(Term::NotFlag(Flag::Seen));
/// assert_eq!(
///     term.to_imap(),
///     "(FROM \"alice@example.com\" UNSEEN)"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    All,
    /// Sender address contains the text (case-insensitive).
    From(String),
    /// Subject contains the text (case-insensitive).
    Subject(String),
    /// Dated on or after the day.
    Since(NaiveDate),
    /// Dated strictly before the day.
    Before(NaiveDate),
    Flag(Flag),
    NotFlag(Flag),
    Not(Box<Term>),
    And(Vec<Term>),
    Or(Box<Term>, Box<Term>),
}

impl Term {
    #[must_use]
    pub fn from(text: impl Into<String>) -> Self {
        Self::From(text.into())
    }

    #[must_use]
    pub fn subject(text: impl Into<String>) -> Self {
        Self::Subject(text.into())
    }

    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::All => other,
            Self::And(mut terms) => {
                terms.push(other);
                Self::And(terms)
            }
            first => Self::And(vec![first, other]),
        }
    }

    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Render as IMAP SEARCH criteria.
    #[must_use]
    pub fn to_imap(&self) -> String {
        match self {
            Self::All => "ALL".to_string(),
            Self::From(text) => format!("FROM {}", quote(text)),
            Self::Subject(text) => format!("SUBJECT {}", quote(text)),
            Self::Since(day) => format!("SINCE {}", imap_date(*day)),
            Self::Before(day) => format!("BEFORE {}", imap_date(*day)),
            Self::Flag(flag) => flag_key(flag, true),
            Self::NotFlag(flag) => flag_key(flag, false),
            Self::Not(term) => format!("NOT {}", term.to_imap_group()),
            Self::And(terms) if terms.is_empty() => "ALL".to_string(),
            Self::And(terms) => {
                let parts: Vec<String> = terms.iter().map(Self::to_imap).collect();
                format!("({})", parts.join(" "))
            }
            Self::Or(a, b) => format!("OR {} {}", a.to_imap_group(), b.to_imap_group()),
        }
    }

    fn to_imap_group(&self) -> String {
        match self {
            Self::And(_) => self.to_imap(),
            other => format!("({})", other.to_imap()),
        }
    }

    /// Whether every string in the term fits a 7-bit quoted string and
    /// every keyword is an atom.
    fn fits_wire(&self) -> bool {
        match self {
            Self::From(text) | Self::Subject(text) => text.is_ascii(),
            Self::Flag(flag) | Self::NotFlag(flag) => flag.is_well_formed(),
            Self::Not(term) => term.fits_wire(),
            Self::And(terms) => terms.iter().all(Self::fits_wire),
            Self::Or(a, b) => a.fits_wire() && b.fits_wire(),
            Self::All | Self::Since(_) | Self::Before(_) => true,
        }
    }
}

impl SearchPredicate for Term {
    fn evaluate(&self, message: &Message) -> bool {
        match self {
            Self::All => true,
            Self::From(text) => {
                let needle = text.to_lowercase();
                message
                    .from
                    .iter()
                    .any(|addr| addr.to_lowercase().contains(&needle))
            }
            Self::Subject(text) => message
                .subject
                .as_ref()
                .is_some_and(|s| s.to_lowercase().contains(&text.to_lowercase())),
            Self::Since(day) => message.date.is_some_and(|d| d.date_naive() >= *day),
            Self::Before(day) => message.date.is_some_and(|d| d.date_naive() < *day),
            Self::Flag(flag) => message.has_flag(flag),
            Self::NotFlag(flag) => !message.has_flag(flag),
            Self::Not(term) => !term.evaluate(message),
            Self::And(terms) => terms.iter().all(|t| t.evaluate(message)),
            Self::Or(a, b) => a.evaluate(message) || b.evaluate(message),
        }
    }

    /// `None` for non-ASCII text or malformed keywords, which are then
    /// matched client-side.
    fn server_query(&self) -> Option<String> {
        self.fits_wire().then(|| self.to_imap())
    }
}

/// IMAP date format: SINCE >= date, BEFORE < date.
fn imap_date(day: NaiveDate) -> String {
    day.format("%-d-%b-%Y").to_string()
}

fn quote(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

fn flag_key(flag: &Flag, set: bool) -> String {
    let (on, off) = match flag {
        Flag::Seen => ("SEEN", "UNSEEN"),
        Flag::Answered => ("ANSWERED", "UNANSWERED"),
        Flag::Flagged => ("FLAGGED", "UNFLAGGED"),
        Flag::Deleted => ("DELETED", "UNDELETED"),
        Flag::Draft => ("DRAFT", "UNDRAFT"),
        Flag::Recent => ("RECENT", "NOT RECENT"),
        Flag::Keyword(kw) => {
            return if set {
                format!("KEYWORD {kw}")
            } else {
                format!("UNKEYWORD {kw}")
            };
        }
    };
    let key = if set { on } else { off };
    key.to_string()
}
