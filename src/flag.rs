//! Message flags
//!
//! System flags have dedicated variants; arbitrary keyword flags use
//! the `Keyword` variant. Flags drive search predicates and mark
//! messages for expunge.

use serde::{Serialize, Serializer};
use std::fmt;

/// A message flag.
///
/// System flags (prefixed with `\` on the wire) have dedicated
/// variants. User-defined keyword flags use [`Flag::Keyword`].
///
/// # Examples
///
/// ```
/// use mailstore::Flag;
///
/// assert_eq!(Flag::Deleted.as_imap_str(), "\\Deleted");
/// assert_eq!(Flag::parse("\\seen"), Flag::Seen);
/// assert_eq!(Flag::parse("$Important"), Flag::Keyword("$Important".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flag {
    /// Message has been read (`\Seen`).
    Seen,
    /// Message has been answered (`\Answered`).
    Answered,
    /// Message is flagged for attention (`\Flagged`).
    Flagged,
    /// Message is marked for deletion (`\Deleted`). Expunge removes these.
    Deleted,
    /// Message is a draft (`\Draft`).
    Draft,
    /// Message arrived since the last session (`\Recent`, server-set).
    Recent,
    /// A user-defined keyword flag (no `\` prefix).
    Keyword(String),
}

impl Flag {
    /// The wire representation of this flag.
    #[must_use]
    pub fn as_imap_str(&self) -> &str {
        match self {
            Self::Seen => "\\Seen",
            Self::Answered => "\\Answered",
            Self::Flagged => "\\Flagged",
            Self::Deleted => "\\Deleted",
            Self::Draft => "\\Draft",
            Self::Recent => "\\Recent",
            Self::Keyword(kw) => kw,
        }
    }

    /// Parse a wire flag. System flags match case-insensitively;
    /// anything else becomes a keyword.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "\\seen" => Self::Seen,
            "\\answered" => Self::Answered,
            "\\flagged" => Self::Flagged,
            "\\deleted" => Self::Deleted,
            "\\draft" => Self::Draft,
            "\\recent" => Self::Recent,
            _ => Self::Keyword(s.to_string()),
        }
    }

    /// Whether a client may set or clear this flag. `\Recent` is
    /// maintained by the server only.
    #[must_use]
    pub const fn is_settable(&self) -> bool {
        !matches!(self, Self::Recent)
    }

    /// Whether this flag can be sent as a bare IMAP atom. System flags
    /// always can; a keyword must be a non-empty atom without a
    /// leading `\`.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::Keyword(kw) => !kw.starts_with('\\') && is_atom(kw),
            _ => true,
        }
    }
}

/// RFC 3501 `atom`: one or more CHARs, none of them `atom-specials`.
fn is_atom(s: &str) -> bool {
    const SPECIALS: &[u8] = b"(){%*\"\\]";
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_graphic() && !SPECIALS.contains(&b))
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_imap_str())
    }
}

impl Serialize for Flag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_imap_str())
    }
}
