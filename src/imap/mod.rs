//! Built-in IMAP provider over `async-imap`
//!
//! Speaks `imap` (STARTTLS on port 143) and `imaps` (implicit TLS on
//! port 993). Recognised properties, per protocol `p`:
//!
//! | key | meaning |
//! |-----|---------|
//! | `mail.<p>.port` | server port |
//! | `mail.<p>.ssl.trust` | `*` accepts any certificate |
//! | `mail.<p>.connectiontimeout` | connect + login limit, milliseconds |

mod connection;
mod folder;
mod store;

pub use connection::{ImapSession, ImapSettings, TlsMode};
pub use folder::ImapFolder;
pub use store::ImapStore;

use crate::config::Properties;
use crate::error::ProviderError;
use crate::provider::Provider;

/// Provider for the `imap` and `imaps` protocols.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImapProvider;

impl Provider for ImapProvider {
    type Store = ImapStore;

    fn store(&self, protocol: &str, properties: &Properties) -> Result<ImapStore, ProviderError> {
        let tls = match protocol {
            "imap" => TlsMode::StartTls,
            "imaps" => TlsMode::Implicit,
            other => {
                return Err(ProviderError::Unsupported {
                    protocol: other.to_string(),
                });
            }
        };

        let settings = ImapSettings::from_properties(protocol, tls, properties).map_err(|e| {
            ProviderError::Misconfigured {
                protocol: protocol.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(ImapStore::new(settings))
    }
}
