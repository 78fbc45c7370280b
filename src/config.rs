//! Connection configuration
//!
//! [`ConnectionConfig`] is the immutable protocol/host/port triple a
//! session is built from. It renders into the flat key/value
//! [`Properties`] that providers read (`mail.<protocol>.host`, ...).

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::env;

/// Provider configuration keys and values.
pub type Properties = BTreeMap<String, String>;

/// Key naming the default store protocol of a session.
pub const STORE_PROTOCOL_KEY: &str = "mail.store.protocol";

/// Immutable connection configuration.
///
/// # Examples
///
/// ```
/// use mailstore::ConnectionConfig;
///
/// let config = ConnectionConfig::new("imaps", "mail.example.com", 993);
/// let props = config.properties();
/// assert_eq!(props["mail.store.protocol"], "imaps");
/// assert_eq!(props["mail.imaps.host"], "mail.example.com");
/// assert_eq!(props["mail.imaps.port"], "993");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    protocol: String,
    host: String,
    port: u16,
    extra: Properties,
}

impl ConnectionConfig {
    #[must_use]
    pub fn new(protocol: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            protocol: protocol.into(),
            host: host.into(),
            port,
            extra: Properties::new(),
        }
    }

    /// Add a provider pass-through key, e.g. `mail.imaps.ssl.trust`.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// The `mail.<protocol>.<name>` key for this config's protocol.
    #[must_use]
    pub fn key(&self, name: &str) -> String {
        protocol_key(&self.protocol, name)
    }

    /// All provider keys: the store protocol, host and port of the
    /// configured protocol, then every extra property.
    #[must_use]
    pub fn properties(&self) -> Properties {
        let mut props = self.extra.clone();
        props.insert(STORE_PROTOCOL_KEY.to_string(), self.protocol.clone());
        props.insert(self.key("host"), self.host.clone());
        props.insert(self.key("port"), self.port.to_string());
        props
    }
}

/// Build a `mail.<protocol>.<name>` key.
#[must_use]
pub fn protocol_key(protocol: &str, name: &str) -> String {
    format!("mail.{protocol}.{name}")
}

/// Login credentials for a store.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection configuration plus credentials for one account.
#[derive(Debug, Clone)]
pub struct AccountConfig {
    pub connection: ConnectionConfig,
    pub credentials: Credentials,
}

impl AccountConfig {
    /// Load account configuration from environment variables
    ///
    /// Reads from `.env` file if present. Required variables:
    /// - `MAIL_HOST`
    /// - `MAIL_USERNAME`
    /// - `MAIL_PASSWORD`
    ///
    /// Optional (with defaults):
    /// - `MAIL_PROTOCOL` (default: `imaps`)
    /// - `MAIL_PORT` (default: `993` for `imaps`, `143` otherwise)
    /// - `MAIL_TRUST_ALL` (default: `false`) accepts any server certificate
    /// - `MAIL_TIMEOUT_SECS` connection timeout
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let protocol = env::var("MAIL_PROTOCOL").unwrap_or_else(|_| "imaps".to_string());
        let default_port = if protocol == "imaps" { "993" } else { "143" };
        let port = env::var("MAIL_PORT")
            .unwrap_or_else(|_| default_port.to_string())
            .parse()
            .map_err(|e| Error::Config(format!("Invalid MAIL_PORT: {e}")))?;
        let host =
            env::var("MAIL_HOST").map_err(|_| Error::Config("MAIL_HOST not set".into()))?;

        let mut connection = ConnectionConfig::new(protocol.clone(), host, port);

        if let Ok(value) = env::var("MAIL_TRUST_ALL") {
            let trust_all = parse_bool(&value)
                .ok_or_else(|| Error::Config(format!("Invalid MAIL_TRUST_ALL: {value}")))?;
            if trust_all {
                connection = connection.with_property(protocol_key(&protocol, "ssl.trust"), "*");
            }
        }

        if let Ok(value) = env::var("MAIL_TIMEOUT_SECS") {
            let secs: u64 = value
                .parse()
                .map_err(|e| Error::Config(format!("Invalid MAIL_TIMEOUT_SECS: {e}")))?;
            connection = connection.with_property(
                protocol_key(&protocol, "connectiontimeout"),
                (secs * 1000).to_string(),
            );
        }

        Ok(Self {
            connection,
            credentials: Credentials {
                username: env::var("MAIL_USERNAME")
                    .map_err(|_| Error::Config("MAIL_USERNAME not set".into()))?,
                password: env::var("MAIL_PASSWORD")
                    .map_err(|_| Error::Config("MAIL_PASSWORD not set".into()))?,
            },
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
