//! Sessions: immutable configuration plus the provider and failure
//! sink that every store acquired from it shares.

use crate::config::{ConnectionConfig, Properties};
use crate::error::ProviderError;
use crate::imap::ImapProvider;
use crate::provider::Provider;
use crate::report::{Failure, FailureSink, Operation, SharedSink, TracingSink};
use crate::store::Store;
use std::sync::Arc;
use tracing::debug;

/// Build a session over the built-in IMAP provider. Performs no I/O.
///
/// # Examples
///
/// ```
/// use mailstore::{ConnectionConfig, create_session};
///
/// let session = create_session(ConnectionConfig::new("imaps", "mail.example.com", 993));
/// assert_eq!(session.config().host(), "mail.example.com");
/// ```
#[must_use]
pub fn create_session(config: ConnectionConfig) -> Session {
    Session::with_provider(config, ImapProvider)
}

/// An opaque session handle. Cheap to clone; clones share the
/// configuration, provider and sink.
#[derive(Debug)]
pub struct Session<P = ImapProvider> {
    config: Arc<ConnectionConfig>,
    provider: Arc<P>,
    sink: SharedSink,
}

impl<P> Clone for Session<P> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            provider: Arc::clone(&self.provider),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<P: Provider> Session<P> {
    /// Build a session over a specific provider, reporting failures
    /// through `tracing`.
    #[must_use]
    pub fn with_provider(config: ConnectionConfig, provider: P) -> Self {
        Self {
            config: Arc::new(config),
            provider: Arc::new(provider),
            sink: Arc::new(TracingSink),
        }
    }

    /// Replace the failure sink.
    #[must_use]
    pub fn with_sink(mut self, sink: impl FailureSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    #[must_use]
    pub fn properties(&self) -> Properties {
        self.config.properties()
    }

    #[must_use]
    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    /// Acquire an unconnected store for `protocol`.
    ///
    /// # Errors
    ///
    /// [`ProviderError::Unsupported`] if the provider does not know
    /// the protocol. The caller should give up on this account.
    pub fn store(&self, protocol: &str) -> Result<Store<P::Store>, ProviderError> {
        debug!("Acquiring {} store", protocol);
        match self.provider.store(protocol, &self.properties()) {
            Ok(backend) => Ok(Store::new(backend, protocol, self.sink.clone())),
            Err(e) => {
                self.sink
                    .record(Failure::new(Operation::AcquireStore, protocol, &e));
                Err(e)
            }
        }
    }

    /// Acquire a store for the configured protocol.
    ///
    /// # Errors
    ///
    /// See [`Session::store`].
    pub fn default_store(&self) -> Result<Store<P::Store>, ProviderError> {
        self.store(self.config.protocol())
    }
}
