//! IMAP connection and TLS helpers
//!
//! Provides the low-level `connect()` used by [`ImapStore`](super::ImapStore):
//! TCP, then either STARTTLS or an implicit TLS handshake, then LOGIN.

use crate::config::{Properties, protocol_key};
use crate::error::{Error, Result};
use async_imap::Session;
use rustls::pki_types::ServerName;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::{debug, info};

/// A TLS-wrapped IMAP session.
pub type ImapSession = Session<Compat<tokio_rustls::client::TlsStream<TcpStream>>>;

/// How TLS is negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Plain TCP upgraded with STARTTLS (`imap`).
    StartTls,
    /// TLS from the first byte (`imaps`).
    Implicit,
}

/// Connection settings read from session properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImapSettings {
    pub port: u16,
    pub tls: TlsMode,
    /// Accept any server certificate (`mail.<p>.ssl.trust = *`).
    pub trust_all: bool,
    /// Limit on TCP connect + TLS + LOGIN (`mail.<p>.connectiontimeout`, ms).
    pub timeout: Option<Duration>,
}

impl ImapSettings {
    /// Read `mail.<protocol>.*` keys.
    pub fn from_properties(protocol: &str, tls: TlsMode, props: &Properties) -> Result<Self> {
        let get = |name: &str| props.get(&protocol_key(protocol, name));

        let port = match get("port") {
            Some(port) => port
                .parse()
                .map_err(|e| Error::Config(format!("Invalid port '{port}': {e}")))?,
            None if tls == TlsMode::Implicit => 993,
            None => 143,
        };

        let timeout = get("connectiontimeout")
            .map(|ms| {
                ms.parse::<u64>()
                    .map(Duration::from_millis)
                    .map_err(|e| Error::Config(format!("Invalid connection timeout '{ms}': {e}")))
            })
            .transpose()?;

        Ok(Self {
            port,
            tls,
            trust_all: get("ssl.trust").is_some_and(|v| v.trim() == "*"),
            timeout,
        })
    }
}

/// Build a TLS connector.
///
/// Verifies against the webpki root set unless `trust_all`, which
/// local servers with self-signed certificates need.
fn tls_connector(trust_all: bool) -> Result<TlsConnector> {
    let builder = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| Error::Tls(e.to_string()))?;

    let config = if trust_all {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(DangerousVerifier))
            .with_no_client_auth()
    } else {
        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        builder.with_root_certificates(roots).with_no_client_auth()
    };
    Ok(TlsConnector::from(Arc::new(config)))
}

/// Open a fresh TLS-wrapped, logged-in IMAP session.
pub async fn connect(
    settings: &ImapSettings,
    host: &str,
    username: &str,
    password: &str,
) -> Result<ImapSession> {
    let attempt = establish(settings, host, username, password);
    match settings.timeout {
        Some(limit) => tokio::time::timeout(limit, attempt)
            .await
            .map_err(|_| Error::Timeout(limit))?,
        None => attempt.await,
    }
}

async fn establish(
    settings: &ImapSettings,
    host: &str,
    username: &str,
    password: &str,
) -> Result<ImapSession> {
    let addr = format!("{}:{}", host, settings.port);
    debug!("Connecting to IMAP server at {}", addr);

    let mut tcp_stream = TcpStream::connect(&addr).await?;

    if settings.tls == TlsMode::StartTls {
        let mut client = async_imap::Client::new(tcp_stream.compat());
        client
            .run_command_and_check_ok("STARTTLS", None)
            .await
            .map_err(|e| Error::Tls(format!("STARTTLS failed: {e}")))?;
        tcp_stream = client.into_inner().into_inner();
    }

    let connector = tls_connector(settings.trust_all)?;
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| Error::Tls(format!("Invalid server name: {e}")))?;

    let tls_stream = connector
        .connect(server_name, tcp_stream)
        .await
        .map_err(|e| Error::Tls(e.to_string()))?;

    let tls_client = async_imap::Client::new(tls_stream.compat());

    let session = tls_client
        .login(username, password)
        .await
        .map_err(|(e, _)| Error::Imap(format!("Login failed: {e}")))?;

    info!("Connected to IMAP server {}", addr);
    Ok(session)
}

/// Certificate verifier that accepts all certificates.
#[derive(Debug)]
struct DangerousVerifier;

impl rustls::client::danger::ServerCertVerifier for DangerousVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
