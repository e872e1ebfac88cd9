//! Transport Module
//!
//! The two security policies a listener can run under, credential loading,
//! and the byte streams the connection loop reads from.
//!
//! Both stream types are plain `Read + Write`, so the codec and the connection
//! loop never know which policy is in force.

use std::fmt;
use std::fs;
use std::io::{self, BufReader, Read, Write};
use std::net::TcpStream;
use std::path::Path;
use std::sync::Arc;

use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use rustls::{
    ClientConfig as RustlsClientConfig, ClientConnection, RootCertStore,
    ServerConfig as RustlsServerConfig, ServerConnection, StreamOwned,
};

use crate::config::{DEFAULT_ENCRYPTED_PORT, DEFAULT_PLAINTEXT_PORT};
use crate::error::{KvError, Result};

// =============================================================================
// Transport kinds and policies
// =============================================================================

/// Which listener a connection belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Raw TCP, no confidentiality or integrity
    Plaintext,

    /// TLS with server-only authentication
    Encrypted,
}

impl TransportKind {
    /// Fixed port both sides agree on
    pub fn default_port(self) -> u16 {
        match self {
            TransportKind::Plaintext => DEFAULT_PLAINTEXT_PORT,
            TransportKind::Encrypted => DEFAULT_ENCRYPTED_PORT,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Plaintext => f.write_str("plaintext"),
            TransportKind::Encrypted => f.write_str("encrypted"),
        }
    }
}

/// How a listener secures accepted sockets
#[derive(Clone)]
pub enum TransportPolicy {
    Plaintext,
    Tls(Arc<RustlsServerConfig>),
}

impl TransportPolicy {
    pub fn kind(&self) -> TransportKind {
        match self {
            TransportPolicy::Plaintext => TransportKind::Plaintext,
            TransportPolicy::Tls(_) => TransportKind::Encrypted,
        }
    }
}

impl fmt::Debug for TransportPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransportPolicy({})", self.kind())
    }
}

// =============================================================================
// Credential loading
// =============================================================================

fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Build the server-side TLS config from PEM files (no client certificates)
pub fn load_server_tls(cert_path: &Path, key_path: &Path) -> Result<Arc<RustlsServerConfig>> {
    tracing::debug!("Loading server certificate from {:?}", cert_path);
    tracing::debug!("Loading server key from {:?}", key_path);

    let cert_chain = load_certs(cert_path)?;
    let private_key = load_private_key(key_path)?;

    let config = RustlsServerConfig::builder_with_provider(crypto_provider())
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(cert_chain, private_key)?;

    Ok(Arc::new(config))
}

/// Build the client-side TLS config trusting only the certificates in `ca_path`
pub fn load_client_tls(ca_path: &Path) -> Result<Arc<RustlsClientConfig>> {
    tracing::debug!("Loading trust anchors from {:?}", ca_path);

    let mut root_store = RootCertStore::empty();
    for cert in load_certs(ca_path)? {
        root_store.add(cert)?;
    }

    let config = RustlsClientConfig::builder_with_provider(crypto_provider())
        .with_safe_default_protocol_versions()?
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(Arc::new(config))
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    fs::read(path)
        .map_err(|e| KvError::Credentials(format!("Failed to read {:?}: {}", path, e)))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let pem = read_pem(path)?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(&*pem))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| KvError::Credentials(format!("Failed to parse {:?}: {}", path, e)))?;

    if certs.is_empty() {
        return Err(KvError::Credentials(format!(
            "No certificates found in {:?}",
            path
        )));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let pem = read_pem(path)?;
    rustls_pemfile::private_key(&mut BufReader::new(&*pem))
        .map_err(|e| KvError::Credentials(format!("Failed to parse {:?}: {}", path, e)))?
        .ok_or_else(|| KvError::Credentials(format!("No private key found in {:?}", path)))
}

// =============================================================================
// Server side stream
// =============================================================================

/// An accepted connection after the listener's policy has been applied
pub enum ServerStream {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ServerConnection, TcpStream>>),
}

impl ServerStream {
    /// Wrap an accepted socket, running the TLS handshake if required
    pub fn accept(mut tcp: TcpStream, policy: &TransportPolicy) -> Result<Self> {
        match policy {
            TransportPolicy::Plaintext => Ok(ServerStream::Plain(tcp)),
            TransportPolicy::Tls(config) => {
                let mut conn = ServerConnection::new(Arc::clone(config))?;
                while conn.is_handshaking() {
                    conn.complete_io(&mut tcp)?;
                }
                Ok(ServerStream::Tls(Box::new(StreamOwned::new(conn, tcp))))
            }
        }
    }
}

impl Read for ServerStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ServerStream::Plain(tcp) => tcp.read(buf),
            ServerStream::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for ServerStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ServerStream::Plain(tcp) => tcp.write(buf),
            ServerStream::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ServerStream::Plain(tcp) => tcp.flush(),
            ServerStream::Tls(stream) => stream.flush(),
        }
    }
}

// =============================================================================
// Client side stream
// =============================================================================

/// A client's connection to one listener
pub enum ClientStream {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl ClientStream {
    /// Plaintext stream over an established socket
    pub fn plaintext(tcp: TcpStream) -> Self {
        ClientStream::Plain(tcp)
    }

    /// TLS stream over an established socket; the handshake completes here
    pub fn encrypted(
        mut tcp: TcpStream,
        config: Arc<RustlsClientConfig>,
        server_name: &str,
    ) -> Result<Self> {
        let name = ServerName::try_from(server_name)
            .map_err(|e| {
                KvError::Credentials(format!("Invalid server name {:?}: {}", server_name, e))
            })?
            .to_owned();

        let mut conn = ClientConnection::new(config, name)?;
        while conn.is_handshaking() {
            conn.complete_io(&mut tcp)?;
        }
        Ok(ClientStream::Tls(Box::new(StreamOwned::new(conn, tcp))))
    }

    /// Say goodbye cleanly; a TLS peer otherwise sees a truncated stream
    pub fn shutdown(&mut self) -> Result<()> {
        match self {
            ClientStream::Plain(tcp) => match tcp.shutdown(std::net::Shutdown::Both) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotConnected => {}
                Err(e) => return Err(e.into()),
            },
            ClientStream::Tls(stream) => {
                stream.conn.send_close_notify();
                stream.flush()?;
            }
        }
        Ok(())
    }
}

impl Read for ClientStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ClientStream::Plain(tcp) => tcp.read(buf),
            ClientStream::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for ClientStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ClientStream::Plain(tcp) => tcp.write(buf),
            ClientStream::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ClientStream::Plain(tcp) => tcp.flush(),
            ClientStream::Tls(stream) => stream.flush(),
        }
    }
}
