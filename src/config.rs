//! Configuration for DualKV
//!
//! Centralized configuration with sensible defaults, for both the server
//! process and the client.

use std::path::PathBuf;

use crate::transport::TransportKind;

/// Default port of the plaintext listener
pub const DEFAULT_PLAINTEXT_PORT: u16 = 9090;

/// Default port of the encrypted listener
pub const DEFAULT_ENCRYPTED_PORT: u16 = 9091;

/// Default host both sides use
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Server certificate and key, both PEM encoded
#[derive(Debug, Clone)]
pub struct TlsCredentials {
    /// Certificate chain, leaf first
    pub cert_path: PathBuf,

    /// PKCS#8, PKCS#1 or SEC1 private key
    pub key_path: PathBuf,
}

impl TlsCredentials {
    pub fn new(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        }
    }
}

/// Main configuration for a DualKV server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Interface both listeners bind to
    pub host: String,

    /// Port of the plaintext listener (0 picks an ephemeral port)
    pub plaintext_port: u16,

    /// Port of the encrypted listener (0 picks an ephemeral port)
    pub encrypted_port: u16,

    /// Connection read timeout (milliseconds, 0 = block indefinitely)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = block indefinitely)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // TLS Configuration
    // -------------------------------------------------------------------------
    /// Server credentials; without them only the plaintext listener starts
    pub tls: Option<TlsCredentials>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            plaintext_port: DEFAULT_PLAINTEXT_PORT,
            encrypted_port: DEFAULT_ENCRYPTED_PORT,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            tls: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// `host:port` of the plaintext listener
    pub fn plaintext_addr(&self) -> String {
        format!("{}:{}", self.host, self.plaintext_port)
    }

    /// `host:port` of the encrypted listener
    pub fn encrypted_addr(&self) -> String {
        format!("{}:{}", self.host, self.encrypted_port)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the interface to bind
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the plaintext listener port
    pub fn plaintext_port(mut self, port: u16) -> Self {
        self.config.plaintext_port = port;
        self
    }

    /// Set the encrypted listener port
    pub fn encrypted_port(mut self, port: u16) -> Self {
        self.config.encrypted_port = port;
        self
    }

    /// Set the server certificate and key
    pub fn tls(mut self, credentials: TlsCredentials) -> Self {
        self.config.tls = Some(credentials);
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// Configuration for a single client session
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server host to connect to
    pub host: String,

    /// Server port; must match the listener for `mode`
    pub port: u16,

    /// Which listener to talk to
    pub mode: TransportKind,

    /// Trust anchor (PEM) used to verify the server in encrypted mode
    pub ca_path: Option<PathBuf>,

    /// Name the server certificate must be valid for
    pub server_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PLAINTEXT_PORT,
            mode: TransportKind::Plaintext,
            ca_path: None,
            server_name: "localhost".to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new client config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// `host:port` to dial
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
    port_set: bool,
}

impl ClientConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Override the port; otherwise the default port of `mode` is used
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self.port_set = true;
        self
    }

    pub fn mode(mut self, mode: TransportKind) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn ca_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ca_path = Some(path.into());
        self
    }

    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.config.server_name = name.into();
        self
    }

    pub fn build(mut self) -> ClientConfig {
        if !self.port_set {
            self.config.port = self.config.mode.default_port();
        }
        self.config
    }
}
