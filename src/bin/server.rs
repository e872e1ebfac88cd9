//! DualKV Server Binary
//!
//! Starts the plaintext and encrypted listeners over one shared store.

use clap::Parser;
use dualkv::config::{DEFAULT_ENCRYPTED_PORT, DEFAULT_HOST, DEFAULT_PLAINTEXT_PORT};
use dualkv::{Config, Server, TlsCredentials};
use tracing_subscriber::{fmt, EnvFilter};

/// DualKV Server
#[derive(Parser, Debug)]
#[command(name = "dualkv-server")]
#[command(about = "Key-value store served over plaintext and TLS listeners")]
#[command(version)]
struct Args {
    /// Interface to bind
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port of the plaintext listener
    #[arg(long, default_value_t = DEFAULT_PLAINTEXT_PORT)]
    plaintext_port: u16,

    /// Port of the encrypted listener
    #[arg(long, default_value_t = DEFAULT_ENCRYPTED_PORT)]
    encrypted_port: u16,

    /// Server certificate chain (PEM)
    #[arg(long, default_value = "certs/server.pem")]
    cert: String,

    /// Server private key (PEM)
    #[arg(long, default_value = "certs/server.key")]
    key: String,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dualkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .init();

    let args = Args::parse();

    tracing::info!("DualKV Server v{}", dualkv::VERSION);

    let config = Config::builder()
        .host(&args.host)
        .plaintext_port(args.plaintext_port)
        .encrypted_port(args.encrypted_port)
        .tls(TlsCredentials::new(&args.cert, &args.key))
        .build();

    let server = Server::new(config);
    let running = match server.start() {
        Ok(running) => running,
        Err(e) => {
            tracing::error!("Server failed to start: {}", e);
            std::process::exit(1);
        }
    };

    for listener in running.listeners() {
        println!(
            "Starting {} server on port {}",
            listener.kind(),
            listener.addr().port()
        );
    }

    if let Err(e) = running.wait() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
