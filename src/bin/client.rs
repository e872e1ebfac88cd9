//! DualKV Client Binary
//!
//! Connects to one listener and runs the demonstration sequence, or a
//! line-based REPL with `--interactive`.

use std::io;

use clap::{Parser, ValueEnum};
use dualkv::client::{run_demo, run_interactive};
use dualkv::config::DEFAULT_HOST;
use dualkv::{Client, ClientConfig, TransportKind};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Raw TCP
    #[value(alias = "unsecure")]
    Plaintext,

    /// TLS, server verified against --ca
    #[value(alias = "secure")]
    Encrypted,
}

impl From<Mode> for TransportKind {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Plaintext => TransportKind::Plaintext,
            Mode::Encrypted => TransportKind::Encrypted,
        }
    }
}

/// DualKV CLI
#[derive(Parser, Debug)]
#[command(name = "dualkv-client")]
#[command(about = "Client for the DualKV key-value store")]
struct Args {
    /// Transport to use
    #[arg(value_enum)]
    mode: Mode,

    /// Server host
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Server port (defaults to the fixed port of the chosen mode)
    #[arg(short, long)]
    port: Option<u16>,

    /// Trusted CA certificate (PEM) for encrypted mode
    #[arg(long, default_value = "certs/ca.pem")]
    ca: String,

    /// Name the server certificate must be valid for
    #[arg(long, default_value = "localhost")]
    server_name: String,

    /// Read commands from stdin instead of running the demo sequence
    #[arg(short, long)]
    interactive: bool,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let args = Args::parse();

    let mut builder = ClientConfig::builder()
        .host(&args.host)
        .mode(args.mode.into())
        .ca_path(&args.ca)
        .server_name(&args.server_name);
    if let Some(port) = args.port {
        builder = builder.port(port);
    }
    let config = builder.build();

    if let Err(e) = run(&config, args.interactive) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &ClientConfig, interactive: bool) -> dualkv::Result<()> {
    let mut client = Client::connect(config)?;
    let mut stdout = io::stdout().lock();

    if interactive {
        run_interactive(&mut client, io::stdin().lock(), &mut stdout)?;
    } else {
        run_demo(&mut client, &mut stdout)?;
    }

    client.close()
}
