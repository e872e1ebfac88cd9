//! Listener Logging Tests
//!
//! A connection that fails (bad handshake, malformed frame) is reported
//! exactly once at warn level. Lives in its own test binary because it
//! installs the global subscriber.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use dualkv::network::Listener;
use dualkv::transport::{load_server_tls, TransportPolicy};
use dualkv::Handler;
use parking_lot::Mutex;

// =============================================================================
// Helper Functions
// =============================================================================

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn warn_lines_mentioning(&self, needle: &str) -> usize {
        String::from_utf8_lossy(&self.0.lock())
            .lines()
            .filter(|line| line.contains("WARN") && line.contains(needle))
            .count()
    }
}

fn spawn_listener(policy: TransportPolicy) -> SocketAddr {
    let listener = Listener::bind("127.0.0.1:0", policy, Arc::new(Handler::new())).unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || listener.serve());
    addr
}

/// Send `bytes`, then wait for the server to hang up; returns our local address
fn send_and_wait_for_close(addr: SocketAddr, bytes: &[u8]) -> String {
    let mut raw = TcpStream::connect(addr).unwrap();
    let local = raw.local_addr().unwrap().to_string();
    raw.write_all(bytes).unwrap();
    let mut sink = Vec::new();
    let _ = raw.read_to_end(&mut sink);
    local
}

fn wait_for_warning(logs: &CapturedLogs, needle: &str) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while logs.warn_lines_mentioning(needle) == 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    // Leave room for a second, duplicate report to show up
    thread::sleep(Duration::from_millis(200));
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_failed_connections_are_reported_once() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::set_global_default(subscriber).unwrap();

    let certs = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("certs");
    let tls = load_server_tls(&certs.join("server.pem"), &certs.join("server.key")).unwrap();
    let tls_addr = spawn_listener(TransportPolicy::Tls(tls));
    let plain_addr = spawn_listener(TransportPolicy::Plaintext);

    // Not a TLS record at all
    let peer = send_and_wait_for_close(tls_addr, b"definitely not a client hello");
    wait_for_warning(&logs, &peer);
    assert_eq!(logs.warn_lines_mentioning(&peer), 1);

    // Unknown op code on the plaintext listener
    let peer = send_and_wait_for_close(plain_addr, &[0xFF, 0x00, 0x00, 0x00, 0x00]);
    wait_for_warning(&logs, &peer);
    assert_eq!(logs.warn_lines_mentioning(&peer), 1);
}
