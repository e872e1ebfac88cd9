//! End-to-end Tests
//!
//! Real server, real sockets: both listeners on ephemeral ports, the TLS one
//! using the development CA and server certificate under `certs/`.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread;

use dualkv::client::run_demo;
use dualkv::error::KEY_NOT_FOUND_REASON;
use dualkv::network::RunningServer;
use dualkv::{Client, ClientConfig, Config, KvError, Server, TlsCredentials, TransportKind};

// =============================================================================
// Helper Functions
// =============================================================================

fn certs_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("certs")
}

fn dev_credentials() -> TlsCredentials {
    TlsCredentials::new(certs_dir().join("server.pem"), certs_dir().join("server.key"))
}

fn start_server() -> RunningServer {
    let config = Config::builder()
        .plaintext_port(0)
        .encrypted_port(0)
        .tls(dev_credentials())
        .build();
    Server::new(config).start().unwrap()
}

fn client_config(addr: SocketAddr, mode: TransportKind) -> ClientConfig {
    ClientConfig::builder()
        .host(addr.ip().to_string())
        .port(addr.port())
        .mode(mode)
        .ca_path(certs_dir().join("ca.pem"))
        .build()
}

fn connect(server: &RunningServer, mode: TransportKind) -> Client {
    let addr = server.addr(mode).unwrap();
    Client::connect(&client_config(addr, mode)).unwrap()
}

const DEMO_OUTPUT: &str = "Invalid operation: \"Key not found in store.\"\n\
                           \"bar\" -> \"car\"\n\
                           \"baz\" -> \"red\"\n\
                           Invalid operation: \"Key not found in store.\"\n";

fn assert_not_found(result: dualkv::Result<String>) {
    match result {
        Err(KvError::InvalidOperation { why }) => assert_eq!(why, KEY_NOT_FOUND_REASON),
        other => panic!("Expected InvalidOperation, got {:?}", other),
    }
}

// =============================================================================
// Reference Sequence
// =============================================================================

#[test]
fn test_reference_sequence_plaintext() {
    let server = start_server();
    let mut client = connect(&server, TransportKind::Plaintext);

    let mut out = Vec::new();
    run_demo(&mut client, &mut out).unwrap();
    client.close().unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), DEMO_OUTPUT);
}

#[test]
fn test_reference_sequence_encrypted() {
    let server = start_server();
    let mut client = connect(&server, TransportKind::Encrypted);
    assert_eq!(client.kind(), TransportKind::Encrypted);

    let mut out = Vec::new();
    run_demo(&mut client, &mut out).unwrap();
    client.close().unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), DEMO_OUTPUT);
}

// =============================================================================
// One Store Behind Both Listeners
// =============================================================================

#[test]
fn test_writes_visible_across_listeners() {
    let server = start_server();
    let mut plain = connect(&server, TransportKind::Plaintext);
    let mut tls = connect(&server, TransportKind::Encrypted);

    assert_not_found(tls.get("shared"));

    plain.put("shared", "from-plain").unwrap();
    assert_eq!(tls.get("shared").unwrap(), "from-plain");

    tls.put("shared", "from-tls").unwrap();
    assert_eq!(plain.get("shared").unwrap(), "from-tls");

    plain.close().unwrap();
    tls.close().unwrap();
}

#[test]
fn test_alternating_listeners_keep_arrival_order() {
    let server = start_server();
    let mut plain = connect(&server, TransportKind::Plaintext);
    let mut tls = connect(&server, TransportKind::Encrypted);

    for i in 0..20 {
        let (writer, reader) = if i % 2 == 0 {
            (&mut plain, &mut tls)
        } else {
            (&mut tls, &mut plain)
        };
        writer.put("counter", &i.to_string()).unwrap();
        assert_eq!(reader.get("counter").unwrap(), i.to_string());
    }
}

#[test]
fn test_parallel_clients_on_both_listeners() {
    let server = start_server();
    let plain_addr = server.addr(TransportKind::Plaintext).unwrap();
    let tls_addr = server.addr(TransportKind::Encrypted).unwrap();

    let workers: Vec<_> = [
        (plain_addr, TransportKind::Plaintext),
        (tls_addr, TransportKind::Encrypted),
    ]
    .into_iter()
    .map(|(addr, mode)| {
        thread::spawn(move || {
            let mut client = Client::connect(&client_config(addr, mode)).unwrap();
            for i in 0..50 {
                client.put(&format!("{}-{}", mode, i), &i.to_string()).unwrap();
            }
            client.close().unwrap();
        })
    })
    .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let mut client = connect(&server, TransportKind::Plaintext);
    for mode in [TransportKind::Plaintext, TransportKind::Encrypted] {
        assert_eq!(client.get(&format!("{}-49", mode)).unwrap(), "49");
    }
}

#[test]
fn test_large_values_on_both_listeners() {
    let server = start_server();
    let big = "x".repeat(17 * 1024 * 1024);

    for mode in [TransportKind::Plaintext, TransportKind::Encrypted] {
        let mut client = connect(&server, mode);
        let key = format!("big-{}", mode);

        client.put(&key, &big).unwrap();
        assert_eq!(client.get(&key).unwrap().len(), big.len());

        // The session is still usable afterwards
        client.put("after-big", "small").unwrap();
        assert_eq!(client.get("after-big").unwrap(), "small");
        client.close().unwrap();
    }
}

// =============================================================================
// Failure Isolation
// =============================================================================

#[test]
fn test_malformed_request_only_closes_its_connection() {
    let server = start_server();

    // Open on the other listener first so both are in use at once
    let mut tls = connect(&server, TransportKind::Encrypted);

    let mut raw = TcpStream::connect(server.addr(TransportKind::Plaintext).unwrap()).unwrap();
    raw.write_all(&[0xFF, 0x00, 0x00, 0x00, 0x00]).unwrap();
    let mut buf = [0u8; 16];
    assert!(matches!(raw.read(&mut buf), Ok(0) | Err(_)));

    let mut out = Vec::new();
    run_demo(&mut tls, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), DEMO_OUTPUT);

    // The plaintext listener keeps accepting
    let mut plain = connect(&server, TransportKind::Plaintext);
    assert_eq!(plain.get("baz").unwrap(), "red");
}

#[test]
fn test_failed_handshake_does_not_stop_encrypted_listener() {
    let server = start_server();
    let addr = server.addr(TransportKind::Encrypted).unwrap();

    // Trusting only the leaf, not its issuer, must fail verification
    let untrusted = ClientConfig::builder()
        .host(addr.ip().to_string())
        .port(addr.port())
        .mode(TransportKind::Encrypted)
        .ca_path(certs_dir().join("server.pem"))
        .build();
    assert!(Client::connect(&untrusted).is_err());

    // Plaintext bytes against the TLS port
    let mut raw = TcpStream::connect(addr).unwrap();
    raw.write_all(b"definitely not a client hello").unwrap();
    let mut buf = [0u8; 64];
    let _ = raw.read(&mut buf);
    drop(raw);

    let mut tls = connect(&server, TransportKind::Encrypted);
    tls.put("after", "handshake failures").unwrap();
    assert_eq!(tls.get("after").unwrap(), "handshake failures");
}

// =============================================================================
// Startup
// =============================================================================

#[test]
fn test_bad_credentials_leave_plaintext_listener_running() {
    let dir = tempfile::tempdir().unwrap();
    let cert = dir.path().join("server.pem");
    let key = dir.path().join("server.key");
    std::fs::write(&cert, "not a certificate").unwrap();
    std::fs::write(&key, "not a key").unwrap();

    let config = Config::builder()
        .plaintext_port(0)
        .encrypted_port(0)
        .tls(TlsCredentials::new(&cert, &key))
        .build();
    let server = Server::new(config).start().unwrap();

    assert!(server.addr(TransportKind::Encrypted).is_none());
    assert_eq!(server.listeners().len(), 1);

    let mut client = connect(&server, TransportKind::Plaintext);
    client.put("k", "v").unwrap();
    assert_eq!(client.get("k").unwrap(), "v");
}

#[test]
fn test_no_tls_configured_starts_plaintext_only() {
    let config = Config::builder().plaintext_port(0).build();
    let server = Server::new(config).start().unwrap();

    assert!(server.addr(TransportKind::Plaintext).is_some());
    assert!(server.addr(TransportKind::Encrypted).is_none());
}

#[test]
fn test_start_fails_when_no_listener_can_bind() {
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();

    let config = Config::builder().plaintext_port(port).build();
    let result = Server::new(config).start();

    assert!(matches!(result, Err(KvError::Config(_))));
}

#[test]
fn test_encrypted_client_requires_trust_anchor() {
    let config = ClientConfig::builder()
        .mode(TransportKind::Encrypted)
        .port(1)
        .build();

    assert!(matches!(Client::connect(&config), Err(KvError::Config(_))));
}

#[test]
fn test_shared_handler_is_injected() {
    let handler = std::sync::Arc::new(dualkv::Handler::new());
    handler.store().put("preloaded", "yes");

    let config = Config::builder()
        .plaintext_port(0)
        .encrypted_port(0)
        .tls(dev_credentials())
        .build();
    let server = Server::with_handler(config, std::sync::Arc::clone(&handler));
    let running = server.start().unwrap();

    let mut tls = connect(&running, TransportKind::Encrypted);
    assert_eq!(tls.get("preloaded").unwrap(), "yes");
    tls.put("written", "remotely").unwrap();
    assert_eq!(handler.store().get("written").unwrap(), "remotely");
}
