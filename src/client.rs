//! Client
//!
//! One connection to one listener, plus the demonstration and interactive
//! drivers used by the `dualkv-client` binary.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

use crate::config::ClientConfig;
use crate::error::{KvError, Result};
use crate::protocol::{read_response, write_request, Request, Response};
use crate::transport::{load_client_tls, ClientStream, TransportKind};

/// A connected DualKV client
pub struct Client {
    stream: BufReader<ClientStream>,
    kind: TransportKind,
}

impl Client {
    /// Open exactly one connection as described by `config`
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let addr = config.addr();
        tracing::debug!("Connecting to {} ({})", addr, config.mode);

        // Credentials first, so a bad trust anchor never opens a socket
        let tls = match config.mode {
            TransportKind::Plaintext => None,
            TransportKind::Encrypted => {
                let ca_path = config.ca_path.as_ref().ok_or_else(|| {
                    KvError::Config("encrypted mode requires a trust anchor (ca_path)".to_string())
                })?;
                Some(load_client_tls(ca_path)?)
            }
        };

        let tcp = TcpStream::connect(&addr)?;
        tcp.set_nodelay(true)?;

        let stream = match tls {
            None => ClientStream::plaintext(tcp),
            Some(tls) => ClientStream::encrypted(tcp, tls, &config.server_name)?,
        };

        Ok(Self {
            stream: BufReader::new(stream),
            kind: config.mode,
        })
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Fetch the value of `key`
    ///
    /// A missing key comes back as `KvError::InvalidOperation`.
    pub fn get(&mut self, key: &str) -> Result<String> {
        match self.call(&Request::get(key))? {
            Response::Value(value) => Ok(value),
            Response::InvalidOperation { why } => Err(KvError::InvalidOperation { why }),
            Response::Done => Err(KvError::Protocol(
                "unexpected DONE in reply to get".to_string(),
            )),
        }
    }

    /// Insert or overwrite `key`
    pub fn put(&mut self, key: &str, value: &str) -> Result<()> {
        match self.call(&Request::put(key, value))? {
            Response::Done => Ok(()),
            Response::InvalidOperation { why } => Err(KvError::InvalidOperation { why }),
            Response::Value(_) => Err(KvError::Protocol(
                "unexpected VALUE in reply to put".to_string(),
            )),
        }
    }

    /// Send one request and wait for its response
    pub fn call(&mut self, request: &Request) -> Result<Response> {
        write_request(self.stream.get_mut(), request)?;
        read_response(&mut self.stream)
    }

    /// Close the connection
    pub fn close(mut self) -> Result<()> {
        self.stream.get_mut().shutdown()
    }
}

/// Print a `get` outcome the way the demo and the REPL do
///
/// Only `InvalidOperation` is recoverable; every other error is returned.
fn report_get<W: Write>(out: &mut W, key: &str, result: Result<String>) -> Result<()> {
    match result {
        Ok(value) => writeln!(out, "\"{}\" -> \"{}\"", key, value)?,
        Err(KvError::InvalidOperation { why }) => writeln!(out, "Invalid operation: \"{}\"", why)?,
        Err(e) => return Err(e),
    }
    Ok(())
}

/// Run the fixed demonstration sequence, printing each `get`
pub fn run_demo<W: Write>(client: &mut Client, out: &mut W) -> Result<()> {
    let foo = client.get("foo");
    report_get(out, "foo", foo)?;

    client.put("bar", "car")?;
    client.put("baz", "green")?;
    client.put("baz", "red")?;

    for key in ["bar", "baz", "foo"] {
        let result = client.get(key);
        report_get(out, key, result)?;
    }

    Ok(())
}

/// First whitespace-delimited word and the trimmed remainder
fn next_word(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.find(char::is_whitespace) {
        Some(end) => (&input[..end], input[end..].trim_start()),
        None => (input, ""),
    }
}

const REPL_HELP: &str = "Commands:\n  get <key>\n  put <key> <value>\n  help\n  quit";

/// Read `get`/`put` commands line by line until EOF or `quit`
pub fn run_interactive<R: BufRead, W: Write>(
    client: &mut Client,
    input: R,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "{}", REPL_HELP)?;

    for line in input.lines() {
        let line = line?;
        let (command, rest) = next_word(&line);
        let (key, value) = next_word(rest);

        match (command, key, value) {
            ("", _, _) => {}
            ("get", key, "") if !key.is_empty() => {
                let result = client.get(key);
                report_get(out, key, result)?;
            }
            ("put", key, value) if !key.is_empty() && !value.is_empty() => {
                client.put(key, value)?;
                writeln!(out, "\"{}\" <- \"{}\"", key, value)?;
            }
            ("help", "", _) => writeln!(out, "{}", REPL_HELP)?,
            ("quit" | "exit", "", _) => break,
            _ => writeln!(out, "Unknown command: {}\n{}", line.trim(), REPL_HELP)?,
        }
        out.flush()?;
    }

    Ok(())
}
