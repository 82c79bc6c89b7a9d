//! Connection
//!
//! Owns the single TCP stream to the cache server.

use std::io::{self, BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::Config;
use crate::error::{McError, Result};
use crate::protocol::{read_packet, read_packets_while, write_request, Opcode, Packet};

/// A lazily connected, strictly synchronous stream to one server
///
/// ## Concurrency:
/// One request is in flight at a time and responses are paired with
/// requests by order alone, so every method takes `&mut self`. Share a
/// `Connection` between threads only behind a lock (see
/// [`Client`](crate::Client)).
///
/// ## Failure handling:
/// A read that times out, hits EOF or fails mid-frame leaves the stream
/// position unknown. The stream is dropped in that case and the next call
/// reconnects. Protocol-level errors keep the stream.
pub struct Connection {
    /// Target `host:port`
    addr: String,

    /// Default bound on the TCP handshake
    connect_timeout: Option<Duration>,

    /// Disable Nagle's algorithm once connected
    nodelay: bool,

    /// Live stream, `None` while unconnected
    stream: Option<Stream>,
}

/// Buffered halves of one TCP stream
struct Stream {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Connection {
    /// Create an unconnected handle for the configured server
    pub fn new(config: &Config) -> Self {
        Self {
            addr: config.addr(),
            connect_timeout: config.connect_timeout(),
            nodelay: config.nodelay,
            stream: None,
        }
    }

    /// Target address
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Open the stream if there is none
    ///
    /// A no-op returning `true` when already connected. `timeout` bounds the
    /// handshake and falls back to the configured connect timeout.
    pub fn connect(&mut self, timeout: Option<Duration>) -> Result<bool> {
        if self.stream.is_some() {
            return Ok(true);
        }

        let stream = self
            .open(timeout.or(self.connect_timeout))
            .and_then(|stream| {
                stream.set_nodelay(self.nodelay)?;
                Stream::split(stream)
            })
            .map_err(|e| McError::Connect {
                addr: self.addr.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!("Connected to {}", self.addr);
        self.stream = Some(stream);
        Ok(true)
    }

    /// Drop the stream; the next call reconnects
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Closed connection to {}", self.addr);
        }
    }

    /// Send one request and wait for its response
    ///
    /// The response status is not inspected here.
    pub fn send_command(&mut self, packet: &Packet, timeout: Option<Duration>) -> Result<Packet> {
        reject_quiet(packet)?;
        self.prepare(timeout)?;
        tracing::trace!(
            opcode = opcode_name(packet.opcode),
            key_len = packet.key.len(),
            body_len = packet.body_len(),
            "Sending request to {}",
            self.addr
        );

        let outcome = match self.stream.as_mut() {
            Some(stream) => stream.exchange(packet),
            None => return Err(self.send_error("not connected")),
        };

        match outcome {
            Ok(Some(response)) => {
                tracing::trace!(
                    opcode = opcode_name(response.opcode),
                    status = response.status,
                    body_len = response.body_len(),
                    "Received response from {}",
                    self.addr
                );
                Ok(response)
            }
            Ok(None) => {
                let reason = "no bytes received before the stream closed".to_string();
                Err(self.abandon(reason))
            }
            Err(e) => Err(self.transport_failure(e, timeout)),
        }
    }

    /// Send one request and read responses until `keep_reading` returns
    /// `false`
    ///
    /// Every response is status-checked before it reaches `keep_reading`; a
    /// nonzero status ends the exchange with [`McError::Protocol`]. Returns
    /// the number of responses read.
    pub fn send_and_collect<F>(
        &mut self,
        packet: &Packet,
        timeout: Option<Duration>,
        keep_reading: F,
    ) -> Result<usize>
    where
        F: FnMut(Packet) -> bool,
    {
        reject_quiet(packet)?;
        self.prepare(timeout)?;
        tracing::trace!(
            opcode = opcode_name(packet.opcode),
            "Sending multi-response request to {}",
            self.addr
        );

        let outcome = match self.stream.as_mut() {
            Some(stream) => stream.collect(packet, keep_reading),
            None => return Err(self.send_error("not connected")),
        };

        outcome.map_err(|e| self.transport_failure(e, timeout))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Connect on demand and apply the per-call timeout
    fn prepare(&mut self, timeout: Option<Duration>) -> Result<()> {
        if let Err(e) = self.connect(None) {
            return Err(self.send_error(&e.to_string()));
        }

        let applied = match self.stream.as_ref() {
            Some(stream) => stream.set_timeouts(timeout),
            None => return Err(self.send_error("not connected")),
        };
        applied.map_err(|e| self.abandon(e.to_string()))
    }

    fn open(&self, timeout: Option<Duration>) -> io::Result<TcpStream> {
        let timeout = match timeout {
            Some(timeout) => timeout,
            None => return TcpStream::connect(&self.addr),
        };

        // connect_timeout takes a single address, so try each resolved one
        let mut last_error = None;
        for addr in self.addr.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "address resolved to nothing")
        }))
    }

    /// Map a failed exchange to the caller-facing error, dropping the stream
    /// when its read position can no longer be trusted
    fn transport_failure(&mut self, error: McError, timeout: Option<Duration>) -> McError {
        match error {
            McError::Io(ref e)
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
            {
                let waited = timeout.map(|t| format!("{:?}", t)).unwrap_or_default();
                self.abandon(format!("timed out after {}", waited))
            }
            McError::Io(e) => self.abandon(e.to_string()),
            McError::MalformedPacket(reason) => {
                tracing::warn!("Dropping connection to {}: {}", self.addr, reason);
                self.stream = None;
                McError::MalformedPacket(reason)
            }
            other => other,
        }
    }

    /// Drop the stream and report a send failure
    fn abandon(&mut self, reason: String) -> McError {
        tracing::warn!("Dropping connection to {}: {}", self.addr, reason);
        self.stream = None;
        self.send_error(&reason)
    }

    fn send_error(&self, reason: &str) -> McError {
        McError::Send {
            addr: self.addr.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Quiet opcodes answer only on failure, so waiting for a reply would hang
fn reject_quiet(packet: &Packet) -> Result<()> {
    match packet.kind() {
        Some(opcode) if opcode.is_quiet() => Err(McError::InvalidArgument(format!(
            "quiet opcode {} cannot be sent on a synchronous connection",
            opcode.name()
        ))),
        _ => Ok(()),
    }
}

fn opcode_name(code: u8) -> &'static str {
    Opcode::from_u8(code).map_or("UNKNOWN", |opcode| opcode.name())
}

impl Stream {
    /// Split a connected stream into buffered reader and writer halves
    fn split(stream: TcpStream) -> io::Result<Self> {
        let read_stream = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    fn set_timeouts(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.reader.get_ref().set_read_timeout(timeout)?;
        self.writer.get_ref().set_write_timeout(timeout)?;
        Ok(())
    }

    fn exchange(&mut self, packet: &Packet) -> Result<Option<Packet>> {
        write_request(&mut self.writer, packet)?;
        read_packet(&mut self.reader)
    }

    fn collect<F>(&mut self, packet: &Packet, mut keep_reading: F) -> Result<usize>
    where
        F: FnMut(Packet) -> bool,
    {
        write_request(&mut self.writer, packet)?;
        read_packets_while(&mut self.reader, |response| {
            let response = response.ensure_success()?;
            Ok(keep_reading(response))
        })
    }
}
