//! Connection slot (§3): per-socket state carried across the reactor/worker
//! handoff — the read/write buffers, the request parser, and (once a
//! [`Verdict::FileRequest`] has been resolved) the memory-mapped body and
//! its send progress.

use std::io::{self, ErrorKind, Read};
use std::net::SocketAddr;
use std::os::unix::io::{AsRawFd, RawFd};

use memmap2::Mmap;
use mio::net::TcpStream;
use mio::{Interest, Registry, Token};

use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::parser::request::RequestParser;
use crate::parser::Verdict;
use crate::response::build_response;
use crate::writer::{ResponseSend, WriteOutcome};

/// Outcome of draining the socket into the read buffer (§4.9, §7).
#[derive(Debug)]
pub enum DrainOutcome {
    /// The kernel has no more buffered right now; parse what's there.
    HaveData,
    /// A zero-length read: the peer performed an orderly shutdown.
    PeerClosed,
    /// The read buffer filled up without ever completing a request
    /// (§7, "Capacity exceeded on buffers"). The caller must abort the
    /// connection without emitting a partial response.
    Exhausted,
    /// An unrecoverable transport error (§7, "Transport errors").
    Error(io::Error),
}

/// Per-connection state, keyed externally by [`Connection::token`] (the
/// socket's raw descriptor, per §3's "indexed by the socket descriptor").
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    read: ReadBuffer,
    parser: RequestParser,
    write: WriteBuffer,
    mmap: Option<Mmap>,
    send: ResponseSend,
    /// Whether the connection should be reinitialized for reuse (true) or
    /// closed (false) once the staged response has been fully sent.
    linger: bool,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Connection {
            stream,
            peer,
            read: ReadBuffer::new(),
            parser: RequestParser::new(),
            write: WriteBuffer::new(),
            mmap: None,
            send: ResponseSend::new(),
            linger: false,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn fd(&self) -> RawFd {
        self.stream.as_raw_fd()
    }

    /// The token this connection is (re)registered under: its own
    /// descriptor, so the slot table and the poller agree on an index
    /// without a separate allocator (§3).
    pub fn token(&self) -> Token {
        Token(self.fd() as usize)
    }

    /// Registers for read-readiness. `mio` has no `EPOLLONESHOT` flag to
    /// request directly (§4.1's one-shot semantics are emulated, not
    /// native): a connection is reregistered, never left registered across
    /// a dispatch, and the slot table's per-slot mutex (see [`crate::slots`])
    /// is the actual backstop if a duplicate edge-triggered event ever
    /// slips through before that reregistration happens.
    pub fn register(&mut self, registry: &Registry) -> io::Result<()> {
        registry.register(&mut self.stream, self.token(), Interest::READABLE)
    }

    pub fn reregister_read(&mut self, registry: &Registry) -> io::Result<()> {
        registry.reregister(&mut self.stream, self.token(), Interest::READABLE)
    }

    pub fn reregister_write(&mut self, registry: &Registry) -> io::Result<()> {
        registry.reregister(&mut self.stream, self.token(), Interest::WRITABLE)
    }

    pub fn deregister(&mut self, registry: &Registry) -> io::Result<()> {
        registry.deregister(&mut self.stream)
    }

    /// Drains the socket into the read buffer until `WouldBlock` or a
    /// zero-byte read (§4.9). Resumable: bytes already buffered from a
    /// prior partial request are never discarded, so a request split
    /// across any number of read events parses identically to one
    /// delivered whole (§8 invariant 5).
    pub fn drain_read(&mut self) -> DrainOutcome {
        loop {
            if self.read.is_full() {
                return DrainOutcome::Exhausted;
            }
            match self.stream.read(self.read.spare_capacity()) {
                Ok(0) => return DrainOutcome::PeerClosed,
                Ok(n) => self.read.mark_filled(n),
                Err(e) if e.kind() == ErrorKind::WouldBlock => return DrainOutcome::HaveData,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return DrainOutcome::Error(e),
            }
        }
    }

    /// Drives the request parser (C5) over whatever has been read so far.
    pub fn parse(&mut self) -> Verdict {
        let read_idx = self.read.read_idx();
        self.parser.advance(self.read.filled_mut(), read_idx)
    }

    pub fn request_path(&self) -> &str {
        &self.parser.request().path
    }

    pub fn keep_alive_requested(&self) -> bool {
        self.parser.request().keep_alive
    }

    /// Stages a resolved body (C6's success path) for the scatter writer
    /// and formats headers into the write buffer (C7). `keep_alive` decides
    /// both the `Connection:` header and whether [`Connection::complete_write`]
    /// reinitializes the slot or signals closure.
    pub fn stage_response(
        &mut self,
        verdict: Verdict,
        content_length: usize,
        mmap: Option<Mmap>,
        keep_alive: bool,
    ) -> Result<(), crate::buffer::Overflow> {
        build_response(&mut self.write, verdict, content_length, keep_alive)?;
        self.mmap = mmap;
        self.send = ResponseSend::new();
        self.linger = keep_alive;
        Ok(())
    }

    /// Runs the scatter writer (C8) to exhaustion for this readiness event:
    /// repeatedly attempts a vectored write until the kernel applies
    /// backpressure, the response completes, or it fails.
    pub fn drive_write(&mut self) -> WriteOutcome {
        loop {
            let header = self.write.as_slice();
            let body: &[u8] = self.mmap.as_deref().unwrap_or(&[]);
            match self.send.write_once(&mut self.stream, header, body) {
                WriteOutcome::Progress => continue,
                other => return other,
            }
        }
    }

    /// Whether this connection should be kept open for another request
    /// once the current response finishes sending.
    pub fn lingers(&self) -> bool {
        self.linger
    }

    /// Releases the memory map (§3 invariant 4) and resets all per-request
    /// state ahead of reuse (§3 Lifecycle).
    pub fn reset_for_reuse(&mut self) {
        self.mmap = None;
        self.read.reset();
        self.write.reset();
        self.parser.reset();
        self.send = ResponseSend::new();
        self.linger = false;
    }
}
