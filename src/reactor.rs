//! Reactor loop (C9): the orchestrator tying the readiness multiplexer
//! (C1/`mio`), the connection slot table (C3), and the worker pool (C2)
//! together.
//!
//! Only one thread ever calls [`Poll::poll`] or touches the listening
//! socket; everything else — parsing, resolving, building a response — runs
//! on a worker, synchronized with the reactor purely by one-shot
//! readiness (§5).

use std::io::{self, ErrorKind};
use std::net::SocketAddr;
use std::os::unix::io::AsRawFd;
use std::sync::Arc;

use mio::net::TcpListener;
use mio::{Events, Interest, Registry, Token};
use tracing::{debug, error, info, trace, warn};

use crate::config::Config;
use crate::connection::{Connection, DrainOutcome};
use crate::error::StartupError;
use crate::net::{bind_listener, configure_accepted};
use crate::parser::Verdict;
use crate::resolver::resolve;
use crate::slots::SlotTable;
use crate::writer::WriteOutcome;
use crate::workerpool::WorkerPool;

/// The listening socket's fixed token; connection tokens are derived from
/// their own descriptor and can never collide with it in practice (fd 0 is
/// never a socket), but `usize::MAX` makes the distinction unambiguous
/// regardless.
const LISTEN_TOKEN: Token = Token(usize::MAX);

pub struct Reactor {
    poll: mio::Poll,
    listener: TcpListener,
    registry: Registry,
    slots: Arc<SlotTable>,
    pool: WorkerPool,
    doc_root: Arc<std::path::PathBuf>,
}

impl Reactor {
    pub fn new(config: &Config) -> Result<Self, StartupError> {
        let addr = SocketAddr::new(config.bind.into(), config.port);
        let mut listener = bind_listener(addr, config.backlog)
            .map_err(|source| StartupError::Bind { addr: addr.to_string(), source })?;

        let poll = mio::Poll::new().map_err(StartupError::Poll)?;
        poll.registry()
            .register(&mut listener, LISTEN_TOKEN, Interest::READABLE)
            .map_err(StartupError::Poll)?;
        let registry = poll
            .registry()
            .try_clone()
            .map_err(StartupError::Poll)?;

        let pool = WorkerPool::new(config.workers).map_err(StartupError::WorkerSpawn)?;

        info!(%addr, workers = config.workers, max_connections = config.max_connections, "listening");

        Ok(Reactor {
            poll,
            listener,
            registry,
            slots: Arc::new(SlotTable::new(config.max_connections)),
            pool,
            doc_root: Arc::new(config.doc_root.clone()),
        })
    }

    /// The address actually bound, useful when `port: 0` let the OS pick one
    /// (e.g. in tests driving the server over a real loopback socket).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the blocking wait/dispatch loop forever. Only returns on an
    /// unrecoverable polling error.
    pub fn run(&mut self) -> io::Result<()> {
        let mut events = Events::with_capacity(crate::MAX_EVENTS);

        loop {
            self.poll.poll(&mut events, None)?;

            for event in events.iter() {
                if event.token() == LISTEN_TOKEN {
                    self.accept();
                    continue;
                }

                let fd = event.token().0;
                trace!(fd, readable = event.is_readable(), writable = event.is_writable(), "event");

                if event.is_read_closed() || event.is_error() {
                    self.close(fd);
                    continue;
                }

                if event.is_writable() {
                    self.handle_writable(fd);
                    continue;
                }

                if event.is_readable() {
                    self.handle_readable(fd);
                }
            }
        }
    }

    fn accept(&self) {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    if let Err(e) = configure_accepted(&stream) {
                        warn!(%peer, error = %e, "failed to configure accepted socket");
                    }

                    let fd = stream.as_raw_fd();
                    if self.slots.is_full() {
                        warn!(%peer, "connection slot table full, rejecting");
                        drop(stream);
                        continue;
                    }

                    let mut conn = Connection::new(stream, peer);
                    if let Err(e) = conn.register(&self.registry) {
                        warn!(%peer, error = %e, "failed to register accepted socket");
                        continue;
                    }

                    if !self.slots.try_insert(fd as usize, conn) {
                        warn!(%peer, fd, "slot already occupied, dropping connection");
                        continue;
                    }

                    debug!(%peer, fd, "accepted");
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => return,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    return;
                }
            }
        }
    }

    fn handle_readable(&self, fd: usize) {
        let outcome = self.slots.with_slot(fd, |conn| conn.drain_read());
        let Some(outcome) = outcome else { return };

        match outcome {
            DrainOutcome::PeerClosed => self.close(fd),
            DrainOutcome::Exhausted => {
                warn!(fd, "read buffer exhausted before a complete request");
                self.close(fd);
            }
            DrainOutcome::Error(e) => {
                warn!(fd, error = %e, "read failed");
                self.close(fd);
            }
            DrainOutcome::HaveData => {
                let slots = Arc::clone(&self.slots);
                let registry = self
                    .registry
                    .try_clone()
                    .expect("registry clone should not fail after successful construction");
                let doc_root = Arc::clone(&self.doc_root);

                if self
                    .pool
                    .submit(move || process(fd, &slots, &registry, &doc_root))
                    .is_err()
                {
                    error!(fd, "worker pool stopped; dropping connection");
                }
            }
        }
    }

    fn handle_writable(&self, fd: usize) {
        let outcome = self.slots.with_slot(fd, |conn| conn.drive_write());
        let Some(outcome) = outcome else { return };

        match outcome {
            WriteOutcome::WouldBlock => {
                if self
                    .slots
                    .with_slot(fd, |conn| conn.reregister_write(&self.registry))
                    .is_none()
                {
                    self.close(fd);
                }
            }
            WriteOutcome::Complete => {
                let lingers = self.slots.with_slot(fd, |conn| conn.lingers()).unwrap_or(false);
                if lingers {
                    let rearmed = self.slots.with_slot(fd, |conn| {
                        conn.reset_for_reuse();
                        conn.reregister_read(&self.registry)
                    });
                    match rearmed {
                        Some(Ok(())) => debug!(fd, "response sent, connection reused"),
                        _ => self.close(fd),
                    }
                } else {
                    debug!(fd, "response sent, closing");
                    self.close(fd);
                }
            }
            WriteOutcome::Failed | WriteOutcome::Progress => self.close(fd),
        }
    }

    fn close(&self, fd: usize) {
        self.slots.with_slot(fd, |conn| {
            let _ = conn.deregister(&self.registry);
        });
        self.slots.close(fd);
    }
}

/// Runs on a worker thread: drives the request parser, and on a complete
/// request, the resolver and response builder, then rearms for write.
///
/// Takes `fd`/`slots`/`registry`/`doc_root` rather than a `&mut Connection`
/// directly since the connection lives behind the slot table's lock for the
/// duration of this call only — one-shot readiness guarantees no other
/// thread is touching it meanwhile (§5), but the lock still has to be
/// (re)acquired explicitly because the job is `'static`.
fn process(fd: usize, slots: &SlotTable, registry: &Registry, doc_root: &std::path::Path) {
    let verdict = slots.with_slot(fd, |conn| conn.parse());
    let Some(verdict) = verdict else { return };

    match verdict {
        Verdict::NoRequest => {
            let rearmed = slots.with_slot(fd, |conn| conn.reregister_read(registry));
            if !matches!(rearmed, Some(Ok(()))) {
                drop_connection(fd, slots, registry);
            }
        }
        Verdict::BadRequest => {
            let len = crate::response::error_body(Verdict::BadRequest).len();
            stage_and_rearm(fd, slots, registry, Verdict::BadRequest, len, None, false);
        }
        Verdict::GetRequest => {
            let path = slots.with_slot(fd, |conn| conn.request_path().to_string());
            let keep_alive = slots.with_slot(fd, |conn| conn.keep_alive_requested()).unwrap_or(false);
            let Some(path) = path else { return };

            match resolve(doc_root, &path) {
                Ok(mmap) => {
                    let len = mmap.len();
                    stage_and_rearm(fd, slots, registry, Verdict::FileRequest, len, Some(mmap), keep_alive);
                }
                Err(v) => {
                    let len = crate::response::error_body(v).len();
                    stage_and_rearm(fd, slots, registry, v, len, None, false);
                }
            }
        }
        // The parser itself never yields these; they only arise from the
        // resolver path above, handled inline.
        Verdict::NoResource | Verdict::ForbiddenRequest | Verdict::FileRequest | Verdict::InternalError => {
            let len = crate::response::error_body(Verdict::InternalError).len();
            stage_and_rearm(fd, slots, registry, Verdict::InternalError, len, None, false);
        }
    }
}

fn stage_and_rearm(
    fd: usize,
    slots: &SlotTable,
    registry: &Registry,
    verdict: Verdict,
    content_length: usize,
    mmap: Option<memmap2::Mmap>,
    keep_alive: bool,
) {
    let staged = slots.with_slot(fd, |conn| conn.stage_response(verdict, content_length, mmap, keep_alive));
    match staged {
        Some(Ok(())) => {
            let rearmed = slots.with_slot(fd, |conn| conn.reregister_write(registry));
            if !matches!(rearmed, Some(Ok(()))) {
                drop_connection(fd, slots, registry);
            }
        }
        _ => drop_connection(fd, slots, registry),
    }
}

fn drop_connection(fd: usize, slots: &SlotTable, registry: &Registry) {
    slots.with_slot(fd, |conn| {
        let _ = conn.deregister(registry);
    });
    slots.close(fd);
}
