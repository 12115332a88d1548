//! A single-process, non-blocking HTTP/1.1 static file server.
//!
//! The server is built on a reactor: one thread multiplexes socket readiness
//! ([`reactor`]) and hands complete units of work to a fixed [`workerpool`].
//! Workers drive the two-level HTTP parser ([`parser`]) over a connection's
//! fixed-size buffers ([`connection`]), resolve the request against the
//! filesystem ([`resolver`]), stage a response ([`response`]), and the
//! reactor retires it with a vectored write ([`writer`]).

pub mod buffer;
pub mod config;
pub mod connection;
pub mod error;
pub mod net;
pub mod parser;
pub mod reactor;
pub mod resolver;
pub mod response;
pub mod slots;
pub mod workerpool;
pub mod writer;

/// Capacity of a connection's read buffer, in bytes.
pub const READ_BUFFER_SIZE: usize = 2048;
/// Capacity of a connection's write buffer, in bytes.
pub const WRITE_BUFFER_SIZE: usize = 1024;
/// Upper bound on a resolved filesystem path, in bytes.
pub const MAX_PATH_LEN: usize = 200;
/// Maximum batch size returned by a single readiness wait.
pub const MAX_EVENTS: usize = 10_000;
/// `listen(2)` backlog default.
pub const DEFAULT_BACKLOG: u32 = 5;
/// Worker pool size default.
pub const DEFAULT_WORKERS: usize = 4;
/// Connection slot table size default.
pub const DEFAULT_MAX_CONNECTIONS: usize = 65536;
