//! Startup error taxonomy (C12).
//!
//! Anything that can keep the server from reaching its main loop is
//! represented here so `main` has one place to turn a failure into a
//! diagnostic and an exit code.

use std::io;
use std::net::AddrParseError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid bind address {addr:?}: {source}")]
    InvalidBindAddress {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    #[error("document root {0:?} does not exist or is not a directory")]
    InvalidDocRoot(PathBuf),

    #[error("worker count must be nonzero")]
    ZeroWorkers,

    #[error("max-connections must be nonzero")]
    ZeroMaxConnections,

    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to create readiness multiplexer: {0}")]
    Poll(#[source] io::Error),

    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] io::Error),

    #[error("reactor loop terminated unexpectedly: {0}")]
    Runtime(#[source] io::Error),
}

impl StartupError {
    /// Every startup failure maps to the same exit code (§6): 1.
    pub const EXIT_CODE: i32 = 1;
}
