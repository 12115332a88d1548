//! Configuration surface (C10).
//!
//! `server <port>` is the only input the reference implementation accepted;
//! everything else here is a defaulted flag that reproduces a previously
//! hard-coded constant when left unset.

use std::net::{AddrParseError, Ipv4Addr};
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::error::StartupError;
use crate::{DEFAULT_BACKLOG, DEFAULT_MAX_CONNECTIONS, DEFAULT_WORKERS};

#[derive(Debug, Parser)]
#[command(name = "server", about = "A non-blocking HTTP/1.1 static file server")]
pub struct Cli {
    /// Port to listen on.
    pub port: u16,

    /// Directory served as document root.
    #[arg(long, default_value = "./www")]
    pub doc_root: PathBuf,

    /// IPv4 address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Number of worker threads.
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Maximum number of simultaneous connections.
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: usize,

    /// `listen(2)` backlog.
    #[arg(long, default_value_t = DEFAULT_BACKLOG)]
    pub backlog: u32,
}

/// Validated configuration the reactor is built from.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub doc_root: PathBuf,
    pub bind: Ipv4Addr,
    pub workers: usize,
    pub max_connections: usize,
    pub backlog: u32,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, StartupError> {
        let bind: Ipv4Addr = cli
            .bind
            .parse()
            .map_err(|source: AddrParseError| StartupError::InvalidBindAddress {
                addr: cli.bind.clone(),
                source,
            })?;

        if !is_directory(&cli.doc_root) {
            return Err(StartupError::InvalidDocRoot(cli.doc_root));
        }
        if cli.workers == 0 {
            return Err(StartupError::ZeroWorkers);
        }
        if cli.max_connections == 0 {
            return Err(StartupError::ZeroMaxConnections);
        }

        Ok(Config {
            port: cli.port,
            doc_root: cli.doc_root,
            bind,
            workers: cli.workers,
            max_connections: cli.max_connections,
            backlog: cli.backlog,
        })
    }
}

fn is_directory(path: &Path) -> bool {
    path.metadata().map(|m| m.is_dir()).unwrap_or(false)
}
