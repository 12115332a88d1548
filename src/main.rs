//! `server <port>`: parses CLI configuration, initializes logging, and runs
//! the reactor until an unrecoverable polling error (§6 Exit codes).

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use rhttpd::config::{Cli, Config};
use rhttpd::error::StartupError;
use rhttpd::reactor::Reactor;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    if let Err(err) = run() {
        error!(error = %err, "startup failed");
        std::process::exit(StartupError::EXIT_CODE);
    }
}

fn run() -> Result<(), StartupError> {
    let config = Config::from_cli(Cli::parse())?;
    let mut reactor = Reactor::new(&config)?;
    reactor.run().map_err(StartupError::Runtime)?;
    Ok(())
}
