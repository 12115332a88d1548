//! Listening-socket bootstrap: the one corner of transport setup the core
//! doesn't treat as a pure filesystem/OS abstraction (§1 scope note).
//!
//! `mio::net::TcpListener::bind` offers no hook to set `SO_REUSEADDR` before
//! `bind(2)`, so the listener is built through `socket2` instead and handed
//! back as a `mio` type once it's ready to register with the poller.

use std::io;
use std::net::SocketAddr;

use mio::net::{TcpListener, TcpStream};
use socket2::{Domain, Socket, Type};

/// Binds `addr`, setting `SO_REUSEADDR` and a `listen(2)` backlog of
/// `backlog` (§6 "Listen endpoint"), and returns a non-blocking listener
/// ready to register with the reactor's poller.
pub fn bind_listener(addr: SocketAddr, backlog: u32) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, None)?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog as i32)?;
    socket.set_nonblocking(true)?;

    Ok(TcpListener::from_std(socket.into()))
}

/// Sets `SO_REUSEADDR` on a freshly-accepted connection socket.
///
/// The reference implementation does this on every accepted socket, not
/// just the listener (§4.9) — on an already-connected socket the option has
/// no observable effect, since it only influences a future `bind(2)`, but
/// it's preserved here for behavioral fidelity rather than silently
/// dropped (see DESIGN.md).
pub fn configure_accepted(stream: &TcpStream) -> io::Result<()> {
    socket2::SockRef::from(stream).set_reuse_address(true)
}
