use std::net::SocketAddr;

use anyhow::Context;
use mio::net::TcpListener;
use socket2::{Domain, Protocol, Socket, Type};
use tracing::info;

use crate::config::{Config, ServerConfig};
use crate::server::event_loop::EventLoop;

/// Creates the non-blocking listening socket with `SO_REUSEADDR` and the
/// configured backlog.
pub fn bind(cfg: &ServerConfig) -> anyhow::Result<TcpListener> {
    let addr: SocketAddr = cfg
        .listen_addr()
        .parse()
        .with_context(|| format!("invalid listen address {}", cfg.listen_addr()))?;

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .context("creating listening socket")?;
    socket
        .set_reuse_address(true)
        .context("setting SO_REUSEADDR")?;
    socket
        .set_nonblocking(true)
        .context("making listening socket non-blocking")?;
    socket
        .bind(&addr.into())
        .with_context(|| format!("binding {addr}"))?;
    let backlog = i32::try_from(cfg.backlog).unwrap_or(i32::MAX);
    socket.listen(backlog).context("listening")?;

    let listener = TcpListener::from_std(socket.into());
    info!("Listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Binds the configured address and serves forever.
pub fn run(cfg: &Config) -> anyhow::Result<()> {
    let mut event_loop = EventLoop::bind(cfg)?;
    event_loop.run()
}
