//! The single-threaded readiness loop.
//!
//! One `mio::Poll` watches the listening socket and every live connection.
//! Each wait returns a batch of events; all of them are handled before the
//! next wait. Only this thread ever touches a connection, so nothing is
//! locked.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token};
use tracing::{debug, error, info};

use crate::config::{Config, Limits};
use crate::http::connection::{ConnectionState, Next};
use crate::routes::Router;
use crate::server::listener;
use crate::server::registry::Registry;

/// Token of the listening socket. Connection tokens start above it.
pub const LISTENER: Token = Token(0);

#[derive(Debug, Clone, Copy)]
struct Readiness {
    token: Token,
    readable: bool,
    writable: bool,
}

pub struct EventLoop {
    poll: Poll,
    events: Events,
    ready: Vec<Readiness>,
    listener: TcpListener,
    registry: Registry,
    router: Router,
    limits: Limits,
}

impl EventLoop {
    /// Binds the configured address and prepares the loop.
    pub fn bind(cfg: &Config) -> anyhow::Result<Self> {
        let listener = listener::bind(&cfg.server)?;
        Self::new(listener, cfg)
    }

    pub fn new(mut listener: TcpListener, cfg: &Config) -> anyhow::Result<Self> {
        let poll = Poll::new().context("creating poll instance")?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)
            .context("registering listening socket")?;
        let registry = poll
            .registry()
            .try_clone()
            .context("cloning poll registry")?;

        Ok(Self {
            events: Events::with_capacity(cfg.server.max_events),
            ready: Vec::with_capacity(cfg.server.max_events),
            registry: Registry::new(registry, LISTENER.0 + 1),
            router: Router::new(cfg),
            limits: cfg.limits,
            listener,
            poll,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Number of connections currently open.
    pub fn connections(&self) -> usize {
        self.registry.len()
    }

    /// Serves until an infrastructure error occurs.
    pub fn run(&mut self) -> anyhow::Result<()> {
        info!("Event loop started");
        loop {
            if let Err(e) = self.turn(None) {
                error!("Event loop stopped: {:#}", e);
                return Err(e);
            }
        }
    }

    /// Waits once (forever when `timeout` is `None`) and handles every
    /// returned event. Returns the number of events handled.
    pub fn turn(&mut self, timeout: Option<Duration>) -> anyhow::Result<usize> {
        match self.poll.poll(&mut self.events, timeout) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(0),
            Err(e) => return Err(e).context("waiting for readiness"),
        }

        self.ready.clear();
        self.ready.extend(self.events.iter().map(|event| Readiness {
            token: event.token(),
            readable: event.is_readable() || event.is_read_closed() || event.is_error(),
            writable: event.is_writable() || event.is_write_closed() || event.is_error(),
        }));

        let ready = std::mem::take(&mut self.ready);
        let handled = ready.len();
        let result = ready
            .iter()
            .try_for_each(|readiness| self.dispatch(*readiness));
        self.ready = ready;

        result.map(|()| handled)
    }

    fn dispatch(&mut self, readiness: Readiness) -> anyhow::Result<()> {
        if readiness.token == LISTENER {
            return self.accept();
        }

        let Some(conn) = self.registry.get_mut(readiness.token) else {
            // Closed earlier in this batch.
            return Ok(());
        };

        let next = match conn.state() {
            ConnectionState::Reading if readiness.readable => conn.on_readable(&mut self.router),
            ConnectionState::Writing(_) if readiness.writable => conn.on_writable(),
            ConnectionState::Closed => Next::Close,
            _ => return Ok(()),
        };

        self.registry.apply(readiness.token, next)
    }

    /// Accepts until the backlog is empty; the listener is edge-triggered.
    fn accept(&mut self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    let token = self.registry.begin_read(stream, self.limits)?;
                    debug!(token = token.0, %peer, "Accepted connection");
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context("accepting connection"),
            }
        }
    }
}
