//! Live connections and their readiness interest.
//!
//! This is the only code that registers, re-registers or deregisters a
//! client socket. Each connection holds exactly one interest at a time.

use std::collections::HashMap;

use anyhow::Context;
use mio::net::TcpStream;
use mio::{Interest, Token};
use tracing::{debug, warn};

use crate::config::Limits;
use crate::http::connection::{Connection, Next};

struct Entry {
    conn: Connection<TcpStream>,
    interest: Interest,
}

pub struct Registry {
    registry: mio::Registry,
    entries: HashMap<Token, Entry>,
    first_token: usize,
    next_token: usize,
}

impl Registry {
    /// `first_token` must be above every token reserved by the caller.
    pub fn new(registry: mio::Registry, first_token: usize) -> Self {
        Self {
            registry,
            entries: HashMap::new(),
            first_token,
            next_token: first_token,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get_mut(&mut self, token: Token) -> Option<&mut Connection<TcpStream>> {
        self.entries.get_mut(&token).map(|entry| &mut entry.conn)
    }

    /// Registers a freshly accepted socket for read interest.
    pub fn begin_read(&mut self, stream: TcpStream, limits: Limits) -> anyhow::Result<Token> {
        let token = self.allocate();
        let mut conn = Connection::new(stream, limits);

        self.registry
            .register(conn.stream_mut(), token, Interest::READABLE)
            .context("registering connection for read interest")?;

        self.entries.insert(
            token,
            Entry {
                conn,
                interest: Interest::READABLE,
            },
        );
        Ok(token)
    }

    /// Swaps a connection's read interest for write interest.
    pub fn switch_to_write(&mut self, token: Token) -> anyhow::Result<()> {
        self.reregister(token, Interest::WRITABLE)
            .context("switching connection to write interest")
    }

    /// Re-arms write interest so a connection that is still writable gets
    /// another wake for its next chunk.
    pub fn rearm_write(&mut self, token: Token) -> anyhow::Result<()> {
        self.reregister(token, Interest::WRITABLE)
            .context("re-arming write interest")
    }

    /// Deregisters and drops the connection, closing its socket and any open
    /// file. Unknown tokens are ignored.
    pub fn finish(&mut self, token: Token) {
        let Some(mut entry) = self.entries.remove(&token) else {
            return;
        };

        if let Err(e) = self.registry.deregister(entry.conn.stream_mut()) {
            warn!(token = token.0, error = %e, "deregister failed");
        }
        debug!(token = token.0, open = self.entries.len(), "connection closed");
    }

    /// Applies the outcome of a wake to the connection's registration.
    pub fn apply(&mut self, token: Token, next: Next) -> anyhow::Result<()> {
        match next {
            Next::Read => Ok(()),
            Next::Write => match self.entries.get(&token).map(|entry| entry.interest) {
                Some(interest) if interest == Interest::READABLE => self.switch_to_write(token),
                Some(_) => self.rearm_write(token),
                None => Ok(()),
            },
            Next::Close => {
                self.finish(token);
                Ok(())
            }
        }
    }

    fn reregister(&mut self, token: Token, interest: Interest) -> std::io::Result<()> {
        let Some(entry) = self.entries.get_mut(&token) else {
            return Ok(());
        };

        self.registry
            .reregister(entry.conn.stream_mut(), token, interest)?;
        entry.interest = interest;
        Ok(())
    }

    fn allocate(&mut self) -> Token {
        while self.entries.contains_key(&Token(self.next_token)) {
            self.bump();
        }
        let token = Token(self.next_token);
        self.bump();
        token
    }

    fn bump(&mut self) {
        self.next_token = match self.next_token.checked_add(1) {
            Some(next) if next < usize::MAX => next,
            _ => self.first_token,
        };
    }
}
