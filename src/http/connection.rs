use std::io::{self, Read, Write};

use bytes::BytesMut;
use tracing::{debug, warn};

use crate::config::Limits;
use crate::http::parser::decode_request;
use crate::http::response::Response;
use crate::http::writer::{Progress, ResponseWriter};
use crate::routes::Router;

/// One accepted client, from its first byte to teardown.
///
/// Dropping the connection closes the socket and, while streaming, the file.
pub struct Connection<S> {
    stream: S,
    inbound: BytesMut,
    limits: Limits,
    state: ConnectionState,
}

pub enum ConnectionState {
    /// Waiting for the request.
    Reading,
    /// A response is being transmitted.
    Writing(ResponseWriter),
    /// The response is done or abandoned; the connection must be torn down.
    Closed,
}

/// What the event loop has to do with a connection after handling a wake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    /// Keep read interest.
    Read,
    /// Wait for write readiness to continue the response.
    Write,
    /// Tear the connection down.
    Close,
}

impl<S: Read + Write> Connection<S> {
    pub fn new(stream: S, limits: Limits) -> Self {
        Self {
            stream,
            inbound: BytesMut::with_capacity(limits.max_request),
            limits,
            state: ConnectionState::Reading,
        }
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Handles read readiness: one receive, decode, dispatch.
    ///
    /// Buffered responses are sent right away. Streamed responses only set up
    /// the writer; the first chunk goes out on the next write-ready wake.
    pub fn on_readable(&mut self, router: &mut Router) -> Next {
        match self.state {
            ConnectionState::Reading => {}
            ConnectionState::Writing(_) => return Next::Write,
            ConnectionState::Closed => return Next::Close,
        }

        match self.receive() {
            Ok(0) => {
                debug!("peer closed before sending a request");
                self.state = ConnectionState::Closed;
                return Next::Close;
            }
            Ok(n) => debug!(bytes = n, "request received"),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Next::Read,
            Err(e) => {
                debug!(error = %e, "receive failed");
                self.state = ConnectionState::Closed;
                return Next::Close;
            }
        }

        let response = match decode_request(&self.inbound, &self.limits) {
            Ok(request) => router.dispatch(&request),
            Err(e) => {
                debug!(error = %e, status = e.status().as_u16(), "rejecting request");
                Response::error(e.status())
            }
        };

        self.respond(response)
    }

    /// Handles write readiness by advancing the pending response.
    pub fn on_writable(&mut self) -> Next {
        let writer = match &mut self.state {
            ConnectionState::Writing(writer) => writer,
            ConnectionState::Reading => return Next::Read,
            ConnectionState::Closed => return Next::Close,
        };

        match writer.write_to(&mut self.stream) {
            Ok(Progress::Pending) => Next::Write,
            Ok(Progress::Complete) => {
                debug!(bytes = writer.bytes_sent(), "response sent");
                self.state = ConnectionState::Closed;
                Next::Close
            }
            Err(e) => {
                debug!(
                    error = %e,
                    bytes = writer.bytes_sent(),
                    "response abandoned"
                );
                self.state = ConnectionState::Closed;
                Next::Close
            }
        }
    }

    fn respond(&mut self, response: Response) -> Next {
        let streaming = response.is_streaming();
        let writer = match ResponseWriter::new(response, &self.limits) {
            Ok(writer) => writer,
            Err(e) => {
                warn!(error = %e, "response does not fit the session buffers");
                ResponseWriter::unchecked(Response::internal_error(), self.limits.chunk_size)
            }
        };
        self.state = ConnectionState::Writing(writer);

        if streaming {
            return Next::Write;
        }
        self.on_writable()
    }

    /// A single receive of at most `max_request` bytes into `inbound`.
    fn receive(&mut self) -> io::Result<usize> {
        self.inbound.clear();
        self.inbound.resize(self.limits.max_request, 0);

        let result = loop {
            match self.stream.read(&mut self.inbound[..]) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => break other,
            }
        };

        match result {
            Ok(n) => {
                self.inbound.truncate(n);
                Ok(n)
            }
            Err(e) => {
                self.inbound.clear();
                Err(e)
            }
        }
    }
}
