use std::io::{self, Write};

use crate::config::Limits;
use crate::http::response::{Body, Response};

const HTTP_VERSION: &str = "HTTP/1.1";

/// Serializes the status line and headers, up to and including the blank line.
pub fn encode_head(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in &resp.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    #[error("response head of {len} bytes exceeds the {max} byte header buffer")]
    HeadTooLarge { len: usize, max: usize },
    #[error("in-memory body of {len} bytes exceeds the {max} byte body buffer")]
    BodyTooLarge { len: usize, max: usize },
}

/// Outcome of one transmission step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The socket stopped accepting bytes, or a streamed chunk went out and
    /// more of the file remains. Call again on the next write-ready wake.
    Pending,
    /// Every byte of the response has been handed to the socket.
    Complete,
}

/// Owns a serialized response head and its body, and pushes them into a
/// non-blocking socket across as many calls as the socket requires.
#[derive(Debug)]
pub struct ResponseWriter {
    head: Vec<u8>,
    head_written: usize,
    body: Body,
    body_written: usize,
    chunk: Vec<u8>,
    chunk_written: usize,
    chunk_size: usize,
}

impl ResponseWriter {
    /// Prepares `response` for transmission, enforcing the session's header
    /// and body buffer capacities.
    pub fn new(response: Response, limits: &Limits) -> Result<Self, WriterError> {
        let head = encode_head(&response);
        if head.len() > limits.max_header {
            return Err(WriterError::HeadTooLarge {
                len: head.len(),
                max: limits.max_header,
            });
        }

        if let Body::Buffered(bytes) = &response.body {
            if bytes.len() > limits.max_body {
                return Err(WriterError::BodyTooLarge {
                    len: bytes.len(),
                    max: limits.max_body,
                });
            }
        }

        Ok(Self::unchecked(response, limits.chunk_size))
    }

    /// Skips the capacity checks. Used for the fixed error descriptors.
    pub(crate) fn unchecked(response: Response, chunk_size: usize) -> Self {
        Self {
            head: encode_head(&response),
            head_written: 0,
            body: response.body,
            body_written: 0,
            chunk: Vec::with_capacity(chunk_size),
            chunk_written: 0,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.body.is_streaming()
    }

    pub fn head_written(&self) -> bool {
        self.head_written == self.head.len()
    }

    /// Body bytes accepted by the socket so far.
    pub fn bytes_sent(&self) -> u64 {
        match &self.body {
            Body::Buffered(_) => self.body_written as u64,
            Body::Streaming(stream) => stream.sent(),
        }
    }

    /// Writes as much of the response as `stream` accepts.
    ///
    /// A buffered response is written completely unless the socket would
    /// block. A streamed response moves at most one chunk per call, and the
    /// head goes out once, ahead of the first chunk.
    ///
    /// An error means the response is abandoned; the caller tears the
    /// connection down and the client sees a truncated reply.
    pub fn write_to<W: Write>(&mut self, stream: &mut W) -> io::Result<Progress> {
        let Self {
            head,
            head_written,
            body,
            body_written,
            chunk,
            chunk_written,
            chunk_size,
        } = self;

        match body {
            Body::Buffered(bytes) => {
                if !send_from(stream, head, head_written)? {
                    return Ok(Progress::Pending);
                }
                if !send_from(stream, bytes, body_written)? {
                    return Ok(Progress::Pending);
                }
                Ok(Progress::Complete)
            }
            Body::Streaming(file) => {
                if *chunk_written == chunk.len() && !file.is_complete() {
                    *chunk_written = 0;
                    if file.read_chunk(chunk, *chunk_size)? == 0 {
                        return Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "file ended before its announced length",
                        ));
                    }
                }

                if !send_from(stream, head, head_written)? {
                    return Ok(Progress::Pending);
                }

                let before = *chunk_written;
                let flushed = send_from(stream, chunk, chunk_written);
                file.advance((*chunk_written - before) as u64);

                if !flushed? || !file.is_complete() {
                    return Ok(Progress::Pending);
                }
                Ok(Progress::Complete)
            }
        }
    }
}

/// Writes `buf[*cursor..]`, retrying short writes.
///
/// Returns `Ok(true)` once the buffer is fully written and `Ok(false)` if the
/// socket would block. The cursor always reflects what was accepted, including
/// when an error is returned.
fn send_from<W: Write>(stream: &mut W, buf: &[u8], cursor: &mut usize) -> io::Result<bool> {
    while *cursor < buf.len() {
        match stream.write(&buf[*cursor..]) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => *cursor += n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}
