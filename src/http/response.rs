use std::fs::File;
use std::io::{self, Read};

use bytes::Bytes;

/// Every status this server ever answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    /// Malformed request, or a method/path pair with no route.
    BadRequest,
    NotFound,
    /// Request or stored content exceeds a buffer capacity.
    PayloadTooLarge,
    InternalServerError,
}

impl StatusCode {
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::PayloadTooLarge => 413,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Text that follows the code on the status line.
    ///
    /// ```
    /// # use beacon::http::response::StatusCode;
    /// assert_eq!(StatusCode::PayloadTooLarge.reason_phrase(), "Request Entity Too Large");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::PayloadTooLarge => "Request Entity Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// A file being sent to the client a bounded chunk at a time.
///
/// Owns the open file; dropping the stream closes it.
#[derive(Debug)]
pub struct FileStream {
    file: File,
    size: u64,
    sent: u64,
}

impl FileStream {
    pub fn new(file: File, size: u64) -> Self {
        Self { file, size, sent: 0 }
    }

    /// Total number of body bytes the client was promised.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Body bytes accepted by the socket so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn remaining(&self) -> u64 {
        self.size - self.sent
    }

    pub fn is_complete(&self) -> bool {
        self.sent >= self.size
    }

    /// Reads the next chunk, at most `chunk_max` bytes and never past the
    /// declared size, into `buf`. Returns the number of bytes read.
    pub(crate) fn read_chunk(&mut self, buf: &mut Vec<u8>, chunk_max: usize) -> io::Result<usize> {
        let want = self.remaining().min(chunk_max as u64) as usize;
        buf.resize(want, 0);

        loop {
            match self.file.read(&mut buf[..]) {
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    buf.clear();
                    return Err(e);
                }
            }
        }
    }

    pub(crate) fn advance(&mut self, n: u64) {
        debug_assert!(self.sent + n <= self.size, "sent past the declared size");
        self.sent = (self.sent + n).min(self.size);
    }
}

/// Response body: held in memory, or streamed from a file.
#[derive(Debug)]
pub enum Body {
    Buffered(Bytes),
    Streaming(FileStream),
}

impl Body {
    /// Length announced in `Content-Length`.
    pub fn len(&self) -> u64 {
        match self {
            Body::Buffered(bytes) => bytes.len() as u64,
            Body::Streaming(stream) => stream.size(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, Body::Streaming(_))
    }
}

/// A response descriptor ready to be handed to the transmitter.
///
/// Headers keep insertion order so the serialized head is deterministic.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

/// Chained construction of a [`Response`]. `Content-Length` is filled in
/// from the body unless a header already sets it.
///
/// ```
/// # use beacon::http::response::{ResponseBuilder, StatusCode};
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/plain")
///     .body("pong")
///     .build();
/// assert_eq!(response.header("Content-Length"), Some("4"));
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Body,
    content_length: bool,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Body::Buffered(Bytes::new()),
            content_length: true,
        }
    }

    /// Adds a header, replacing any existing header of the same name
    /// (compared case-insensitively).
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();

        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some(existing) => existing.1 = value,
            None => self.headers.push((key, value)),
        }
        self
    }

    /// Sets an in-memory body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Body::Buffered(body.into());
        self
    }

    /// Streams the body from a file instead of memory.
    pub fn file(mut self, stream: FileStream) -> Self {
        self.body = Body::Streaming(stream);
        self
    }

    /// Suppresses the automatic `Content-Length` header.
    pub fn without_content_length(mut self) -> Self {
        self.content_length = false;
        self
    }

    /// See [`without_content_length`](Self::without_content_length) for the
    /// descriptors that carry no length.
    pub fn build(self) -> Response {
        let Self {
            status,
            mut headers,
            body,
            content_length,
        } = self;

        let has_length = headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("Content-Length"));
        if content_length && !has_length {
            headers.push(("Content-Length".to_string(), body.len().to_string()));
        }

        Response {
            status,
            headers,
            body,
        }
    }
}

impl Response {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        ResponseBuilder::new(StatusCode::Ok).body(body).build()
    }

    /// 200 with a body streamed from `stream`.
    pub fn file(stream: FileStream) -> Self {
        ResponseBuilder::new(StatusCode::Ok).file(stream).build()
    }

    /// `400 Bad Request` with no headers and no body.
    pub fn bad_request() -> Self {
        ResponseBuilder::new(StatusCode::BadRequest)
            .without_content_length()
            .build()
    }

    /// `404 Not Found` with a short text body.
    pub fn not_found() -> Self {
        ResponseBuilder::new(StatusCode::NotFound)
            .body(&b"404 Not Found"[..])
            .build()
    }

    /// `413 Request Entity Too Large` with no headers and no body.
    pub fn payload_too_large() -> Self {
        ResponseBuilder::new(StatusCode::PayloadTooLarge)
            .without_content_length()
            .build()
    }

    /// `500 Internal Server Error` with an empty body.
    pub fn internal_error() -> Self {
        ResponseBuilder::new(StatusCode::InternalServerError).build()
    }

    /// The canonical error descriptor for `status`.
    pub fn error(status: StatusCode) -> Self {
        match status {
            StatusCode::BadRequest => Self::bad_request(),
            StatusCode::NotFound => Self::not_found(),
            StatusCode::PayloadTooLarge => Self::payload_too_large(),
            StatusCode::Ok | StatusCode::InternalServerError => Self::internal_error(),
        }
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_streaming(&self) -> bool {
        self.body.is_streaming()
    }
}
