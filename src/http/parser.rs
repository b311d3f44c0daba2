use bytes::Bytes;

use crate::config::Limits;
use crate::http::request::{Method, Request};
use crate::http::response::StatusCode;

/// Why a received request could not be decoded.
///
/// Every variant maps to either 400 (malformed) or 413 (too large for a
/// session buffer), see [`DecodeError::status`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("request is not terminated by a blank line")]
    Incomplete,
    #[error("malformed request line")]
    InvalidRequestLine,
    #[error("unknown method {0:?}")]
    InvalidMethod(String),
    #[error("malformed header line")]
    InvalidHeader,
    #[error("invalid Content-Length value")]
    InvalidContentLength,
    #[error("body is shorter than its Content-Length")]
    TruncatedBody,
    #[error("header block of {0} bytes exceeds the header buffer")]
    HeadersTooLarge(usize),
    #[error("declared body of {0} bytes exceeds the body buffer")]
    BodyTooLarge(usize),
}

impl DecodeError {
    pub fn is_too_large(&self) -> bool {
        matches!(self, DecodeError::HeadersTooLarge(_) | DecodeError::BodyTooLarge(_))
    }

    /// Status of the error response the client receives.
    pub fn status(&self) -> StatusCode {
        if self.is_too_large() {
            StatusCode::PayloadTooLarge
        } else {
            StatusCode::BadRequest
        }
    }
}

/// Decodes one request from the bytes of a single receive.
///
/// The buffer must contain the whole head, terminated by `\r\n\r\n`, and as
/// many body bytes as `Content-Length` declares. Bytes past the declared body
/// are ignored.
pub fn decode_request(buf: &[u8], limits: &Limits) -> Result<Request, DecodeError> {
    // Look for header/body separator
    let headers_end = find_headers_end(buf).ok_or(DecodeError::Incomplete)?;
    let head = &buf[..headers_end];
    let body_bytes = &buf[headers_end + 4..];

    let line_end = find_crlf(head).unwrap_or(head.len());
    let raw_headers = if line_end < head.len() {
        &head[line_end + 2..]
    } else {
        &[][..]
    };

    if raw_headers.len() > limits.max_header {
        return Err(DecodeError::HeadersTooLarge(raw_headers.len()));
    }

    // Request line
    let request_line =
        std::str::from_utf8(&head[..line_end]).map_err(|_| DecodeError::InvalidRequestLine)?;
    let mut parts = request_line.split_whitespace();

    let method_str = parts.next().ok_or(DecodeError::InvalidRequestLine)?;
    let path = parts.next().ok_or(DecodeError::InvalidRequestLine)?;
    let version = parts.next().ok_or(DecodeError::InvalidRequestLine)?;

    if parts.next().is_some() || !version.starts_with("HTTP/") {
        return Err(DecodeError::InvalidRequestLine);
    }

    let method = Method::from_token(method_str)
        .ok_or_else(|| DecodeError::InvalidMethod(method_str.to_string()))?;

    // Headers
    let headers_str = std::str::from_utf8(raw_headers).map_err(|_| DecodeError::InvalidHeader)?;
    let mut headers = Vec::new();

    for line in headers_str.split("\r\n") {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line.split_once(':').ok_or(DecodeError::InvalidHeader)?;
        if key.trim().is_empty() {
            return Err(DecodeError::InvalidHeader);
        }

        headers.push((key.trim().to_string(), value.trim().to_string()));
    }

    // Body
    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("Content-Length"))
        .map(|(_, v)| v.parse::<usize>().map_err(|_| DecodeError::InvalidContentLength))
        .transpose()?
        .unwrap_or(0);

    if content_length > limits.max_body {
        return Err(DecodeError::BodyTooLarge(content_length));
    }

    if body_bytes.len() < content_length {
        return Err(DecodeError::TruncatedBody);
    }

    Ok(Request {
        method,
        path: path.to_string(),
        version: version.to_string(),
        headers,
        raw_headers: Bytes::copy_from_slice(raw_headers),
        body: Bytes::copy_from_slice(&body_bytes[..content_length]),
    })
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}
