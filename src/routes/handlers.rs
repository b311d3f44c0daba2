//! Fixed routes: `/ping`, `/echo`, `/read` and `/write`.

use tracing::debug;

use crate::config::Limits;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::storage::StorageSlot;

/// Body returned by `/read` while the storage slot holds nothing.
pub const EMPTY_MARKER: &str = "<empty>";

pub fn ping() -> Response {
    Response::ok("pong")
}

/// Sends the request's header block back as the body.
pub fn echo(request: &Request, limits: &Limits) -> Response {
    if request.raw_headers.len() > limits.max_body {
        return Response::payload_too_large();
    }
    Response::ok(request.raw_headers.clone())
}

pub fn read(storage: Option<&StorageSlot>) -> Response {
    match storage.and_then(StorageSlot::read) {
        Some(data) => Response::ok(data),
        None => Response::ok(EMPTY_MARKER),
    }
}

/// Stores the request body and echoes it back.
///
/// The slot is created on the first write.
pub fn write(request: &Request, storage: &mut Option<StorageSlot>, limits: &Limits) -> Response {
    let Some(declared) = request.content_length() else {
        debug!("write without a usable Content-Length");
        return Response::bad_request();
    };

    if declared > limits.max_body {
        return Response::payload_too_large();
    }

    let body = &request.body[..declared.min(request.body.len())];
    if body.len() < declared {
        return Response::bad_request();
    }

    let slot = storage.get_or_insert_with(|| StorageSlot::new(limits.storage_capacity));
    if let Err(e) = slot.save(body) {
        debug!(error = %e, "write rejected");
        return Response::payload_too_large();
    }

    Response::ok(request.body.slice(..declared))
}
