//! Request routing.
//!
//! Maps `(method, path)` onto a handler and produces a [`Response`]
//! descriptor. The router owns the server-wide storage slot, so every
//! handler runs on the event loop thread without locking.

pub mod files;
pub mod handlers;

use std::path::PathBuf;

use tracing::info;

use crate::config::{Config, Limits};
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::storage::StorageSlot;

pub struct Router {
    root: PathBuf,
    limits: Limits,
    storage: Option<StorageSlot>,
}

impl Router {
    pub fn new(cfg: &Config) -> Self {
        Self {
            root: cfg.static_files.root.clone(),
            limits: cfg.limits,
            storage: None,
        }
    }

    /// The storage slot, once the first `/write` has created it.
    pub fn storage(&self) -> Option<&StorageSlot> {
        self.storage.as_ref()
    }

    pub fn dispatch(&mut self, request: &Request) -> Response {
        let response = match (&request.method, request.path.as_str()) {
            (Method::GET, "/ping") => handlers::ping(),
            (Method::GET, "/echo") => handlers::echo(request, &self.limits),
            (Method::GET, "/read") => handlers::read(self.storage.as_ref()),
            (Method::POST, "/write") => handlers::write(request, &mut self.storage, &self.limits),
            (Method::GET, path) => files::serve(&self.root, path, &self.limits),
            _ => Response::bad_request(),
        };

        info!(
            method = request.method.as_str(),
            path = %request.path,
            status = response.status.as_u16(),
            streaming = response.is_streaming(),
            "request handled"
        );

        response
    }
}
