//! HTTP protocol implementation.
//!
//! A deliberately small HTTP/1.1 subset: one request per connection, the
//! connection closes after the response, `Content-Length` bodies only.
//!
//! # Architecture
//!
//! - **`connection`**: The per-connection state machine driven by readiness events
//! - **`parser`**: Decodes a request from the bytes of one receive
//! - **`request`**: HTTP request representation
//! - **`response`**: Response descriptors, buffered or streamed from a file
//! - **`writer`**: Serializes the head and pushes bytes into a non-blocking socket
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← read interest, one receive per wake
//!        └──────┬──────┘
//!               │ decode + dispatch
//!               ▼
//!        ┌──────────────────┐
//!        │     Writing      │ ← buffered: sent on the same wake
//!        └──────┬───────────┘   streamed: write interest, one chunk per wake
//!               │ last byte sent, or any I/O error
//!               ▼
//!        ┌──────────────────┐
//!        │      Closed      │ ← deregistered and dropped by the event loop
//!        └──────────────────┘
//! ```

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
