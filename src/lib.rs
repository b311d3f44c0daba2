//! Beacon - single-threaded HTTP server
//!
//! Multiplexes many client connections over one readiness loop and streams
//! large files back in bounded chunks.

pub mod config;
pub mod http;
pub mod routes;
pub mod server;
pub mod storage;
