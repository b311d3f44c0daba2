//! Connection multiplexing.
//!
//! - **`listener`**: Creates the listening socket and starts the loop
//! - **`event_loop`**: Waits for readiness and dispatches accept, read and write work
//! - **`registry`**: Owns live connections and their readiness interest

pub mod event_loop;
pub mod listener;
pub mod registry;

pub use event_loop::EventLoop;
