//! Listening socket, accept loop and start/stop lifecycle.

pub mod lifecycle;
pub mod listener;
pub mod pool;

pub use lifecycle::{Server, ServerOptions, ServerState};
pub use pool::{WorkerLimit, WorkerPool};
