//! csvpage - small concurrent HTTP server
//!
//! Serves static `.html` files from a base directory and generates pages
//! from a random line of a random `.csv` file in the same directory.

pub mod config;
pub mod content;
pub mod error;
pub mod http;
pub mod server;

pub use error::{ErrorKind, ServerError};
pub use server::{Server, ServerOptions, ServerState};
