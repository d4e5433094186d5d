//! HTTP protocol implementation.
//!
//! A deliberately small HTTP/1.1 layer: one request per connection, GET
//! only, no keep-alive.
//!
//! # Architecture
//!
//! - **`connection`**: per-connection state machine that ties the request to the content layer
//! - **`parser`**: parses the request line and headers from a byte buffer
//! - **`request`**: request representation and target path decoding
//! - **`response`**: response representation with builder pattern
//! - **`writer`**: serialises and writes a response to the client
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for request line and headers
//!        └──────┬──────┘
//!               │ Request parsed (malformed → Writing 400)
//!               ▼
//!        ┌─────────────┐
//!        │  Received   │ ← Non-GET → Writing (no body)
//!        └──────┬──────┘
//!               ▼
//!        ┌─────────────┐
//!        │  Resolving  │ ← Pick the file (listing failure → Writing 500)
//!        └──────┬──────┘
//!               ▼
//!        ┌─────────────┐
//!        │ Generating  │ ← Read file, build 200 / 404 / 500
//!        └──────┬──────┘
//!               ▼
//!        ┌─────────────┐
//!        │   Writing   │ ← Send response
//!        └──────┬──────┘
//!               ▼
//!        ┌─────────────┐
//!        │   Closed    │ ← Shut the stream down
//!        └─────────────┘
//! ```

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
