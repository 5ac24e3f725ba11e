//! HTTP/1.1 engine for the media server.
//!
//! # Architecture
//!
//! - **`cursor`**: bounds-checked reader over the receive buffer
//! - **`parser`**: turns buffered bytes into a [`request::Request`], including chunked bodies
//! - **`request`**: request type and the UPnP/DLNA header fields the server acts on
//! - **`response`**: status codes, bodies (bytes or a file span) and the response builder
//! - **`writer`**: serializes a response and streams file bodies
//! - **`connection`**: per-socket state machine
//! - **`router`** / **`handlers`**: map requests to responses
//!
//! # Connection State Machine
//!
//! Every connection serves one request and closes.
//!
//! ```text
//!        ┌────────────────┐
//!        │ ReadingHeaders │ ← until CRLFCRLF arrives
//!        └───────┬────────┘
//!                │ headers parsed
//!        ┌───────┴──────────────────────┐
//!        ▼                              ▼
//!  ┌─────────────┐            ┌────────────────────┐
//!  │ ReadingBody │ (POST)     │ ReadingChunkedBody │ (Transfer-Encoding: chunked)
//!  └──────┬──────┘            └─────────┬──────────┘
//!         │ body complete               │ zero-size chunk seen
//!         └──────────────┬──────────────┘
//!                        ▼
//!                ┌──────────────┐
//!                │  Dispatched  │ ← router runs on the blocking pool
//!                └──────┬───────┘
//!                       │ response written
//!                       ▼
//!                ┌──────────────┐
//!                │    Closed    │
//!                └──────────────┘
//! ```
//!
//! A read of zero bytes or a malformed request (answered with 400) moves
//! straight to `Closed`.

pub mod connection;
pub mod cursor;
pub mod handlers;
pub mod parser;
pub mod request;
pub mod response;
pub mod router;
pub mod writer;
