//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (axum router, one task per request)
//!     → request.rs (ServeRequest: method, uri, headers, peer)
//!     → handler.rs (the listener's chain, see crate::middleware)
//!     → file_server.rs (leaf: files, redirects, 404)
//!     → writer.rs / intercept.rs (response sink and its decorators)
//!     → Send to client
//! ```

pub mod file_server;
pub mod handler;
pub mod headers;
pub mod intercept;
#[cfg(test)]
pub(crate) mod recorder;
pub mod request;
pub mod server;
pub mod writer;

pub use handler::Handler;
pub use request::{RequestId, ServeRequest};
pub use server::into_router;
pub use writer::{ResponseWriter, WriteError};
