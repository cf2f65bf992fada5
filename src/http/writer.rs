//! Response sink contract.
//!
//! Every handler in a listener's chain writes its response through a
//! [`ResponseWriter`]: headers are mutated in place, the status is announced
//! once, and body bytes are pushed as they become available. Wrappers such as
//! [`Intercepted`](crate::http::intercept::Intercepted) implement the same
//! trait, so a handler cannot tell whether it talks to the connection or to a
//! decorator in front of it.

use std::future::Future;
use std::io;

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use futures_util::StreamExt;

/// Error returned by body writes.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The bytes were dropped on purpose because a fallback response will
    /// replace this one. Never surfaced to the client.
    #[error("write discarded while a fallback is pending")]
    Discarded,

    /// The receiving side of the response went away.
    #[error("response stream closed")]
    Closed,

    /// Reading the source of a streamed body failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl WriteError {
    /// `true` for the suppressed-write sentinel.
    pub fn is_discarded(&self) -> bool {
        matches!(self, WriteError::Discarded)
    }
}

/// The outbound half of an HTTP exchange.
pub trait ResponseWriter: Send {
    /// Response headers as they currently stand.
    fn headers(&self) -> &HeaderMap;

    /// Mutable access to the response headers. Changes made after the status
    /// has been committed are not sent.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Announce the status code and commit the header set.
    ///
    /// Only the first call has an effect on the wire; superfluous calls are
    /// ignored by real sinks.
    fn write_header(&mut self, status: StatusCode);

    /// Write a chunk of the body. A write before any [`write_header`] call
    /// implies `200 OK`.
    ///
    /// [`write_header`]: ResponseWriter::write_header
    fn write(&mut self, chunk: Bytes) -> impl Future<Output = Result<usize, WriteError>> + Send;

    /// Copy a whole body into the response, returning the number of bytes
    /// written.
    fn stream_from(&mut self, body: Body) -> impl Future<Output = Result<u64, WriteError>> + Send {
        async move {
            let mut stream = body.into_data_stream();
            let mut total = 0u64;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| WriteError::Io(io::Error::other(e)))?;
                total += self.write(chunk).await? as u64;
            }
            Ok(total)
        }
    }
}
