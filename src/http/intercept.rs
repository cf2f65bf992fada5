//! Response interception.
//!
//! [`Intercepted`] decorates a [`ResponseWriter`] with a table of hook
//! functions that run before each status announcement and body write. A hook
//! returns [`Flow::Forward`] to let the call through to the real sink or
//! [`Flow::Suppress`] to swallow it. Suppressed writes report zero bytes and
//! [`WriteError::Discarded`].
//!
//! The wrapper borrows the real sink for the duration of one request and
//! owns its [`InterceptState`], so nothing is shared between requests.

use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;

use crate::http::writer::{ResponseWriter, WriteError};

/// Decision taken by a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Forward,
    Suppress,
}

/// Per-request bookkeeping. The wrapper records status and byte counts;
/// hooks may latch `discarding`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InterceptState {
    /// A status has been forwarded to the real sink (explicitly or by an
    /// implicit `200` on first write).
    pub finalized: bool,
    /// Most recently announced status, forwarded or not.
    pub status: Option<StatusCode>,
    /// Bytes accepted by the real sink.
    pub bytes_written: u64,
    /// Set by hooks that decide to throw the rest of the response away.
    pub discarding: bool,
}

/// Hook table. Plain function values keep the wrapper `Send` and free of
/// allocation.
#[derive(Clone, Copy)]
pub struct Hooks {
    /// Runs on every status announcement.
    pub write_header: fn(&mut InterceptState, StatusCode) -> Flow,
    /// Runs before every body write with the chunk length.
    pub write: fn(&mut InterceptState, usize) -> Flow,
}

impl Hooks {
    /// Hooks that forward everything and record nothing.
    pub fn forward_all() -> Self {
        Self {
            write_header: |_, _| Flow::Forward,
            write: |_, _| Flow::Forward,
        }
    }
}

impl Default for Hooks {
    fn default() -> Self {
        Self::forward_all()
    }
}

/// A [`ResponseWriter`] that consults [`Hooks`] before delegating.
pub struct Intercepted<'w, W> {
    inner: &'w mut W,
    hooks: Hooks,
    state: InterceptState,
}

impl<'w, W: ResponseWriter> Intercepted<'w, W> {
    pub fn new(inner: &'w mut W, hooks: Hooks) -> Self {
        Self {
            inner,
            hooks,
            state: InterceptState::default(),
        }
    }

    pub fn state(&self) -> &InterceptState {
        &self.state
    }

    /// Release the borrowed sink and hand back what the hooks recorded.
    pub fn into_state(self) -> InterceptState {
        self.state
    }
}

impl<W: ResponseWriter> ResponseWriter for Intercepted<'_, W> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        self.state.status = Some(status);
        if (self.hooks.write_header)(&mut self.state, status) == Flow::Forward {
            self.state.finalized = true;
            self.inner.write_header(status);
        }
    }

    async fn write(&mut self, chunk: Bytes) -> Result<usize, WriteError> {
        if (self.hooks.write)(&mut self.state, chunk.len()) == Flow::Suppress {
            return Err(WriteError::Discarded);
        }
        self.state.finalized = true;
        let n = self.inner.write(chunk).await?;
        self.state.bytes_written += n as u64;
        Ok(n)
    }
}
