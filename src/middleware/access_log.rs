//! Access logging.
//!
//! One line per request on target `access`, written after the inner chain
//! returns: `<remote> <status> <bytes> <label><path>`, with the path
//! percent-decoded as in the fallback line. The status defaults to
//! `200` when the chain never announced one; bytes are what the sink accepted.

use axum::http::StatusCode;

use crate::http::handler::Handler;
use crate::http::intercept::{Hooks, Intercepted};
use crate::http::request::ServeRequest;
use crate::http::writer::ResponseWriter;

#[derive(Debug, Clone)]
pub struct AccessLog<H> {
    inner: H,
    enabled: bool,
    label: String,
}

impl<H> AccessLog<H> {
    /// `label` prefixes the logged path, e.g. `:8100` when several listeners
    /// share one log.
    pub fn new(inner: H, enabled: bool, label: impl Into<String>) -> Self {
        Self {
            inner,
            enabled,
            label: label.into(),
        }
    }
}

impl<H: Handler> Handler for AccessLog<H> {
    async fn serve<W: ResponseWriter>(&self, request: &ServeRequest, w: &mut W) {
        if !self.enabled {
            self.inner.serve(request, w).await;
            return;
        }

        let mut intercepted = Intercepted::new(w, Hooks::forward_all());
        self.inner.serve(request, &mut intercepted).await;
        let state = intercepted.into_state();

        let remote = request
            .remote_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "-".to_string());
        tracing::info!(
            target: "access",
            method = %request.method(),
            "{} {} {} {}{}",
            remote,
            state.status.unwrap_or(StatusCode::OK).as_u16(),
            state.bytes_written,
            self.label,
            request.decoded_path()
        );
    }
}
