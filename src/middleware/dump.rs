//! Request/response header dump on target `headers`.
//!
//! Two lines per request sharing a short id: the request line with its
//! headers before the chain runs, then the status and response headers after.

use axum::http::StatusCode;

use crate::http::handler::Handler;
use crate::http::headers::format_headers;
use crate::http::intercept::{Hooks, Intercepted};
use crate::http::request::{RequestId, ServeRequest};
use crate::http::writer::ResponseWriter;

#[derive(Debug, Clone)]
pub struct HeaderDump<H> {
    inner: H,
    enabled: bool,
    label: String,
}

impl<H> HeaderDump<H> {
    /// `label` is appended to every request id.
    pub fn new(inner: H, enabled: bool, label: impl Into<String>) -> Self {
        Self {
            inner,
            enabled,
            label: label.into(),
        }
    }
}

impl<H: Handler> Handler for HeaderDump<H> {
    async fn serve<W: ResponseWriter>(&self, request: &ServeRequest, w: &mut W) {
        if !self.enabled {
            return self.inner.serve(request, w).await;
        }

        let id = RequestId::generate(&self.label);
        tracing::info!(
            target: "headers",
            "{} {} {}\r\n{}",
            id,
            request.method(),
            request.request_target(),
            format_headers(request.headers())
        );

        let mut intercepted = Intercepted::new(w, Hooks::forward_all());
        self.inner.serve(request, &mut intercepted).await;
        let status = intercepted.into_state().status.unwrap_or(StatusCode::OK);

        tracing::info!(
            target: "headers",
            "{} {} {}",
            id,
            status.as_u16(),
            format_headers(w.headers())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{CONTENT_TYPE, USER_AGENT};
    use axum::http::{HeaderMap, HeaderValue, Method, Uri};

    use crate::http::file_server::NotFound;
    use crate::http::recorder::ResponseRecorder;
    use crate::observability::logging::capture::LogCapture;

    #[tokio::test]
    async fn dumps_both_sides_with_one_id() {
        let logs = LogCapture::default();
        let _guard = logs.install();

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8.5"));
        let request = ServeRequest::new(Method::GET, Uri::from_static("/nope?q=1"))
            .with_headers(headers);
        let mut w = ResponseRecorder::new();

        HeaderDump::new(NotFound, true, ":9000")
            .serve(&request, &mut w)
            .await;

        let out = logs.contents();
        assert!(out.contains("GET /nope?q=1"), "{out}");
        assert!(out.contains("user-agent: curl/8.5"));
        assert!(out.contains(&format!("404 {}: text/plain", CONTENT_TYPE)));

        let ids: Vec<&str> = out
            .lines()
            .filter_map(|line| line.split_whitespace().find(|w| w.ends_with(":9000")))
            .collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], ids[1]);
        assert_eq!(ids[0].len(), 8 + ":9000".len());
    }

    #[tokio::test]
    async fn disabled_logs_nothing() {
        let logs = LogCapture::default();
        let _guard = logs.install();
        let mut w = ResponseRecorder::new();

        HeaderDump::new(NotFound, false, "")
            .serve(&ServeRequest::new(Method::GET, Uri::from_static("/")), &mut w)
            .await;

        assert_eq!(w.status(), StatusCode::NOT_FOUND);
        assert!(logs.contents().is_empty());
    }
}
