//! Liveness and readiness endpoints.
//!
//! `/health` answers `204` for any method. `/ready` answers `200 {}`, or
//! `204` to `OPTIONS`. Only exact paths match; `/health/` and `/healthz`
//! reach the inner chain.

use axum::http::{header, HeaderValue, Method, StatusCode};
use bytes::Bytes;

use crate::http::handler::Handler;
use crate::http::request::ServeRequest;
use crate::http::writer::ResponseWriter;

pub const HEALTH_PATH: &str = "/health";
pub const READY_PATH: &str = "/ready";

#[derive(Debug, Clone)]
pub struct Health<H> {
    inner: H,
    enabled: bool,
}

impl<H> Health<H> {
    pub fn new(inner: H, enabled: bool) -> Self {
        Self { inner, enabled }
    }
}

impl<H: Handler> Handler for Health<H> {
    async fn serve<W: ResponseWriter>(&self, request: &ServeRequest, w: &mut W) {
        if !self.enabled {
            return self.inner.serve(request, w).await;
        }

        match request.path() {
            HEALTH_PATH => w.write_header(StatusCode::NO_CONTENT),
            READY_PATH if *request.method() == Method::OPTIONS => {
                w.write_header(StatusCode::NO_CONTENT)
            }
            READY_PATH => {
                w.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                w.write_header(StatusCode::OK);
                let _ = w.write(Bytes::from_static(b"{}")).await;
            }
            _ => self.inner.serve(request, w).await,
        }
    }
}
