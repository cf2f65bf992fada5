//! In-memory response sink.
//!
//! Records everything a handler writes so tests can inspect it afterwards.

use axum::http::{HeaderMap, StatusCode};
use bytes::{Bytes, BytesMut};

use crate::http::writer::{ResponseWriter, WriteError};

#[derive(Debug, Default)]
pub struct ResponseRecorder {
    status: Option<StatusCode>,
    headers: HeaderMap,
    committed: Option<HeaderMap>,
    body: BytesMut,
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded status, `200 OK` if none was announced.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    /// Headers as they were when the status was committed.
    pub fn committed_headers(&self) -> Option<&HeaderMap> {
        self.committed.as_ref()
    }

    /// Convenience lookup on the live header set.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_str(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl ResponseWriter for ResponseRecorder {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.status.is_some() {
            return;
        }
        self.status = Some(status);
        self.committed = Some(self.headers.clone());
    }

    async fn write(&mut self, chunk: Bytes) -> Result<usize, WriteError> {
        if self.status.is_none() {
            self.write_header(StatusCode::OK);
        }
        self.body.extend_from_slice(&chunk);
        Ok(chunk.len())
    }
}
