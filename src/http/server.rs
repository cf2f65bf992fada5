//! Bridge between axum and the handler chain.
//!
//! # Responsibilities
//! - Turn an axum request into a [`ServeRequest`]
//! - Run the chain against a [`ChannelWriter`] in its own task, tracked by
//!   the listener's [`TaskTracker`] so shutdown can wait for it
//! - Hand the response head to hyper as soon as the status is committed
//! - Stream body chunks through a bounded channel (no whole-body buffering)
//!
//! # Data Flow
//! ```text
//! axum fallback route
//!     → dispatch()            spawn chain task on the tracker
//!     → ChannelWriter         head: oneshot, body: mpsc
//!     → PendingResponse       await head, body = Body::from_stream(rx)
//!     → hyper connection
//! ```

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio_util::task::TaskTracker;
use tower_http::trace::TraceLayer;

use crate::http::handler::Handler;
use crate::http::request::ServeRequest;
use crate::http::writer::{ResponseWriter, WriteError};

/// Body chunks buffered between the chain task and hyper.
const BODY_CHANNEL_CAPACITY: usize = 8;

type Head = (StatusCode, HeaderMap);

/// The real sink of a request: forwards the head and body to the connection.
pub struct ChannelWriter {
    headers: HeaderMap,
    head: Option<oneshot::Sender<Head>>,
    body: mpsc::Sender<Bytes>,
}

/// Receiving side of a [`ChannelWriter`].
pub struct PendingResponse {
    head: oneshot::Receiver<Head>,
    body: mpsc::Receiver<Bytes>,
}

impl ChannelWriter {
    pub fn channel() -> (ChannelWriter, PendingResponse) {
        let (head_tx, head_rx) = oneshot::channel();
        let (body_tx, body_rx) = mpsc::channel(BODY_CHANNEL_CAPACITY);
        (
            ChannelWriter {
                headers: HeaderMap::new(),
                head: Some(head_tx),
                body: body_tx,
            },
            PendingResponse {
                head: head_rx,
                body: body_rx,
            },
        )
    }
}

impl ResponseWriter for ChannelWriter {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        match self.head.take() {
            Some(tx) => {
                let _ = tx.send((status, self.headers.clone()));
            }
            None => tracing::debug!(status = %status, "Superfluous status announcement ignored"),
        }
    }

    async fn write(&mut self, chunk: Bytes) -> Result<usize, WriteError> {
        if self.head.is_some() {
            self.write_header(StatusCode::OK);
        }
        let len = chunk.len();
        if len == 0 {
            return Ok(0);
        }
        self.body.send(chunk).await.map_err(|_| WriteError::Closed)?;
        Ok(len)
    }
}

impl Drop for ChannelWriter {
    fn drop(&mut self) {
        let Some(tx) = self.head.take() else {
            return;
        };
        // A handler that returns without writing anything produces an empty
        // 200; one that panicked before committing produces a bare 500.
        let head = if std::thread::panicking() {
            (StatusCode::INTERNAL_SERVER_ERROR, HeaderMap::new())
        } else {
            (StatusCode::OK, std::mem::take(&mut self.headers))
        };
        let _ = tx.send(head);
    }
}

impl PendingResponse {
    /// Wait for the head and build a streaming response.
    pub async fn into_response(self) -> Response {
        let PendingResponse { head, body } = self;
        let (status, headers) = match head.await {
            Ok(head) => head,
            Err(_) => {
                tracing::error!("Handler task ended without a response head");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        let stream = futures_util::stream::unfold(body, |mut rx| async move {
            rx.recv().await.map(|chunk| (Ok::<_, Infallible>(chunk), rx))
        });

        let mut response = Response::new(Body::from_stream(stream));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

struct Dispatch<H> {
    handler: Arc<H>,
    tasks: TaskTracker,
}

impl<H> Clone for Dispatch<H> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            tasks: self.tasks.clone(),
        }
    }
}

/// Build the axum router serving every path through `handler`. Each
/// request's chain runs on `tasks`; the owner closes and waits on it once
/// the listener has stopped accepting.
pub fn into_router<H: Handler>(handler: Arc<H>, tasks: TaskTracker) -> Router {
    Router::new()
        .fallback(dispatch::<H>)
        .with_state(Dispatch { handler, tasks })
        .layer(TraceLayer::new_for_http())
}

async fn dispatch<H: Handler>(State(state): State<Dispatch<H>>, request: Request) -> Response {
    let Dispatch { handler, tasks } = state;
    let (parts, _body) = request.into_parts();
    let request = ServeRequest::from_parts(&parts);
    let (mut writer, pending) = ChannelWriter::channel();

    tasks.spawn(async move {
        handler.serve(&request, &mut writer).await;
    });

    pending.into_response().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;
    use axum::http::HeaderValue;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    struct Hello;

    impl Handler for Hello {
        async fn serve<W: ResponseWriter>(&self, request: &ServeRequest, w: &mut W) {
            w.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
            match request.path() {
                "/silent" => return,
                "/panic" => {
                    w.headers_mut()
                        .insert("x-partial", HeaderValue::from_static("yes"));
                    panic!("handler failed before committing");
                }
                _ => {}
            }
            w.write_header(StatusCode::ACCEPTED);
            let _ = w.write(Bytes::from_static(b"hello ")).await;
            let _ = w.write(Bytes::from_static(b"world")).await;
        }
    }

    async fn body_of(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn streams_head_and_body() {
        let app = into_router(Arc::new(Hello), TaskTracker::new());
        let response = app
            .oneshot(Request::builder().uri("/x").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(body_of(response).await, "hello world");
    }

    #[tokio::test]
    async fn silent_handler_yields_empty_ok() {
        let app = into_router(Arc::new(Hello), TaskTracker::new());
        let response = app
            .oneshot(Request::builder().uri("/silent").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(body_of(response).await, "");
    }

    #[tokio::test]
    async fn panicking_handler_yields_bare_500() {
        let app = into_router(Arc::new(Hello), TaskTracker::new());
        let response = app
            .oneshot(Request::builder().uri("/panic").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get("x-partial").is_none());
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }

    /// Commits its head, then keeps working after the client is gone.
    struct Slow {
        done: Arc<AtomicBool>,
    }

    impl Handler for Slow {
        async fn serve<W: ResponseWriter>(&self, _request: &ServeRequest, w: &mut W) {
            w.write_header(StatusCode::OK);
            tokio::time::sleep(Duration::from_millis(300)).await;
            let _ = w.write(Bytes::from_static(b"late")).await;
            self.done.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn tracker_waits_for_chain_after_response_dropped() {
        let done = Arc::new(AtomicBool::new(false));
        let tasks = TaskTracker::new();
        let app = into_router(Arc::new(Slow { done: done.clone() }), tasks.clone());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        drop(response);

        assert!(!done.load(Ordering::SeqCst));
        tasks.close();
        tasks.wait().await;
        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn write_after_receiver_dropped_reports_closed() {
        let (mut writer, pending) = ChannelWriter::channel();
        drop(pending);
        writer.write_header(StatusCode::OK);
        let err = writer.write(Bytes::from_static(b"x")).await.unwrap_err();
        assert!(matches!(err, WriteError::Closed));
    }
}
