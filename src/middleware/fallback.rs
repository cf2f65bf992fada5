//! 404 fallback.
//!
//! Runs the inner chain once with an [`Intercepted`] sink. A `404` status is
//! swallowed and every later write discarded; the response headers are then
//! reset to what they were before the first run and the inner chain is run a
//! second time, against the real sink, with the path rewritten to the
//! fallback resource. Whatever the second run produces is final.
//!
//! ```text
//! NORMAL ──404 seen──▶ FALLBACK (replay once, not intercepted)
//!    │
//!    └── any other status ──▶ response delivered as is
//! ```

use axum::http::{HeaderMap, StatusCode};

use crate::http::file_server::error;
use crate::http::handler::Handler;
use crate::http::headers::{copy_headers, set_headers};
use crate::http::intercept::{Flow, Hooks, InterceptState, Intercepted};
use crate::http::request::ServeRequest;
use crate::http::writer::ResponseWriter;

fn suppress_not_found(state: &mut InterceptState, status: StatusCode) -> Flow {
    if status == StatusCode::NOT_FOUND {
        state.discarding = true;
    }
    if state.discarding {
        Flow::Suppress
    } else {
        Flow::Forward
    }
}

fn discard_after_not_found(state: &mut InterceptState, _len: usize) -> Flow {
    if state.discarding {
        Flow::Suppress
    } else {
        Flow::Forward
    }
}

const HOOKS: Hooks = Hooks {
    write_header: suppress_not_found,
    write: discard_after_not_found,
};

/// Serves `path` in place of any `404` produced by `inner`.
#[derive(Debug, Clone)]
pub struct Fallback<H> {
    inner: H,
    path: Option<String>,
    log: bool,
}

impl<H> Fallback<H> {
    /// `path` is normalized to start with `/`. `None` or an empty path makes
    /// this a pass-through. `log` enables the "Did not find" line.
    pub fn new(inner: H, path: Option<&str>, log: bool) -> Self {
        let path = path.filter(|p| !p.is_empty()).map(|p| {
            if p.starts_with('/') {
                p.to_string()
            } else {
                format!("/{p}")
            }
        });
        Self { inner, path, log }
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

impl<H: Handler> Handler for Fallback<H> {
    async fn serve<W: ResponseWriter>(&self, request: &ServeRequest, w: &mut W) {
        let Some(fallback) = self.path.as_deref() else {
            self.inner.serve(request, w).await;
            return;
        };

        let mut original = HeaderMap::new();
        copy_headers(&mut original, w.headers());

        let state = {
            let mut intercepted = Intercepted::new(w, HOOKS);
            self.inner.serve(request, &mut intercepted).await;
            intercepted.into_state()
        };
        if !state.discarding {
            return;
        }

        if self.log {
            tracing::info!(
                target: "fallback",
                "Did not find {}, serving {} instead",
                request.decoded_path(),
                fallback
            );
        }
        set_headers(w.headers_mut(), &original);

        match request.with_path(fallback) {
            Ok(replay) => self.inner.serve(&replay, w).await,
            Err(e) => {
                tracing::warn!(path = %fallback, error = %e, "Fallback path is not a valid request target");
                error(w, "404 page not found", StatusCode::NOT_FOUND).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
    use axum::http::{HeaderValue, Method, Uri};
    use bytes::Bytes;

    use crate::fs::disk::DiskFs;
    use crate::fs::just_files::JustFiles;
    use crate::http::file_server::FileServer;
    use crate::http::recorder::ResponseRecorder;
    use crate::observability::logging::capture::LogCapture;

    /// Serves `/exists` with a body, everything else with a 404, and counts
    /// invocations and the paths it saw.
    #[derive(Default)]
    struct Leaf {
        calls: AtomicUsize,
        seen: std::sync::Mutex<Vec<String>>,
    }

    impl Handler for Leaf {
        async fn serve<W: ResponseWriter>(&self, request: &ServeRequest, w: &mut W) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request.request_target().to_string());
            w.headers_mut()
                .insert("x-leaf", HeaderValue::from_static("touched"));
            if request.path() == "/exists" || request.path() == "/fallback.html" {
                w.write_header(StatusCode::OK);
                let _ = w.write(Bytes::from(format!("body of {}", request.path()))).await;
            } else {
                error(w, "404 page not found", StatusCode::NOT_FOUND).await;
            }
        }
    }

    fn get(uri: &'static str) -> ServeRequest {
        ServeRequest::new(Method::GET, Uri::from_static(uri))
    }

    #[tokio::test]
    async fn no_fallback_is_pass_through() {
        let leaf = Arc::new(Leaf::default());
        let handler = Fallback::new(leaf.clone(), None, false);
        let mut w = ResponseRecorder::new();

        handler.serve(&get("/missing"), &mut w).await;

        assert_eq!(w.status(), StatusCode::NOT_FOUND);
        assert_eq!(w.body_str(), "404 page not found\n");
        assert_eq!(leaf.calls.load(Ordering::SeqCst), 1);
        assert!(Fallback::new(leaf, Some(""), false).path().is_none());
    }

    #[tokio::test]
    async fn found_resources_run_once() {
        let leaf = Arc::new(Leaf::default());
        let handler = Fallback::new(leaf.clone(), Some("fallback.html"), false);
        let mut w = ResponseRecorder::new();

        handler.serve(&get("/exists"), &mut w).await;

        assert_eq!(w.status(), StatusCode::OK);
        assert_eq!(w.body_str(), "body of /exists");
        assert_eq!(w.header("x-leaf"), Some("touched"));
        assert_eq!(leaf.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn not_found_replays_with_rewritten_path() {
        let leaf = Arc::new(Leaf::default());
        let handler = Fallback::new(leaf.clone(), Some("fallback.html"), false);
        let mut w = ResponseRecorder::new();
        w.headers_mut()
            .insert(SET_COOKIE, HeaderValue::from_static("session=1"));

        handler.serve(&get("/missing?lang=en"), &mut w).await;

        assert_eq!(w.status(), StatusCode::OK);
        assert_eq!(w.body_str(), "body of /fallback.html");
        assert_eq!(leaf.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            *leaf.seen.lock().unwrap(),
            vec!["/missing?lang=en".to_string(), "/fallback.html?lang=en".to_string()]
        );

        // Headers from the failed attempt are gone, the pre-request ones stay.
        let committed = w.committed_headers().unwrap();
        assert_eq!(committed.get(SET_COOKIE).unwrap(), "session=1");
        assert!(committed.get(CONTENT_TYPE).is_none());
        assert_eq!(committed.get("x-leaf").unwrap(), "touched");
    }

    #[tokio::test]
    async fn second_not_found_is_delivered() {
        let leaf = Arc::new(Leaf::default());
        let handler = Fallback::new(leaf.clone(), Some("/also-missing"), false);
        let mut w = ResponseRecorder::new();

        handler.serve(&get("/missing"), &mut w).await;

        assert_eq!(w.status(), StatusCode::NOT_FOUND);
        assert_eq!(w.body_str(), "404 page not found\n");
        assert_eq!(leaf.calls.load(Ordering::SeqCst), 2);
    }

    fn site_with_index() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "Foo bar").unwrap();
        dir
    }

    #[tokio::test]
    async fn logs_substitution_when_verbose() {
        let dir = site_with_index();
        let server = FileServer::new(JustFiles::new(DiskFs::new(dir.path())));
        let handler = Fallback::new(server, Some("/"), true);
        let logs = LogCapture::default();
        let _guard = logs.install();

        let mut w = ResponseRecorder::new();
        handler.serve(&get("/missing.txt"), &mut w).await;

        assert_eq!(w.status(), StatusCode::OK);
        assert!(w.body_str().contains("Foo bar"));
        assert!(logs
            .contents()
            .contains("Did not find /missing.txt, serving / instead"));
    }

    #[tokio::test]
    async fn quiet_substitution_logs_nothing() {
        let dir = site_with_index();
        let server = FileServer::new(JustFiles::new(DiskFs::new(dir.path())));
        let handler = Fallback::new(server, Some("/"), false);
        let logs = LogCapture::default();
        let _guard = logs.install();

        let mut w = ResponseRecorder::new();
        handler.serve(&get("/missing.txt"), &mut w).await;

        assert!(w.body_str().contains("Foo bar"));
        assert!(!logs.contents().contains("Did not find"));
    }
}
