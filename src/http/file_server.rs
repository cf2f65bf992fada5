//! Static file handler.
//!
//! The leaf of every listener's chain. Resolves the request path against a
//! [`FileSystem`] and writes the file, a redirect, a (suppressed) directory
//! listing, or an error status.
//!
//! # Behavior
//! - Paths ending in `/index.html` redirect to `./`
//! - Directories are addressed with a trailing slash, files without one
//! - A directory serves its `index.html` when present, a listing otherwise
//! - Missing files answer `404 page not found`
//! - Any method is accepted; `HEAD` gets headers only
//!
//! Byte ranges and conditional requests are not supported.

use axum::body::Body;
use axum::http::header::{self, HeaderValue};
use axum::http::{Method, StatusCode};
use bytes::Bytes;
use mime_guess::mime;

use crate::fs::{Content, DirEntry, FileSystem, Node};
use crate::http::handler::Handler;
use crate::http::request::ServeRequest;
use crate::http::writer::{ResponseWriter, WriteError};

const INDEX_PAGE: &str = "/index.html";

/// Serves files out of a [`FileSystem`].
#[derive(Debug, Clone)]
pub struct FileServer<F> {
    fs: F,
}

impl<F: FileSystem> FileServer<F> {
    pub fn new(fs: F) -> Self {
        Self { fs }
    }

    async fn serve_path<W: ResponseWriter>(&self, request: &ServeRequest, w: &mut W) {
        let mut upath = request.decoded_path().into_owned();
        if !upath.starts_with('/') {
            upath.insert(0, '/');
        }

        if upath.ends_with(INDEX_PAGE) {
            local_redirect(w, request, "./");
            return;
        }

        let name = clean_path(&upath);
        let node = match self.fs.open(&name).await {
            Ok(node) => node,
            Err(e) => {
                let (msg, status) = io_error_status(&e);
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::warn!(path = %name, error = %e, "Failed to open file");
                }
                error(w, msg, status).await;
                return;
            }
        };

        match node {
            Node::Dir => {
                if !upath.ends_with('/') {
                    let target = format!("{}/", base_name(&upath));
                    local_redirect(w, request, &target);
                    return;
                }
                let index = format!("{}{}", name.trim_end_matches('/'), INDEX_PAGE);
                match self.fs.open(&index).await {
                    Ok(Node::File { len, content }) => {
                        serve_content(w, request, &index, len, content).await;
                    }
                    _ => self.dir_list(w, &name).await,
                }
            }
            Node::File { len, content } => {
                if upath.ends_with('/') {
                    let target = format!("../{}", base_name(&upath));
                    local_redirect(w, request, &target);
                    return;
                }
                serve_content(w, request, &name, len, content).await;
            }
        }
    }

    async fn dir_list<W: ResponseWriter>(&self, w: &mut W, name: &str) {
        let mut entries = match self.fs.read_dir(name).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %name, error = %e, "Failed to read directory");
                error(w, "Error reading directory", StatusCode::INTERNAL_SERVER_ERROR).await;
                return;
            }
        };
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let mut page = String::from("<pre>\n");
        for DirEntry { name, is_dir } in &entries {
            let shown = if *is_dir { format!("{name}/") } else { name.clone() };
            let href = percent_encoding::utf8_percent_encode(&shown, HREF).to_string();
            page.push_str(&format!("<a href=\"{}\">{}</a>\n", href, html_escape(&shown)));
        }
        page.push_str("</pre>\n");

        w.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        w.write_header(StatusCode::OK);
        let _ = w.write(Bytes::from(page)).await;
    }
}

impl<F: FileSystem> Handler for FileServer<F> {
    async fn serve<W: ResponseWriter>(&self, request: &ServeRequest, writer: &mut W) {
        self.serve_path(request, writer).await;
    }
}

/// Answers every request with `404 page not found`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFound;

impl Handler for NotFound {
    async fn serve<W: ResponseWriter>(&self, _request: &ServeRequest, writer: &mut W) {
        error(writer, "404 page not found", StatusCode::NOT_FOUND).await;
    }
}

/// Write a plain-text error response.
pub async fn error<W: ResponseWriter>(w: &mut W, msg: &str, status: StatusCode) {
    let headers = w.headers_mut();
    headers.remove(header::CONTENT_LENGTH);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    w.write_header(status);
    let _ = w.write(Bytes::from(format!("{msg}\n"))).await;
}

async fn serve_content<W: ResponseWriter>(
    w: &mut W,
    request: &ServeRequest,
    name: &str,
    len: u64,
    content: Content,
) {
    if !w.headers().contains_key(header::CONTENT_TYPE) {
        if let Ok(value) = HeaderValue::from_str(&content_type(name)) {
            w.headers_mut().insert(header::CONTENT_TYPE, value);
        }
    }
    w.headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    w.write_header(StatusCode::OK);

    if *request.method() == Method::HEAD {
        return;
    }

    let result = match content {
        Content::Bytes(bytes) => w.write(bytes).await.map(|n| n as u64),
        Content::File(file) => w.stream_from(file_body(file)).await,
    };
    match result {
        Ok(_) | Err(WriteError::Discarded) | Err(WriteError::Closed) => {}
        Err(e) => tracing::debug!(path = %name, error = %e, "Body copy aborted"),
    }
}

/// `Content-Type` from the file extension. Text types are tagged UTF-8.
pub fn content_type(name: &str) -> String {
    let guessed = mime_guess::from_path(name).first_or_octet_stream();
    if guessed.type_() == mime::TEXT && guessed.get_param(mime::CHARSET).is_none() {
        format!("{}; charset=utf-8", guessed.essence_str())
    } else {
        guessed.to_string()
    }
}

fn file_body(file: tokio::fs::File) -> Body {
    use tokio::io::AsyncReadExt;

    const CHUNK: usize = 64 * 1024;
    let stream = futures_util::stream::unfold(Some(file), |state| async move {
        let mut file = state?;
        let mut buf = vec![0u8; CHUNK];
        match file.read(&mut buf).await {
            Ok(0) => None,
            Ok(n) => {
                buf.truncate(n);
                Some((Ok(Bytes::from(buf)), Some(file)))
            }
            Err(e) => Some((Err(e), None)),
        }
    });
    Body::from_stream(stream)
}

fn local_redirect<W: ResponseWriter>(w: &mut W, request: &ServeRequest, target: &str) {
    let location = match request.uri().query() {
        Some(q) if !q.is_empty() => format!("{target}?{q}"),
        _ => target.to_string(),
    };
    match HeaderValue::from_str(&location) {
        Ok(value) => {
            w.headers_mut().insert(header::LOCATION, value);
            w.write_header(StatusCode::MOVED_PERMANENTLY);
        }
        Err(_) => w.write_header(StatusCode::BAD_REQUEST),
    }
}

fn io_error_status(e: &std::io::Error) -> (&'static str, StatusCode) {
    match e.kind() {
        std::io::ErrorKind::NotFound => ("404 page not found", StatusCode::NOT_FOUND),
        std::io::ErrorKind::PermissionDenied => ("403 Forbidden", StatusCode::FORBIDDEN),
        _ => ("500 Internal Server Error", StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// Lexically clean an absolute slash path: collapse separators, drop `.`,
/// resolve `..` without ever leaving the root.
pub fn clean_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    format!("/{}", parts.join("/"))
}

fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((_, base)) if !base.is_empty() => base,
        _ => "/",
    }
}

const HREF: &percent_encoding::AsciiSet = &percent_encoding::CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'?')
    .add(b'<')
    .add(b'>');

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
