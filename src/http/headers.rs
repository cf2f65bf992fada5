//! Header set helpers.

use axum::http::HeaderMap;

/// Append every value of `src` to `dst` without removing what `dst` already
/// holds.
pub fn copy_headers(dst: &mut HeaderMap, src: &HeaderMap) {
    for (name, value) in src.iter() {
        dst.append(name.clone(), value.clone());
    }
}

/// Replace the whole of `dst` with the contents of `src`.
pub fn set_headers(dst: &mut HeaderMap, src: &HeaderMap) {
    dst.clear();
    copy_headers(dst, src);
}

/// Render headers one per line, `Name: value`, in map order.
pub fn format_headers(headers: &HeaderMap) -> String {
    let mut out = String::new();
    for (name, value) in headers.iter() {
        out.push_str(name.as_str());
        out.push_str(": ");
        out.push_str(&String::from_utf8_lossy(value.as_bytes()));
        out.push_str("\r\n");
    }
    out
}
