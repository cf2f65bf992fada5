//! Startup reporting.

use std::path::Path;

/// Version line printed by `--version` and logged at startup.
pub fn build_info() -> String {
    format!(
        "{} {} ({}/{})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

pub fn log_build_info() {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        "{} starting",
        env!("CARGO_PKG_NAME")
    );
}

/// `Serving <dir> on HTTP port: <port>[ with <file> as error 404 file]`
pub fn banner(root: &Path, scheme: &str, port: u16, fallback: Option<&str>) -> String {
    let with_fallback = fallback
        .map(|f| format!(" with {f} as error 404 file"))
        .unwrap_or_default();
    format!(
        "Serving {} on {} port: {}{}",
        root.display(),
        scheme,
        port,
        with_fallback
    )
}
