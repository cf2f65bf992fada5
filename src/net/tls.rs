//! TLS configuration and certificate loading.

use std::io;
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsConfig;

/// Load the rustls configuration shared by every listener.
pub async fn load_tls_config(tls: &TlsConfig) -> io::Result<RustlsConfig> {
    ensure_exists(&tls.cert_path, "Certificate")?;
    ensure_exists(&tls.key_path, "Private key")?;

    RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await
}

fn ensure_exists(path: &Path, what: &str) -> io::Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{what} file not found: {}", path.display()),
        ))
    }
}
