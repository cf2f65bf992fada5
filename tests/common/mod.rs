//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use static_serve::config::{FsKind, ServeConfig, SiteConfig};
use static_serve::{Coordinator, Running};

/// Create a temporary document root holding `files` (relative path, body).
pub fn site_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, body) in files {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, body).unwrap();
    }
    dir
}

/// An ephemeral-port site on `directory`.
pub fn site(directory: &Path, fallback: Option<&str>) -> SiteConfig {
    SiteConfig {
        port: 0,
        directory: PathBuf::from(directory),
        fallback: fallback.map(str::to_string),
    }
}

/// Loopback configuration for `sites`.
pub fn config(sites: Vec<SiteConfig>, fs: FsKind) -> ServeConfig {
    ServeConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        sites,
        fs,
        ..ServeConfig::default()
    }
}

/// Build and start every instance, returning the bound addresses in
/// configuration order.
pub async fn start(config: &ServeConfig) -> (Running, Vec<Option<SocketAddr>>) {
    let mut running = Coordinator::build(config).await.unwrap().start();
    let addrs = running.local_addrs().await.to_vec();
    (running, addrs)
}

/// Client that neither follows redirects nor pools connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{addr}{path}")
}
