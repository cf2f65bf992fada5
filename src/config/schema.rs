//! Configuration schema definitions.
//!
//! All types derive Serde traits so the same structure can come from the
//! command line or from a TOML file.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default port when none is given.
pub const DEFAULT_PORT: u16 = 8100;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Address every listener binds to.
    pub host: IpAddr,

    /// One entry per listener.
    pub sites: Vec<SiteConfig>,

    /// Filesystem backend used by every listener.
    pub fs: FsKind,

    /// Log one line per completed request.
    pub log_access: bool,

    /// Log every fallback substitution.
    pub log_fallback: bool,

    /// Dump request and response headers.
    pub log_headers: bool,

    /// Port answering `/health` and `/ready`.
    pub health_port: Option<u16>,

    /// Serve HTTPS on every listener.
    pub tls: Option<TlsConfig>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            sites: Vec::new(),
            fs: FsKind::default(),
            log_access: false,
            log_fallback: false,
            log_headers: false,
            health_port: None,
            tls: None,
        }
    }
}

impl ServeConfig {
    /// `true` when listeners need a label to tell their log lines apart.
    pub fn is_multi_site(&self) -> bool {
        self.sites.len() > 1
    }
}

/// A single listener: port, document root, optional 404 fallback.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SiteConfig {
    pub port: u16,

    pub directory: PathBuf,

    /// Resource served in place of a 404.
    #[serde(default)]
    pub fallback: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            directory: PathBuf::from("."),
            fallback: None,
        }
    }
}

/// Filesystem backend selector.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum FsKind {
    /// Read from disk on every request.
    #[default]
    Disk,
    /// Load the tree into memory once.
    Memory,
    /// Load into memory and keep it in sync with the disk.
    MemoryWatch,
}

/// TLS certificate and key (PEM).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}
