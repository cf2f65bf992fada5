//! Command-line interface.
//!
//! Listener settings are given as repeated flags and zipped by position:
//! `-p 8100 -d ./site -e /index.html -p 8200 -d ./docs -e ""`.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::{FsKind, ServeConfig, SiteConfig, TlsConfig};
use crate::config::validation::validate_config;

#[derive(Debug, Parser)]
#[command(name = "static-serve")]
#[command(about = "Serve static files from one or more directories, without directory listings", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Port to serve on (repeatable)
    #[arg(short = 'p', long = "port")]
    pub ports: Vec<u16>,

    /// Directory of static files to host (repeatable, one per port)
    #[arg(short = 'd', long = "directory")]
    pub directories: Vec<PathBuf>,

    /// File to serve instead of a 404 (repeatable, one per port; "" for none)
    #[arg(short = 'e', long = "fallback")]
    pub fallbacks: Vec<String>,

    /// Filesystem backend
    #[arg(long, value_enum)]
    pub fs: Option<FsKind>,

    /// Log every request
    #[arg(long)]
    pub log_access: bool,

    /// Log when a fallback file is served
    #[arg(long)]
    pub log_fallback: bool,

    /// Dump request and response headers
    #[arg(long)]
    pub log_headers: bool,

    /// Port answering /health and /ready
    #[arg(long)]
    pub health_port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// TLS certificate (PEM)
    #[arg(long, requires = "tls_key")]
    pub tls_cert: Option<PathBuf>,

    /// TLS private key (PEM)
    #[arg(long, requires = "tls_cert")]
    pub tls_key: Option<PathBuf>,

    /// TOML configuration file; command-line sites replace its sites
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Print version, OS and architecture, then exit
    #[arg(short = 'V', long)]
    pub version: bool,
}

impl Cli {
    /// Merge flags (and the optional file) into a validated configuration.
    pub fn into_config(self) -> Result<ServeConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ServeConfig::default(),
        };

        let sites = zip_sites(self.ports, self.directories, self.fallbacks)?;
        if !sites.is_empty() {
            config.sites = sites;
        }
        if config.sites.is_empty() {
            config.sites.push(SiteConfig::default());
        }

        if let Some(fs) = self.fs {
            config.fs = fs;
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if self.health_port.is_some() {
            config.health_port = self.health_port;
        }
        if let (Some(cert_path), Some(key_path)) = (self.tls_cert, self.tls_key) {
            config.tls = Some(TlsConfig { cert_path, key_path });
        }
        config.log_access |= self.log_access;
        config.log_fallback |= self.log_fallback;
        config.log_headers |= self.log_headers;

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

/// Pair ports, directories and fallbacks by position.
///
/// Ports and directories must match one to one. Fallbacks are either absent
/// altogether or given once per port; an empty string disables the fallback
/// for that port.
pub fn zip_sites(
    ports: Vec<u16>,
    directories: Vec<PathBuf>,
    fallbacks: Vec<String>,
) -> Result<Vec<SiteConfig>, ConfigError> {
    if ports.len() != directories.len()
        || (!fallbacks.is_empty() && fallbacks.len() != ports.len())
    {
        return Err(ConfigError::Mismatch {
            ports: ports.len(),
            directories: directories.len(),
            fallbacks: fallbacks.len(),
        });
    }

    let mut fallbacks = fallbacks.into_iter();
    Ok(ports
        .into_iter()
        .zip(directories)
        .map(|(port, directory)| SiteConfig {
            port,
            directory,
            fallback: fallbacks.next().filter(|f| !f.is_empty()),
        })
        .collect())
}
