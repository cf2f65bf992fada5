//! Multi-listener coordination.
//!
//! ```text
//! Coordinator::build(config)   roots resolved, backends and chains built
//!     → start()                one task per instance, all subscribed
//!     → Running::shutdown()    broadcast, join in completion order,
//!                              close each watcher after its instance
//! ```

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tokio_util::task::TaskTracker;

use crate::config::validation::validate_config;
use crate::config::{ConfigError, ServeConfig};
use crate::fs::watch::WatchHandle;
use crate::fs::{Backend, FsError};
use crate::http::file_server::{FileServer, NotFound};
use crate::http::server::into_router;
use crate::lifecycle::instance::{Instance, Role};
use crate::lifecycle::shutdown::Shutdown;
use crate::middleware::{build_chain, ChainOptions};
use crate::net::tls::load_tls_config;

/// Error raised before any listener is started.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot resolve directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("failed to load TLS configuration: {0}")]
    Tls(#[source] io::Error),
}

/// Every instance of the process, built but not yet listening.
pub struct Coordinator {
    instances: Vec<Instance>,
    tls: Option<RustlsConfig>,
}

impl Coordinator {
    /// Validate `config` and build one instance per site, plus a health-only
    /// instance when the health port is not one of the site ports.
    pub async fn build(config: &ServeConfig) -> Result<Self, StartupError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let tls = match &config.tls {
            Some(tls) => Some(load_tls_config(tls).await.map_err(StartupError::Tls)?),
            None => None,
        };

        let multi = config.is_multi_site();
        let label = |port: u16| if multi { format!(":{port}") } else { String::new() };
        let health_on = |port: u16| port != 0 && config.health_port == Some(port);

        let mut instances = Vec::with_capacity(config.sites.len() + 1);
        for site in &config.sites {
            let root = tokio::fs::canonicalize(&site.directory)
                .await
                .map_err(|source| StartupError::Directory {
                    path: site.directory.clone(),
                    source,
                })?;
            let (fs, watch) = Backend::build(config.fs, &root)?;

            let options = ChainOptions {
                fallback: site.fallback.clone(),
                health: health_on(site.port),
                log_access: config.log_access,
                log_fallback: config.log_fallback,
                log_headers: config.log_headers,
                label: label(site.port),
            };
            let tasks = TaskTracker::new();
            instances.push(Instance {
                addr: SocketAddr::new(config.host, site.port),
                role: Role::Site {
                    root,
                    fallback: site.fallback.clone(),
                },
                router: into_router(
                    Arc::new(build_chain(FileServer::new(fs), &options)),
                    tasks.clone(),
                ),
                tasks,
                watch,
            });
        }

        if let Some(port) = config.health_port {
            if !config.sites.iter().any(|site| health_on(site.port)) {
                let options = ChainOptions {
                    health: true,
                    log_access: config.log_access,
                    log_headers: config.log_headers,
                    label: label(port),
                    ..ChainOptions::default()
                };
                let tasks = TaskTracker::new();
                instances.push(Instance {
                    addr: SocketAddr::new(config.host, port),
                    role: Role::HealthOnly,
                    router: into_router(Arc::new(build_chain(NotFound, &options)), tasks.clone()),
                    tasks,
                    watch: None,
                });
            }
        }

        Ok(Self { instances, tls })
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Spawn every instance. Must be called from within a tokio runtime.
    pub fn start(self) -> Running {
        let shutdown = Shutdown::new();
        let mut tasks = JoinSet::new();
        let mut watchers = Vec::with_capacity(self.instances.len());
        let mut bound = Vec::with_capacity(self.instances.len());

        for (idx, instance) in self.instances.into_iter().enumerate() {
            let (server, watch) = instance.into_parts();
            let (bound_tx, bound_rx) = oneshot::channel();
            let rx = shutdown.subscribe();
            let tls = self.tls.clone();

            tasks.spawn(async move {
                server.run(tls, rx, bound_tx).await;
                idx
            });
            watchers.push(watch);
            bound.push(Some(bound_rx));
        }

        Running {
            shutdown,
            tasks,
            watchers,
            bound,
            addrs: Vec::new(),
        }
    }
}

/// Outcome of [`Running::shutdown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Instance tasks that completed, whether or not they ever served.
    pub stopped: usize,
    pub watchers_closed: usize,
}

/// Handle to the started instances.
pub struct Running {
    shutdown: Shutdown,
    tasks: JoinSet<usize>,
    watchers: Vec<Option<WatchHandle>>,
    bound: Vec<Option<oneshot::Receiver<io::Result<SocketAddr>>>>,
    addrs: Vec<Option<SocketAddr>>,
}

impl Running {
    /// Bound address of each instance, in configuration order. `None` for an
    /// instance whose bind failed.
    pub async fn local_addrs(&mut self) -> &[Option<SocketAddr>] {
        for slot in self.bound.iter_mut() {
            let addr = match slot.take() {
                Some(rx) => match rx.await {
                    Ok(Ok(addr)) => Some(addr),
                    Ok(Err(_)) | Err(_) => None,
                },
                None => continue,
            };
            self.addrs.push(addr);
        }
        &self.addrs
    }

    /// Stop every instance and release its watcher. Watchers of instances
    /// still serving stay open until that instance's task has returned.
    pub async fn shutdown(mut self) -> ShutdownReport {
        tracing::info!(instances = self.watchers.len(), "Stopping listeners");
        self.shutdown.trigger();

        let mut report = ShutdownReport::default();
        while let Some(joined) = self.tasks.join_next().await {
            report.stopped += 1;
            match joined {
                Ok(idx) => {
                    if let Some(watch) = self.watchers.get_mut(idx).and_then(Option::take) {
                        watch.close().await;
                        report.watchers_closed += 1;
                    }
                }
                Err(e) => tracing::error!(error = %e, "Listener task failed"),
            }
        }

        // Instances that panicked never reported their index.
        for watch in self.watchers.iter_mut().filter_map(Option::take) {
            watch.close().await;
            report.watchers_closed += 1;
        }

        tracing::info!(
            stopped = report.stopped,
            watchers_closed = report.watchers_closed,
            "All listeners stopped"
        );
        report
    }
}
