//! One listener: bind, serve, stop on the shutdown broadcast.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tokio::sync::{broadcast, oneshot};
use tokio_util::task::TaskTracker;

use crate::fs::watch::WatchHandle;
use crate::lifecycle::shutdown::notified;
use crate::lifecycle::startup::banner;
use crate::net::listener::{self, ListenerError};

/// What an instance serves, for the startup banner.
#[derive(Debug, Clone)]
pub enum Role {
    Site {
        root: PathBuf,
        fallback: Option<String>,
    },
    HealthOnly,
}

/// A listener that has been built but not started.
pub struct Instance {
    pub addr: SocketAddr,
    pub role: Role,
    /// Must be the tracker `router` spawns its request tasks on.
    pub router: Router,
    pub tasks: TaskTracker,
    /// Closed by the coordinator once this instance has stopped.
    pub watch: Option<WatchHandle>,
}

impl Instance {
    /// Split off the watcher; the rest moves into the serving task.
    pub fn into_parts(self) -> (Server, Option<WatchHandle>) {
        (
            Server {
                addr: self.addr,
                role: self.role,
                router: self.router,
                tasks: self.tasks,
            },
            self.watch,
        )
    }
}

/// The part of an [`Instance`] that runs inside its task.
pub struct Server {
    addr: SocketAddr,
    role: Role,
    router: Router,
    tasks: TaskTracker,
}

impl Server {
    /// Bind and serve until `shutdown` fires, then wait for every request
    /// task still running, including ones whose client has gone away. The
    /// bound address, or the bind error, is sent through `bound` as soon as it
    /// is known. Serve errors are logged, never returned.
    pub async fn run(
        self,
        tls: Option<RustlsConfig>,
        shutdown: broadcast::Receiver<()>,
        bound: oneshot::Sender<io::Result<SocketAddr>>,
    ) {
        let Server {
            addr,
            role,
            router,
            tasks,
        } = self;

        let listener = match listener::bind(addr).await {
            Ok(bound_listener) => bound_listener,
            Err(e) => {
                tracing::error!(address = %addr, error = %e, "Listener failed to start");
                let kind = match &e {
                    ListenerError::Bind { source, .. } | ListenerError::LocalAddr(source) => {
                        source.kind()
                    }
                };
                let _ = bound.send(Err(io::Error::new(kind, e)));
                return;
            }
        };
        let local_addr = listener.local_addr;

        let scheme = if tls.is_some() { "HTTPS" } else { "HTTP" };
        match &role {
            Role::Site { root, fallback } => {
                tracing::info!("{}", banner(root, scheme, local_addr.port(), fallback.as_deref()))
            }
            Role::HealthOnly => {
                tracing::info!("Serving health endpoints on {} port: {}", scheme, local_addr.port())
            }
        }
        let _ = bound.send(Ok(local_addr));

        let app = router.into_make_service_with_connect_info::<SocketAddr>();
        let result = match tls {
            None => {
                axum::serve(listener.listener, app)
                    .with_graceful_shutdown(notified(shutdown))
                    .await
            }
            Some(config) => match listener.listener.into_std() {
                Ok(std_listener) => {
                    let handle = axum_server::Handle::new();
                    let stopper = handle.clone();
                    tokio::spawn(async move {
                        notified(shutdown).await;
                        stopper.graceful_shutdown(None);
                    });
                    axum_server::from_tcp_rustls(std_listener, config)
                        .handle(handle)
                        .serve(app)
                        .await
                }
                Err(e) => Err(e),
            },
        };

        tasks.close();
        if !tasks.is_empty() {
            tracing::debug!(address = %local_addr, pending = tasks.len(), "Waiting for request tasks");
        }
        tasks.wait().await;

        match result {
            Ok(()) => tracing::info!(address = %local_addr, "Listener stopped"),
            Err(e) => tracing::error!(address = %local_addr, error = %e, "Listener stopped with error"),
        }
    }
}
