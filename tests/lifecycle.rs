//! Starting and stopping several listeners together.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use bytes::Bytes;
use static_serve::config::FsKind;
use static_serve::http::{into_router, Handler, ResponseWriter, ServeRequest};
use static_serve::lifecycle::instance::{Instance, Role};
use static_serve::lifecycle::Shutdown;
use tokio::sync::oneshot;
use tokio_util::task::TaskTracker;

mod common;
use common::{client, config, site, site_dir, start, url};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn three_watched_listeners_stop_and_release_watchers() {
    let dirs: Vec<_> = (0..3)
        .map(|i| site_dir(&[("index.html", &*format!("site {i}"))]))
        .collect();
    let cfg = config(
        dirs.iter().map(|d| site(d.path(), None)).collect(),
        FsKind::MemoryWatch,
    );

    let (running, addrs) = start(&cfg).await;
    assert_eq!(addrs.len(), 3);
    let client = client();
    for (i, addr) in addrs.iter().enumerate() {
        let body = client
            .get(url(addr.unwrap(), "/"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, format!("site {i}"));
    }

    let report = running.shutdown().await;
    assert_eq!(report.stopped, 3);
    assert_eq!(report.watchers_closed, 3);

    for addr in addrs {
        assert!(client.get(url(addr.unwrap(), "/")).send().await.is_err());
    }
}

#[tokio::test]
async fn unwatched_backends_have_nothing_to_close() {
    let a = site_dir(&[("a.txt", "a")]);
    let b = site_dir(&[("b.txt", "b")]);
    let cfg = config(
        vec![site(a.path(), None), site(b.path(), None)],
        FsKind::Memory,
    );

    let (running, _) = start(&cfg).await;
    let report = running.shutdown().await;
    assert_eq!(report.stopped, 2);
    assert_eq!(report.watchers_closed, 0);
}

#[tokio::test]
async fn failed_bind_does_not_block_shutdown() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let busy_port = taken.local_addr().unwrap().port();

    let a = site_dir(&[("a.txt", "a")]);
    let b = site_dir(&[("b.txt", "b")]);
    let mut sites = vec![site(a.path(), None), site(b.path(), None)];
    sites[1].port = busy_port;
    let cfg = config(sites, FsKind::Disk);

    let (running, addrs) = start(&cfg).await;
    assert!(addrs[0].is_some());
    assert!(addrs[1].is_none());

    let res = client()
        .get(url(addrs[0].unwrap(), "/a.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "a");

    let report = running.shutdown().await;
    assert_eq!(report.stopped, 2);
    drop(taken);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn download_in_flight_finishes_before_shutdown_returns() {
    let big = "x".repeat(32 * 1024 * 1024);
    let dir = site_dir(&[("big.bin", &*big)]);
    let cfg = config(vec![site(dir.path(), None)], FsKind::MemoryWatch);
    let (running, addrs) = start(&cfg).await;

    let response = client()
        .get(url(addrs[0].unwrap(), "/big.bin"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let stopping = tokio::spawn(running.shutdown());
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!stopping.is_finished());

    let body = response.bytes().await.unwrap();
    assert_eq!(body.len(), big.len());

    let report = tokio::time::timeout(Duration::from_secs(10), stopping)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.stopped, 1);
    assert_eq!(report.watchers_closed, 1);
}

/// Commits a head, then keeps working for a while.
struct Slow {
    done: Arc<AtomicBool>,
}

impl Handler for Slow {
    async fn serve<W: ResponseWriter>(&self, _request: &ServeRequest, w: &mut W) {
        w.write_header(StatusCode::OK);
        tokio::time::sleep(Duration::from_millis(500)).await;
        let _ = w.write(Bytes::from_static(b"late")).await;
        self.done.store(true, Ordering::SeqCst);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn abandoned_request_is_awaited_before_instance_stops() {
    let done = Arc::new(AtomicBool::new(false));
    let tasks = TaskTracker::new();
    let instance = Instance {
        addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        role: Role::HealthOnly,
        router: into_router(Arc::new(Slow { done: done.clone() }), tasks.clone()),
        tasks,
        watch: None,
    };
    let (server, watch) = instance.into_parts();
    assert!(watch.is_none());

    let shutdown = Shutdown::new();
    let (bound_tx, bound_rx) = oneshot::channel();
    let serving = tokio::spawn(server.run(None, shutdown.subscribe(), bound_tx));
    let addr = bound_rx.await.unwrap().unwrap();

    let response = client().get(url(addr, "/")).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    drop(response);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(10), serving)
        .await
        .unwrap()
        .unwrap();
    assert!(done.load(Ordering::SeqCst));
}
