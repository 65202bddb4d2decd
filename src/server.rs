//! Transient HTTP server backing a single capture.
//!
//! Serves the markup under capture at `/` and any configured static
//! directories underneath it, on an OS-assigned port so concurrent test
//! processes never collide on a fixed one. A server lives for exactly one
//! capture call and is torn down before the image buffer is returned.

use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::{Service, ServiceExt};
use tower_http::services::ServeDir;
use url::Url;

use crate::error::{DomshotError, Result};
use crate::options::ResolvedOptions;

/// Port-0 binds can still race under heavy parallel test execution; retry a
/// bounded number of times instead of looping forever on a hosed machine.
const BIND_ATTEMPTS: usize = 16;

/// A content server bound to one ephemeral port.
///
/// Created per capture call and never reused. Dropping the handle without
/// calling [`close`](ContentServer::close) leaves the accept loop running
/// until the process exits; the capture pipeline always closes it, on error
/// paths included.
pub struct ContentServer {
    port: u16,
    url: Url,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ContentServer {
    /// Binds an ephemeral port and starts serving `markup` at the root path,
    /// with `opts.serve` directories as static fallbacks in order.
    ///
    /// Resolves once the socket is bound and accepting, so navigation can
    /// start immediately afterwards.
    pub async fn start(markup: &str, opts: &ResolvedOptions) -> Result<Self> {
        let listener = bind_ephemeral().await?;
        let addr = listener.local_addr().map_err(DomshotError::Io)?;
        let port = addr.port();
        let url = Url::parse(&format!("http://127.0.0.1:{port}/"))
            .map_err(|e| DomshotError::Server(format!("invalid base URL: {e}")))?;

        let router = build_router(markup.to_string(), &opts.serve);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, router).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(err) = serve.await {
                log::error!("content server on port {port} failed: {err}");
            }
        });

        log::debug!("content server listening on {url}");

        Ok(Self {
            port,
            url,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// The OS-assigned port read back after a successful bind.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL of the served document root.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Shuts the server down and resolves once the socket is released.
    /// Idempotent; repeated calls after the first are no-ops.
    pub async fn close(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    log::error!("content server task ended abnormally: {err}");
                }
            }
        }
    }
}

async fn bind_ephemeral() -> Result<TcpListener> {
    let mut last_err: Option<io::Error> = None;
    for _ in 0..BIND_ATTEMPTS {
        match TcpListener::bind(("127.0.0.1", 0)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                // Transient: a fresh port-0 bind gets a different port.
                last_err = Some(e);
            }
            Err(e) => return Err(DomshotError::Io(e)),
        }
    }
    Err(DomshotError::Server(format!(
        "failed to bind an ephemeral port after {BIND_ATTEMPTS} attempts: {}",
        last_err.map(|e| e.to_string()).unwrap_or_default()
    )))
}

fn build_router(markup: String, serve: &[PathBuf]) -> Router {
    let root = get(move || async move { Html(markup) });
    Router::new().route("/", root).fallback_service(ServeDirs {
        dirs: Arc::from(serve.to_vec()),
    })
}

/// Tries each static directory in order; the first one holding the requested
/// file wins, and a request matching none of them gets a plain 404.
#[derive(Clone)]
struct ServeDirs {
    dirs: Arc<[PathBuf]>,
}

impl Service<Request> for ServeDirs {
    type Response = Response;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = std::result::Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Infallible>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let dirs = Arc::clone(&self.dirs);
        let (parts, _body) = req.into_parts();
        Box::pin(async move {
            for dir in dirs.iter() {
                let probe = Request::from_parts(parts.clone(), Body::empty());
                let response = match ServeDir::new(dir).oneshot(probe).await {
                    Ok(response) => response,
                    Err(infallible) => match infallible {},
                };
                if response.status() != StatusCode::NOT_FOUND {
                    return Ok(response.map(Body::new));
                }
            }
            Ok(StatusCode::NOT_FOUND.into_response())
        })
    }
}
