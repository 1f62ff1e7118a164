//! HTTP listener with bounded graceful shutdown.
//!
//! Connections are served on tasks owned by the accept loop. Shutdown stops
//! accepting, lets in-flight requests finish and, once the deadline passes,
//! drops every remaining connection.

use crate::error::ServerError;
use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

/// How long in-flight requests get to finish after a shutdown signal.
pub const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(10);

/// How a shutdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every connection finished before the deadline.
    Graceful,
    /// The deadline passed and remaining connections were closed.
    TimedOut,
}

/// A bound, not yet serving, HTTP server.
pub struct Server {
    listener: TcpListener,
    router: Router,
    addr: SocketAddr,
}

impl Server {
    /// Bind the listener.
    pub async fn bind(addr: SocketAddr, router: Router) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        Ok(Self {
            listener,
            router,
            addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start serving on a background task.
    pub fn spawn(self) -> RunningServer {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        info!(address = %self.addr, "HTTP server starting");

        let handle = tokio::spawn(accept_loop(self.listener, self.router, shutdown_rx));

        RunningServer {
            addr: self.addr,
            shutdown_tx,
            handle,
        }
    }
}

/// Handle to a server running on a background task.
pub struct RunningServer {
    addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Resolves only if the server task ends without being asked to.
    pub async fn stopped(&mut self) -> ServerError {
        match (&mut self.handle).await {
            Ok(()) => ServerError::Task("listener exited unexpectedly".into()),
            Err(e) => ServerError::Task(e.to_string()),
        }
    }

    /// Stop accepting and drain in-flight requests for up to `deadline`.
    pub async fn shutdown(mut self, deadline: Duration) -> Result<ShutdownOutcome, ServerError> {
        info!("Shutting down server...");
        // Only fails if the accept loop is already gone
        let _ = self.shutdown_tx.send(true);

        match tokio::time::timeout(deadline, &mut self.handle).await {
            Ok(Ok(())) => {
                info!("Server gracefully stopped");
                Ok(ShutdownOutcome::Graceful)
            }
            Ok(Err(e)) => Err(ServerError::Task(e.to_string())),
            Err(_) => {
                // Dropping the accept loop drops its connection set
                self.handle.abort();
                warn!(?deadline, "Shutdown deadline passed, closed remaining connections");
                Ok(ShutdownOutcome::TimedOut)
            }
        }
    }
}

/// Owns every connection task, unlike `axum::serve`, which detaches them. That
/// lets [`RunningServer::shutdown`] close connections still open at the deadline.
async fn accept_loop(listener: TcpListener, router: Router, mut shutdown: watch::Receiver<bool>) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) if is_connection_error(&e) => continue,
                    Err(e) => {
                        // Usually fd exhaustion; back off instead of spinning
                        error!("Accept error: {}", e);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                };
                connections.spawn(serve_connection(stream, peer, router.clone(), shutdown.clone()));
            }
            _ = shutdown.changed() => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    drop(listener);
    debug!(in_flight = connections.len(), "Listener closed, draining connections");

    while connections.join_next().await.is_some() {}
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: Router,
    mut shutdown: watch::Receiver<bool>,
) {
    let io = TokioIo::new(stream);
    let service = TowerToHyperService::new(router);
    let conn = http1::Builder::new().serve_connection(io, service);
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        _ = shutdown.changed() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };

    if let Err(e) = result {
        debug!(%peer, "Connection error: {}", e);
    }
}

fn is_connection_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::ConnectionReset
    )
}

/// Wait for SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Interrupt received"),
        _ = terminate => info!("Terminate signal received"),
    }
}
