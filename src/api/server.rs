//! API server lifecycle.
//!
//! Pattern: bind, spawn a background task, return a handle carrying the
//! resolved address and a shutdown channel, so the caller decides when the
//! server stops.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::audit_api_router;
use crate::api::types::ApiContext;

/// Handle to a running API server.
pub struct AuditApiServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl AuditApiServer {
    /// The address the server actually bound, including the resolved port.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal the server to stop accepting connections and drain.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Wait until the server task has fully stopped.
    pub async fn wait(self) {
        let _ = self.task.await;
    }
}

/// Bind the listener and spawn the axum server in a background tokio task.
pub async fn start_api_server(
    ctx: ApiContext,
    bind_addr: SocketAddr,
) -> std::io::Result<AuditApiServer> {
    let listener = TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    let app = audit_api_router(ctx);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(AuditApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}
