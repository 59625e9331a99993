use crate::handler::{AppState, router};
use anyhow::{Context, Result};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serve `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("http server failed")
}

/// Bind `listen` (port 0 picks a free one) and serve the API in the
/// background. Dropping or firing the returned sender stops it.
pub async fn spawn_server(
    state: AppState,
    listen: SocketAddr,
) -> Result<(SocketAddr, oneshot::Sender<()>)> {
    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))?;
    let local_addr = listener.local_addr()?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = serve(listener, router(state), shutdown).await {
            tracing::error!(err = %e, "background server stopped");
        }
    });

    Ok((local_addr, shutdown_tx))
}
