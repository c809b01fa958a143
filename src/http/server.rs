use super::routes::create_router;
use super::state::AppState;
use crate::session::SessionHandle;
use anyhow::{Context, Result};
use std::future::Future;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Serve the API until `shutdown` resolves, then tear the session down.
///
/// The session is shut down and the controller task awaited even when the
/// server itself fails.
pub async fn serve<F>(
    listener: TcpListener,
    session: SessionHandle,
    controller: JoinHandle<()>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(AppState::new(session.clone()));

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    session.shutdown().await;
    if let Err(e) = controller.await {
        error!("Session controller task panicked: {}", e);
    }

    served.context("HTTP server failed")
}

/// Resolve on Ctrl-C or, on unix, SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl-C received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}
