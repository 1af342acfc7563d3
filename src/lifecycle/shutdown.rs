//! OS signal plumbing for graceful shutdown.

use tokio::signal;

/// Complete when the process receives Ctrl+C or, on Unix, SIGTERM.
///
/// ```rust,ignore
/// tokio::select! {
///     _ = shutdown_signal() => {}
///     _ = server.serve() => {}
/// }
/// app.shutdown().await?;
/// ```
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("received SIGTERM signal");
        },
    }
}
