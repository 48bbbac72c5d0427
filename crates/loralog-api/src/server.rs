use std::future::Future;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ApiConfig;

/// Bind the configured address.
pub async fn bind(config: &ApiConfig) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(config.socket_addr()).await?;
    info!(addr = %listener.local_addr()?, "HTTP API listening");
    Ok(listener)
}

/// Serve `router` until `shutdown` resolves.
///
/// In-flight requests are allowed to finish after `shutdown` fires.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("HTTP API stopped");
    Ok(())
}
