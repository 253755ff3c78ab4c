//! Process lifecycle: listeners, consumers, graceful shutdown.
//!
//! On SIGINT or SIGTERM:
//! 1. The shutdown signal is broadcast to every topic task and the metrics
//!    listener
//! 2. Topic tasks get the grace period to finish their in-flight message,
//!    while the HTTP listener keeps serving
//! 3. The HTTP listener stops accepting connections
//! 4. In-flight HTTP requests drain and the process exits

use crate::config::Config;
use crate::error::StartupError;
use axum::Router;
use recsys_runtime::metrics::MetricsServer;
use recsys_runtime::{Shutdown, TopicConsumer, await_shutdown, shutdown_signal};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Spawn `consumers`, serve `api` (plus `/health`) and the metrics endpoint,
/// and run until a shutdown signal completes the sequence above.
///
/// # Errors
///
/// Returns [`StartupError`] if a listener cannot bind, the metrics recorder
/// cannot be installed, or the HTTP server fails.
pub async fn serve(
    config: &Config,
    api: Router,
    consumers: Vec<TopicConsumer>,
) -> Result<(), StartupError> {
    let service = config.service.name();
    let shutdown = Shutdown::new();

    let metrics_addr: SocketAddr = config
        .metrics_addr()
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let mut metrics = MetricsServer::new(metrics_addr);
    metrics.start()?;
    if let Some(handle) = metrics.handle() {
        let listener = TcpListener::bind(metrics.addr()).await?;
        let mut stop = shutdown.subscribe();
        let router = recsys_web::handlers::metrics_router(handle.clone());
        info!(addr = %metrics.addr(), "Metrics endpoint listening");
        tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = stop.recv().await;
                })
                .await;
            if let Err(e) = result {
                warn!(error = %e, "Metrics endpoint failed");
            }
        });
    }

    let handles: Vec<_> = consumers
        .into_iter()
        .flat_map(|consumer| consumer.spawn(&shutdown))
        .collect();
    info!(tasks = handles.len(), "Consumers started");

    let listener = TcpListener::bind(config.http_addr()).await?;
    info!(service, addr = %config.http_addr(), "HTTP server listening");

    let grace = config.server.shutdown_grace;
    axum::serve(listener, recsys_web::app(api))
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown requested, stopping consumers");
            shutdown.trigger();
            let report = await_shutdown(handles, grace).await;
            info!(
                stopped = report.stopped,
                failed = report.failed,
                timed_out = report.timed_out,
                "Consumers stopped"
            );
        })
        .await?;

    info!(service, "Shutdown complete");
    Ok(())
}
