//! Graceful shutdown.
//!
//! On SIGINT or SIGTERM a service:
//! 1. Broadcasts [`Shutdown::trigger`] so every topic task stops after the
//!    message it is currently handling
//! 2. Waits up to the grace period for those tasks ([`await_shutdown`])
//! 3. Lets the HTTP listener finish

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Broadcast cancellation shared by all background tasks of a service.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new, untriggered shutdown signal.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// A receiver that resolves once [`trigger`](Self::trigger) is called.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscriber. Returns how many were listening.
    pub fn trigger(&self) -> usize {
        let listeners = self.tx.send(()).unwrap_or(0);
        info!(listeners, "Shutdown signal broadcast");
        listeners
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of [`await_shutdown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Tasks that returned on their own
    pub stopped: usize,
    /// Tasks that panicked or were cancelled
    pub failed: usize,
    /// Tasks still running at the deadline (aborted)
    pub timed_out: usize,
}

/// Wait for `handles` to finish, all within one `grace` period.
///
/// Tasks still running when the grace period ends are aborted.
pub async fn await_shutdown(handles: Vec<JoinHandle<()>>, grace: Duration) -> ShutdownReport {
    let deadline = tokio::time::Instant::now() + grace;
    let mut report = ShutdownReport::default();

    for (idx, mut handle) in handles.into_iter().enumerate() {
        match tokio::time::timeout_at(deadline, &mut handle).await {
            Ok(Ok(())) => {
                info!(task = idx, "Task stopped gracefully");
                report.stopped += 1;
            }
            Ok(Err(e)) => {
                warn!(task = idx, error = %e, "Task failed");
                report.failed += 1;
            }
            Err(_) => {
                warn!(task = idx, "Task shutdown timed out, aborting");
                handle.abort();
                report.timed_out += 1;
            }
        }
    }

    report
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// If a handler cannot be installed the failure is logged and that signal is
/// never observed; the other one still works.
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        () = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trigger_reaches_every_subscriber() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.clone().subscribe();

        assert_eq!(shutdown.trigger(), 2);
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }

    #[tokio::test]
    async fn trigger_without_listeners_is_harmless() {
        assert_eq!(Shutdown::new().trigger(), 0);
    }

    #[tokio::test]
    async fn await_shutdown_aborts_stragglers() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();

        let cooperative = tokio::spawn(async move {
            let _ = rx.recv().await;
        });
        let stubborn = tokio::spawn(std::future::pending::<()>());

        shutdown.trigger();
        let report = await_shutdown(vec![cooperative, stubborn], Duration::from_millis(50)).await;

        assert_eq!(
            report,
            ShutdownReport {
                stopped: 1,
                failed: 0,
                timed_out: 1,
            }
        );
    }
}
