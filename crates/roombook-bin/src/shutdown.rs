// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Shutdown signalling.
//!
//! A `watch` channel holds a single "stopping" flag. The server awaits a
//! [`ShutdownSignal`]; the runtime flips the flag on SIGINT/SIGTERM or when
//! asked to directly.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

/// Owns the stopping flag. Cheap to clone.
///
/// ```ignore
/// let shutdown = ShutdownCoordinator::new();
/// tokio::spawn(server.run_with_shutdown(shutdown.shutdown_signal().wait()));
/// shutdown.wait_for_shutdown().await;
/// ```
#[derive(Clone)]
pub struct ShutdownCoordinator {
    stopping: Arc<watch::Sender<bool>>,
}

impl ShutdownCoordinator {
    /// Creates a coordinator in the running state.
    pub fn new() -> Self {
        let (stopping, _) = watch::channel(false);
        Self {
            stopping: Arc::new(stopping),
        }
    }

    /// Returns a future-like handle that resolves once stopping.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            stopping: self.stopping.subscribe(),
        }
    }

    /// Flips the flag. Later calls are no-ops.
    pub fn initiate_shutdown(&self) {
        if !self.stopping.send_replace(true) {
            info!("Shutdown initiated");
        }
    }

    /// Whether the flag has been flipped.
    pub fn is_shutdown_initiated(&self) -> bool {
        *self.stopping.borrow()
    }

    /// Resolves on SIGINT/SIGTERM or [`initiate_shutdown`](Self::initiate_shutdown),
    /// leaving the flag set either way.
    pub async fn wait_for_shutdown(&self) {
        tokio::select! {
            _ = os_signal() => {}
            _ = self.shutdown_signal().wait() => {}
        }
        self.initiate_shutdown();
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves once the coordinator is stopping.
pub struct ShutdownSignal {
    stopping: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Waits until stopping. Also resolves if the coordinator is dropped.
    pub async fn wait(mut self) {
        let _ = self.stopping.wait_for(|stopping| *stopping).await;
    }
}

/// SIGTERM or SIGINT on unix, Ctrl+C elsewhere.
///
/// Never resolves if no handler can be installed.
async fn os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut term), Ok(mut int)) => {
                tokio::select! {
                    _ = term.recv() => info!("SIGTERM received"),
                    _ = int.recv() => info!("SIGINT received"),
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Cannot install unix signal handlers, using Ctrl+C");
            }
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Ctrl+C received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn resolves(signal: ShutdownSignal) {
        tokio::time::timeout(Duration::from_secs(1), signal.wait())
            .await
            .expect("signal should resolve");
    }

    #[tokio::test]
    async fn test_signal_taken_before_stop() {
        let shutdown = ShutdownCoordinator::new();
        let signal = shutdown.shutdown_signal();
        assert!(!shutdown.is_shutdown_initiated());

        shutdown.initiate_shutdown();
        assert!(shutdown.is_shutdown_initiated());
        resolves(signal).await;
    }

    #[tokio::test]
    async fn test_signal_taken_after_stop() {
        let shutdown = ShutdownCoordinator::new();
        shutdown.initiate_shutdown();
        shutdown.initiate_shutdown();

        resolves(shutdown.shutdown_signal()).await;
    }

    #[tokio::test]
    async fn test_signal_pending_while_running() {
        let shutdown = ShutdownCoordinator::new();
        let pending = tokio::time::timeout(
            Duration::from_millis(20),
            shutdown.shutdown_signal().wait(),
        )
        .await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn test_wait_for_shutdown_returns_on_manual_stop() {
        let shutdown = ShutdownCoordinator::new();
        let waiter = shutdown.clone();
        let handle = tokio::spawn(async move { waiter.wait_for_shutdown().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.initiate_shutdown();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
