//! Signal-driven shutdown.
//!
//! A [`Shutdown`] owns the cancellation token both transports watch and the
//! observable lifecycle state `Running -> Draining -> Stopped`.

use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Time in-flight HTTP requests get to finish after a shutdown signal.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Lifecycle state of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    /// Accepting and serving requests.
    Running,
    /// No longer accepting; waiting for in-flight requests.
    Draining,
    /// Fully stopped.
    Stopped,
}

/// Shutdown coordinator shared by the signal handler and a transport.
#[derive(Debug, Clone)]
pub struct Shutdown {
    token: CancellationToken,
    state: Arc<watch::Sender<ShutdownState>>,
    drain_timeout: Duration,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new(DRAIN_TIMEOUT)
    }
}

impl Shutdown {
    /// Create a coordinator in the `Running` state.
    pub fn new(drain_timeout: Duration) -> Self {
        let (state, _) = watch::channel(ShutdownState::Running);
        Self {
            token: CancellationToken::new(),
            state: Arc::new(state),
            drain_timeout,
        }
    }

    /// Request shutdown.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Token cancelled when shutdown is requested.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Deadline for draining in-flight requests.
    pub fn drain_timeout(&self) -> Duration {
        self.drain_timeout
    }

    /// Current state.
    pub fn state(&self) -> ShutdownState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ShutdownState> {
        self.state.subscribe()
    }

    pub(crate) fn transition(&self, next: ShutdownState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            info!(from = ?previous, to = ?next, "Server state changed");
        }
    }

    /// Trigger shutdown on Ctrl-C or SIGTERM.
    pub fn spawn_signal_handler(&self) -> tokio::task::JoinHandle<()> {
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = shutdown_signal() => token.cancel(),
                () = token.cancelled() => {}
            }
        })
    }
}

/// Wait for Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
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
            info!("Received Ctrl+C, initiating shutdown...");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
