//! Process lifecycle: `Starting -> Serving -> Draining -> Stopped`.
//!
//! The current phase is published on a [`tokio::sync::watch`] channel.
//! The HTTP server waits on [`Lifecycle::drained`] as its graceful
//! shutdown trigger, so moving to [`LifecyclePhase::Draining`] stops new
//! connections while in-flight requests run to completion. The pool is
//! closed only after the server has returned, and the phase then moves to
//! [`LifecyclePhase::Stopped`].

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

/// A phase of the serving process. Phases are ordered; time only moves
/// forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecyclePhase {
    /// Connecting to the store and bootstrapping the schema.
    Starting,
    /// Accepting requests.
    Serving,
    /// No longer accepting connections; in-flight requests finishing.
    Draining,
    /// Pool closed. Terminal.
    Stopped,
}

impl LifecyclePhase {
    /// Whether `self -> next` is a legal transition.
    ///
    /// `Starting -> Stopped` covers a failed bootstrap, where the server
    /// never started and there is nothing to drain.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Starting, Self::Serving | Self::Stopped)
                | (Self::Serving, Self::Draining)
                | (Self::Draining, Self::Stopped)
        )
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Starting => "starting",
            Self::Serving => "serving",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Errors raised by lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// The requested transition is not allowed from the current phase.
    #[error("invalid lifecycle transition {from} -> {to}")]
    InvalidTransition {
        /// Phase at the time of the request.
        from: LifecyclePhase,
        /// Requested phase.
        to: LifecyclePhase,
    },
}

/// Shared handle to the process lifecycle. Clones observe and drive the
/// same state.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    tx: Arc<watch::Sender<LifecyclePhase>>,
}

impl Lifecycle {
    /// Create a lifecycle in [`LifecyclePhase::Starting`].
    pub fn new() -> Self {
        let (tx, _) = watch::channel(LifecyclePhase::Starting);
        Self { tx: Arc::new(tx) }
    }

    /// The current phase.
    pub fn phase(&self) -> LifecyclePhase {
        *self.tx.borrow()
    }

    /// Subscribe to phase changes.
    pub fn subscribe(&self) -> watch::Receiver<LifecyclePhase> {
        self.tx.subscribe()
    }

    /// Move to `next`, returning the phase that was left.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] if `next` is not
    /// reachable from the current phase. The phase is left unchanged.
    pub fn transition(&self, next: LifecyclePhase) -> Result<LifecyclePhase, LifecycleError> {
        let mut result = Err(LifecycleError::InvalidTransition {
            from: LifecyclePhase::Starting,
            to: next,
        });
        self.tx.send_if_modified(|current| {
            let from = *current;
            if from.can_transition_to(next) {
                *current = next;
                result = Ok(from);
                true
            } else {
                result = Err(LifecycleError::InvalidTransition { from, to: next });
                false
            }
        });

        if let Ok(from) = result {
            info!(%from, to = %next, "Lifecycle transition");
        }
        result
    }

    /// Request shutdown. Returns `true` only for the call that actually
    /// started draining; repeated requests are no-ops.
    pub fn begin_draining(&self) -> bool {
        self.transition(LifecyclePhase::Draining).is_ok()
    }

    /// Resolve once the phase is [`LifecyclePhase::Draining`] or later.
    pub async fn drained(&self) {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|phase| *phase >= LifecyclePhase::Draining).await;
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve on the first SIGINT (Ctrl-C) or, on Unix, SIGTERM.
///
/// If a signal handler cannot be installed the failure is logged and that
/// signal is simply never observed.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}
