//! # Operator shutdown signals.
//!
//! [`ShutdownSignals`] owns the SIGINT/SIGTERM listeners of one supervision
//! session. It is registered when the watchdog enters `Starting` and dropped
//! when it enters `Stopped`, so repeated sessions in one process (tests,
//! embedders) never share listeners.
//!
//! ## Signals
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//!
//! Both are forwarded to the instance unchanged.

use std::future::pending;
use std::io;

use nix::sys::signal::Signal;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

/// Why a session is shutting down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ShutdownCause {
    /// An operator signal arrived at the supervisor process.
    Signal(Signal),
    /// [`Watchdog::stop`](crate::Watchdog::stop) was called.
    Requested,
}

impl ShutdownCause {
    /// Signal to forward to the instance.
    pub(crate) fn forward(&self) -> Signal {
        match self {
            ShutdownCause::Signal(sig) => *sig,
            ShutdownCause::Requested => Signal::SIGTERM,
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            ShutdownCause::Signal(sig) => format!("{sig:?}"),
            ShutdownCause::Requested => "stop requested".to_string(),
        }
    }
}

/// Per-session operator signal listeners.
pub(crate) struct ShutdownSignals {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    /// Registers the listeners. Must be called from within a tokio runtime.
    pub(crate) fn register() -> io::Result<Self> {
        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    /// Waits for the next operator signal.
    pub(crate) async fn recv(&mut self) -> Signal {
        tokio::select! {
            Some(()) = self.sigint.recv() => Signal::SIGINT,
            Some(()) = self.sigterm.recv() => Signal::SIGTERM,
            else => pending().await,
        }
    }
}

/// Completes when an operator signal arrives or `stop` is cancelled.
///
/// Cancel-safe: a signal is consumed only when this future completes.
pub(crate) async fn shutdown_requested(
    signals: &mut Option<ShutdownSignals>,
    stop: &CancellationToken,
) -> ShutdownCause {
    match signals {
        Some(signals) => tokio::select! {
            sig = signals.recv() => ShutdownCause::Signal(sig),
            _ = stop.cancelled() => ShutdownCause::Requested,
        },
        None => {
            stop.cancelled().await;
            ShutdownCause::Requested
        }
    }
}
