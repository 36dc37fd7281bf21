//! # Watchdog lifecycle state.
//!
//! ```text
//!   Idle ──► Starting ──► Running ──► Stopping ──► Stopped
//!               ▲  │         │                       ▲
//!               │  │         └──(exit, restart)──┐   │
//!               │  └──────(start failure)────────┼───┤
//!               └────────────(after delay)───────┘   │
//!                              (exit, no restart) ───┘
//! ```
//!
//! Crash-and-restart is a transition, not a state: the decision is made
//! synchronously inside the monitoring loop.
//!
//! [`StateCell`] publishes the current state through a `watch` channel so
//! callers can await a transition instead of polling.

use tokio::sync::watch;

/// Supervisor lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchdogState {
    /// Constructed, `run` not called yet.
    Idle,
    /// Running the pre-action, refreshing the logger, spawning.
    Starting,
    /// An instance is current and being monitored.
    Running,
    /// Shutdown requested; waiting for the instance to exit.
    Stopping,
    /// Session over; `run` has returned or is returning.
    Stopped,
}

impl WatchdogState {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            WatchdogState::Idle => "idle",
            WatchdogState::Starting => "starting",
            WatchdogState::Running => "running",
            WatchdogState::Stopping => "stopping",
            WatchdogState::Stopped => "stopped",
        }
    }

    /// True once the session is over.
    pub fn is_stopped(&self) -> bool {
        matches!(self, WatchdogState::Stopped)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn allows(&self, next: WatchdogState) -> bool {
        use WatchdogState::*;
        matches!(
            (self, next),
            (Idle, Starting)
                | (Starting, Running)
                | (Starting, Stopped)
                | (Running, Starting)
                | (Running, Stopping)
                | (Running, Stopped)
                | (Stopping, Stopped)
        )
    }
}

/// Observable holder of the current state.
pub(crate) struct StateCell {
    tx: watch::Sender<WatchdogState>,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(WatchdogState::Idle);
        Self { tx }
    }

    pub(crate) fn get(&self) -> WatchdogState {
        *self.tx.borrow()
    }

    /// Moves to `next`; same-state transitions are ignored.
    pub(crate) fn set(&self, next: WatchdogState) {
        self.tx.send_if_modified(|cur| {
            if *cur == next {
                return false;
            }
            debug_assert!(
                cur.allows(next),
                "illegal transition {} -> {}",
                cur.as_label(),
                next.as_label()
            );
            tracing::trace!(from = cur.as_label(), to = next.as_label(), "state transition");
            *cur = next;
            true
        });
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<WatchdogState> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use WatchdogState::*;

    #[test]
    fn test_restart_cycle_is_legal() {
        assert!(Idle.allows(Starting));
        assert!(Starting.allows(Running));
        assert!(Running.allows(Starting));
        assert!(Running.allows(Stopping));
        assert!(Stopping.allows(Stopped));
    }

    #[test]
    fn test_no_way_out_of_stopped() {
        for next in [Idle, Starting, Running, Stopping] {
            assert!(!Stopped.allows(next));
        }
        assert!(!Idle.allows(Running));
        assert!(!Stopping.allows(Starting));
    }

    #[tokio::test]
    async fn test_cell_notifies_subscribers() {
        let cell = StateCell::new();
        let mut rx = cell.subscribe();
        assert_eq!(cell.get(), Idle);

        cell.set(Starting);
        cell.set(Starting);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Starting);

        cell.set(Stopped);
        let seen = rx.wait_for(|s| s.is_stopped()).await.unwrap();
        assert_eq!(*seen, Stopped);
    }
}
