//! # Runtime events emitted by the watchdog.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Instance events**: start attempts, successful spawns, exits
//! - **Restart events**: scheduled restarts and declined restarts
//! - **Shutdown events**: operator requests, forwarded signals, grace outcome
//!
//! The [`Event`] struct carries metadata such as the instance name, pid,
//! attempt number and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use procvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::InstanceExited)
//!     .with_instance("primary")
//!     .with_pid(4242)
//!     .with_reason("signal: 9 (SIGKILL)");
//!
//! assert_eq!(ev.kind, EventKind::InstanceExited);
//! assert_eq!(ev.instance.as_deref(), Some("primary"));
//! assert_eq!(ev.pid, Some(4242));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Instance lifecycle events ===
    /// A start attempt began (pre-action is about to run).
    ///
    /// Sets:
    /// - `attempt`: attempt number (1-based, per session)
    InstanceStarting,

    /// The instance process was spawned and became current.
    ///
    /// Sets:
    /// - `instance`: instance name
    /// - `pid`: process id
    /// - `attempt`: attempt number
    InstanceStarted,

    /// A start attempt failed; the session ends.
    ///
    /// Sets:
    /// - `attempt`: attempt number
    /// - `reason`: error message
    StartFailed,

    /// The instance exited while the watchdog was running.
    ///
    /// Sets:
    /// - `instance`: instance name
    /// - `pid`: process id
    /// - `reason`: exit status
    InstanceExited,

    // === Restart events ===
    /// A replacement will be started after a delay.
    ///
    /// Sets:
    /// - `instance`: instance name
    /// - `attempt`: attempt number that just ended
    /// - `delay_ms`: delay before the next start (ms)
    RestartScheduled,

    /// The exited instance will not be replaced; the session ends.
    ///
    /// Sets:
    /// - `instance`: instance name
    /// - `reason`: why (policy disabled, provider declined, provider error)
    RestartDeclined,

    // === Shutdown events ===
    /// Operator shutdown requested (OS signal or explicit stop).
    ///
    /// Sets:
    /// - `reason`: signal name or "stop requested"
    ShutdownRequested,

    /// A termination signal was delivered to the current instance.
    ///
    /// Sets:
    /// - `instance`: instance name
    /// - `pid`: process id
    /// - `reason`: signal name
    SignalForwarded,

    /// Delivering a signal to the instance failed.
    ///
    /// Sets:
    /// - `instance`: instance name
    /// - `pid`: process id (if known)
    /// - `reason`: error message
    SignalFailed,

    /// The instance exited within the shutdown grace period.
    ///
    /// Sets:
    /// - `instance`: instance name
    /// - `pid`: process id
    /// - `reason`: exit status
    StoppedWithinGrace,

    /// Grace period exceeded; the instance was killed.
    ///
    /// Sets:
    /// - `instance`: instance name
    /// - `pid`: process id
    /// - `timeout_ms`: configured grace (ms)
    GraceExceeded,

    /// The supervision session ended (state `Stopped`).
    ///
    /// Sets:
    /// - `reason`: error message when the session ended with an error
    WatchdogStopped,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Instance name, if applicable.
    pub instance: Option<Arc<str>>,
    /// Process id of the instance.
    pub pid: Option<u32>,
    /// Start attempt (starting from 1).
    pub attempt: Option<u32>,
    /// Restart delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Grace period in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Human-readable reason (errors, exit status, signal name).
    pub reason: Option<Arc<str>>,
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            instance: None,
            pid: None,
            attempt: None,
            delay_ms: None,
            timeout_ms: None,
            reason: None,
        }
    }

    /// Attaches an instance name.
    #[inline]
    pub fn with_instance(mut self, name: impl Into<Arc<str>>) -> Self {
        self.instance = Some(name.into());
        self
    }

    /// Attaches a process id.
    #[inline]
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Attaches a process id if known.
    #[inline]
    pub fn with_pid_opt(mut self, pid: Option<u32>) -> Self {
        self.pid = pid;
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a restart delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a grace period (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// True for events after which the session is over.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::WatchdogStopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Event::new(EventKind::InstanceStarting);
        let b = Event::new(EventKind::InstanceStarted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_durations_are_compacted() {
        let ev = Event::new(EventKind::RestartScheduled)
            .with_delay(Duration::from_millis(250))
            .with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay_ms, Some(250));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }

    #[test]
    fn test_only_stopped_is_terminal() {
        assert!(Event::new(EventKind::WatchdogStopped).is_terminal());
        assert!(!Event::new(EventKind::RestartDeclined).is_terminal());
    }
}
