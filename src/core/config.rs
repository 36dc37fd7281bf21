//! # Watchdog configuration.
//!
//! Provides [`WatchdogConfig`] centralized settings for one supervision session.
//!
//! ## Field semantics
//! - `restart`: restart-enabled flag and fixed delay between exit and restart
//! - `grace`: how long a stopping instance may take before it is killed
//! - `os_signals`: register SIGINT/SIGTERM handlers on the supervisor process
//! - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)

use std::time::Duration;

use crate::policies::RestartPolicy;

/// Configuration for a [`Watchdog`](crate::Watchdog).
///
/// Immutable once the watchdog is built.
#[derive(Clone, Debug)]
pub struct WatchdogConfig {
    /// Whether and when to replace an exited instance.
    pub restart: RestartPolicy,

    /// Maximum time to wait for the instance after forwarding a termination signal.
    ///
    /// When it elapses the instance receives `SIGKILL`. `Duration::ZERO` kills
    /// right after the termination signal.
    pub grace: Duration,

    /// Register operator signal handlers (SIGINT, SIGTERM) for the session.
    ///
    /// Disable when the embedding program handles signals itself and calls
    /// [`Watchdog::stop`](crate::Watchdog::stop).
    pub os_signals: bool,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl WatchdogConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for WatchdogConfig {
    /// Default configuration:
    ///
    /// - `restart = RestartPolicy::default()` (enabled, 5s delay)
    /// - `grace = 30s`
    /// - `os_signals = true`
    /// - `bus_capacity = 256`
    fn default() -> Self {
        Self {
            restart: RestartPolicy::default(),
            grace: Duration::from_secs(30),
            os_signals: true,
            bus_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = WatchdogConfig::default();
        assert!(cfg.restart.enabled);
        assert!(cfg.os_signals);
        assert_eq!(cfg.grace, Duration::from_secs(30));
    }

    #[test]
    fn test_bus_capacity_clamped() {
        let cfg = WatchdogConfig {
            bus_capacity: 0,
            ..WatchdogConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
