//! # Restart policy for the supervised instance.
//!
//! [`RestartPolicy`] determines whether a crashed instance is replaced and how
//! long the watchdog waits before spawning the replacement.
//!
//! The decision is made after **every** exit and needs two agreements:
//! ```text
//! policy.enabled ──► false ─► stop supervising
//!       │
//!       └─ true ──► provider.is_restartable()
//!                      ├─ Ok(true)  ─► sleep(policy.delay) ─► start again
//!                      ├─ Ok(false) ─► stop supervising
//!                      └─ Err(_)    ─► stop supervising (logged)
//! ```
//!
//! The delay is fixed. It exists to keep a crash loop from saturating the
//! host; it does not grow between attempts.

use std::time::Duration;

/// Policy controlling whether and when a crashed instance is restarted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestartPolicy {
    /// Whether restarts are allowed at all for this session.
    pub enabled: bool,
    /// Pause between an exit and the next start.
    pub delay: Duration,
}

impl RestartPolicy {
    /// Restart after every crash, waiting `delay` first.
    pub fn after(delay: Duration) -> Self {
        Self {
            enabled: true,
            delay,
        }
    }

    /// Never restart: the first exit ends supervision.
    pub fn never() -> Self {
        Self {
            enabled: false,
            delay: Duration::ZERO,
        }
    }
}

impl Default for RestartPolicy {
    /// Returns an enabled policy with a 5s delay.
    fn default() -> Self {
        Self::after(Duration::from_secs(5))
    }
}
