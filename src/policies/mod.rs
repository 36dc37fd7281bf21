//! Restart policy.
//!
//! This module groups the knobs that control **if/when** a crashed instance is
//! replaced.
//!
//! ## Contents
//! - [`RestartPolicy`] restart-enabled flag plus a fixed delay
//!
//! ## Quick wiring
//! ```text
//! WatchdogConfig { restart: RestartPolicy, grace, .. }
//!      └─► core::Watchdog uses:
//!           - restart.enabled + Provider::is_restartable() to decide continue/exit
//!           - restart.delay as a cancellable pause before the next start
//! ```

mod restart;

pub use restart::RestartPolicy;
