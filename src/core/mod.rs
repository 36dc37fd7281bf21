//! Runtime core: supervision and lifecycle.
//!
//! The public API from this module is [`Watchdog`] (built directly or through
//! [`WatchdogBuilder`]), its [`WatchdogConfig`] and the observable
//! [`WatchdogState`].
//!
//! Internal modules:
//! - [`watchdog`]: the monitoring loop, restart decisions, graceful shutdown;
//! - [`slot`]: the mutex-guarded current-instance reference;
//! - [`state`]: lifecycle states and their `watch` publication;
//! - [`shutdown`]: per-session SIGINT/SIGTERM listeners.

mod builder;
mod config;
mod shutdown;
mod slot;
mod state;
mod watchdog;

pub use builder::WatchdogBuilder;
pub use config::WatchdogConfig;
pub use state::WatchdogState;
pub use watchdog::Watchdog;
