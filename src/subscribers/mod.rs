//! # Event subscribers for the watchdog.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Watchdog ── publish(Event) ──► Bus ──► subscriber listener ──► SubscriberSet::emit(&Event)
//!                                                                 │
//!                                                      ┌──────────┼──────────┐
//!                                                      ▼          ▼          ▼
//!                                                  LogWriter   Metrics    Custom
//! ```
//!
//! The listener runs for the duration of [`Watchdog::run`](crate::Watchdog::run)
//! and drains every subscriber after `WatchdogStopped` is published.

mod log;
mod set;
mod subscriber;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
