//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the watchdog.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Watchdog` (start/exit/restart/shutdown transitions),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the watchdog's subscriber listener (fans out to
//!   `SubscriberSet`) and any receiver obtained from `Watchdog::subscribe`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
