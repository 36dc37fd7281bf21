//! # Supervised process abstractions.
//!
//! This module provides the types that describe and own one child process:
//! - [`InstanceCtx`] - launch context (application path, working directory, arguments)
//! - [`Instance`] - a single-use wrapper over the live OS process
//! - [`InstanceRef`] - shared handle (`Arc<Instance>`) used by the watchdog

mod ctx;
mod instance;

pub use ctx::InstanceCtx;
pub use instance::{Instance, InstanceRef};
