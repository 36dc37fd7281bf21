//! # Pre-action hook.
//!
//! A [`PreAction`] runs right before every (re)start of the instance, e.g. to
//! create data directories or clean stale pid files. Any closure
//! `Fn() -> Result<(), E>` with a displayable `E` is a `PreAction`.
//!
//! A failing hook aborts the start attempt, which ends the supervision session.
//!
//! ## Example
//! ```rust
//! use procvisor::PreAction;
//!
//! let hook = || -> Result<(), std::io::Error> {
//!     std::fs::create_dir_all(std::env::temp_dir().join("procvisor-doc"))
//! };
//! assert!(hook.run().is_ok());
//! ```

use std::convert::Infallible;
use std::fmt::Display;

/// Side-effecting callback executed before each (re)start.
pub trait PreAction: Send + Sync + 'static {
    /// Runs the hook; `Err` carries a message for logs and the returned error.
    fn run(&self) -> Result<(), String>;
}

impl<F, E> PreAction for F
where
    F: Fn() -> Result<(), E> + Send + Sync + 'static,
    E: Display,
{
    fn run(&self) -> Result<(), String> {
        (self)().map_err(|e| e.to_string())
    }
}

/// Hook that does nothing.
pub fn noop() -> impl PreAction {
    || Ok::<(), Infallible>(())
}
