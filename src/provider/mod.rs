//! # Instance providers.
//!
//! A [`Provider`] decouples the watchdog from configuration loading: it builds
//! fresh instances, refreshes the logger and answers the restart question.
//!
//! ## Implementations
//! - [`ConfigProvider`] re-reads a TOML file on every call
//! - [`StaticProvider`] fixed command line with a togglable restart flag
//!
//! ## Architecture
//! ```text
//! Watchdog ──(each start)──► update_logger(current) ──► Logger
//!          ──(each start)──► create_instance(&logger) ──► Instance
//!          ──(each exit) ──► is_restartable() ──► bool
//! ```

mod config;
mod fixed;
mod provider;

pub use config::{ConfigProvider, InstanceFile, InstanceSection, LogSection, RestartSection};
pub use fixed::StaticProvider;
pub use provider::{Provider, ProviderRef};
