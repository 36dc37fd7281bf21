//! # procvisor
//!
//! **Procvisor** is a single-instance process watchdog for Unix.
//!
//! It launches one server process, waits on it, restarts it after it exits
//! (crash, external signal, or normal exit) and shuts it down cleanly when the
//! supervisor itself receives SIGINT/SIGTERM. Everything that varies between
//! deployments (command line, environment, log destination, whether restarts
//! are wanted right now) comes from a [`Provider`] that is consulted freshly on
//! every (re)start.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Provider   │   │    Logger    │   │  PreAction   │
//!     │(instances,   │   │ (instance    │   │ (runs before │
//!     │ restart flag)│   │  output)     │   │  each start) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Watchdog (monitoring loop)                                       │
//! │  - InstanceSlot (mutex-guarded current instance)                  │
//! │  - StateCell (Idle/Starting/Running/Stopping/Stopped, watch)      │
//! │  - ShutdownSignals (SIGINT/SIGTERM, owned by one session)         │
//! │  - Bus (broadcast events)                                         │
//! └──────┬──────────────────────────────────────────────────┬─────────┘
//!        ▼                                                  │
//!     ┌──────────────┐                                      │
//!     │   Instance   │  spawn / wait / send_signal / kill   │
//!     │ (OS process) │                                      │
//!     └──────────────┘                                      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │              (capacity: WatchdogConfig::bus_capacity)             │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber listener   │
//!                       │    (in Watchdog)       │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                           (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                     LogWriter  worker2   workerN
//! ```
//!
//! ### Lifecycle
//! ```text
//! Idle ──► Starting ──► Running ──► Stopping ──► Stopped
//!
//! loop {
//!   ├─► pre_action, provider.update_logger, provider.create_instance, spawn
//!   │       └─ any Err ─► StartFailed ─► Stopped, run() returns Err
//!   ├─► wait for exit or shutdown request
//!   │       ├─ exit     ─► restart.enabled && provider.is_restartable()?
//!   │       │               ├─ yes ─► sleep(delay) (interruptible) ─► continue
//!   │       │               └─ no  ─► Stopped, run() returns Ok
//!   │       └─ shutdown ─► forward signal, wait grace, SIGKILL if needed
//!   │                       ─► Stopped, run() returns Ok
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                       | Key types / traits                     |
//! |-------------------|-------------------------------------------------------------------|----------------------------------------|
//! | **Supervision**   | Run, restart and stop one process.                                | [`Watchdog`], [`WatchdogBuilder`]      |
//! | **Providers**     | Supply instances, loggers and restart decisions.                  | [`Provider`], [`ConfigProvider`], [`StaticProvider`] |
//! | **Policies**      | Restart-enabled flag plus a fixed delay.                          | [`RestartPolicy`]                      |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, custom subscribers).| [`Subscribe`], [`LogWriter`]           |
//! | **Errors**        | Typed errors for instances, providers and the session.            | [`InstanceError`], [`RuntimeError`]    |
//! | **Configuration** | Centralize session settings.                                      | [`WatchdogConfig`]                     |
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use procvisor::{InstanceCtx, LogWriter, Logger, RestartPolicy, StaticProvider, Subscribe, Watchdog};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctx = InstanceCtx::default()
//!         .with_work_dir("/srv/app")
//!         .with_args(["--port", "8080"]);
//!     let provider = Arc::new(StaticProvider::new("/srv/app/server", ctx));
//!
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let wd = Watchdog::builder(provider, Logger::file("server", "/var/log/server.log"))
//!         .with_restart(RestartPolicy::after(Duration::from_secs(2)))
//!         .with_grace(Duration::from_secs(10))
//!         .with_subscribers(subs)
//!         .build();
//!
//!     // Runs until SIGINT/SIGTERM reaches this process.
//!     wd.run().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
pub mod hooks;
mod instance;
mod logger;
mod policies;
mod provider;
mod subscribers;

// ---- Public re-exports ----

pub use core::{Watchdog, WatchdogBuilder, WatchdogConfig, WatchdogState};
pub use error::{InstanceError, ProviderError, RuntimeError, WatchdogError};
pub use events::{Bus, Event, EventKind};
pub use hooks::PreAction;
pub use instance::{Instance, InstanceCtx, InstanceRef};
pub use logger::{LogSink, Logger};
pub use policies::RestartPolicy;
pub use provider::{
    ConfigProvider, InstanceFile, InstanceSection, LogSection, Provider, ProviderRef,
    RestartSection, StaticProvider,
};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};

/// Signal type accepted by [`Watchdog::send_signal`] and [`Instance::send_signal`].
pub use nix::sys::signal::Signal;
