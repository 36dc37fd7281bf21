//! # Watchdog: supervises one process, restarts it, shuts it down on request.
//!
//! The [`Watchdog`] owns the event bus, the current-instance slot and the
//! session's operator signal listeners. [`Watchdog::run`] is the blocking entry
//! point: it returns only once the session reaches `Stopped`.
//!
//! ## Two lines of execution
//! - the monitoring loop (inside `run`): starts instances, suspends on
//!   `Instance::wait`, decides restarts, sleeps the restart delay;
//! - shutdown requests (SIGINT/SIGTERM on this process, or [`Watchdog::stop`]),
//!   which may arrive at any point and interrupt either suspension.
//!
//! They share only the current-instance slot, which is guarded by a mutex.
//!
//! ## Session flow
//! ```text
//! run()
//!  ├─► state = Starting, register SIGINT/SIGTERM
//!  └─► loop {
//!        ├─► attempt += 1, publish InstanceStarting
//!        ├─► pre_action.run()                     ─ Err ─► StartFailed ─► Stopped, Err
//!        ├─► provider.update_logger(current)      ─ Err ─► StartFailed ─► Stopped, Err
//!        ├─► provider.create_instance(logger)     ─ Err ─► StartFailed ─► Stopped, Err
//!        ├─► instance.spawn()                     ─ Err ─► StartFailed ─► Stopped, Err
//!        ├─► slot.install(instance), state = Running, publish InstanceStarted
//!        ├─► select! {
//!        │     instance.wait()      ─► slot.clear(), publish InstanceExited
//!        │     shutdown requested   ─► state = Stopping
//!        │                             forward signal (SIGTERM for stop())
//!        │                             timeout(grace, wait) ─ elapsed ─► GraceExceeded, SIGKILL
//!        │                             ─► Stopped, Ok
//!        │   }
//!        ├─► restart.enabled && provider.is_restartable()?
//!        │     ├─ no  ─► RestartDeclined ─► Stopped, Ok
//!        │     └─ yes ─► RestartScheduled, state = Starting
//!        └─► select! { sleep(delay) ─► continue, shutdown requested ─► Stopped, Ok }
//!      }
//!  └─► drop signal listeners, state = Stopped, publish WatchdogStopped
//! ```
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use procvisor::{hooks, InstanceCtx, Logger, StaticProvider, Watchdog};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), procvisor::RuntimeError> {
//!     let provider = StaticProvider::new("/usr/bin/sleep", InstanceCtx::default().with_args(["3600"]));
//!     let wd = Watchdog::new(
//!         true,
//!         Duration::from_secs(1),
//!         Logger::inherit("sleeper"),
//!         Arc::new(provider),
//!         hooks::noop(),
//!     );
//!     wd.run().await
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::Signal;
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::core::shutdown::{self, ShutdownCause, ShutdownSignals};
use crate::core::slot::InstanceSlot;
use crate::core::state::StateCell;
use crate::core::{WatchdogBuilder, WatchdogConfig, WatchdogState};
use crate::error::{RuntimeError, WatchdogError};
use crate::events::{Bus, Event, EventKind};
use crate::hooks::PreAction;
use crate::instance::{Instance, InstanceRef};
use crate::logger::Logger;
use crate::policies::RestartPolicy;
use crate::provider::ProviderRef;
use crate::subscribers::{Subscribe, SubscriberSet};

/// How a monitored instance stopped being current.
enum Outcome {
    /// Exited on its own (crash, external signal, normal exit).
    Exited,
    /// Terminated because shutdown was requested.
    Shutdown,
}

/// Supervises a single process built by a [`Provider`](crate::Provider).
pub struct Watchdog {
    cfg: WatchdogConfig,
    provider: ProviderRef,
    pre_action: Box<dyn PreAction>,
    logger: Mutex<Logger>,

    slot: InstanceSlot,
    state: StateCell,
    bus: Bus,
    subscribers: Mutex<Vec<Arc<dyn Subscribe>>>,

    stop: CancellationToken,
    ran: AtomicBool,
}

impl Watchdog {
    /// Creates a watchdog from the five construction parameters.
    ///
    /// Grace period and OS-signal handling keep their defaults; use
    /// [`Watchdog::builder`] to change them.
    pub fn new(
        restart_enabled: bool,
        restart_delay: Duration,
        logger: Logger,
        provider: ProviderRef,
        pre_action: impl PreAction,
    ) -> Arc<Self> {
        Self::builder(provider, logger)
            .with_restart(RestartPolicy {
                enabled: restart_enabled,
                delay: restart_delay,
            })
            .with_pre_action(pre_action)
            .build()
    }

    /// Returns a builder for a watchdog over `provider`.
    pub fn builder(provider: ProviderRef, logger: Logger) -> WatchdogBuilder {
        WatchdogBuilder::new(provider, logger)
    }

    pub(crate) fn new_internal(
        cfg: WatchdogConfig,
        provider: ProviderRef,
        logger: Logger,
        pre_action: Box<dyn PreAction>,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self {
            cfg,
            provider,
            pre_action,
            logger: Mutex::new(logger),
            slot: InstanceSlot::new(),
            state: StateCell::new(),
            bus,
            subscribers: Mutex::new(subscribers),
            stop: CancellationToken::new(),
            ran: AtomicBool::new(false),
        }
    }

    /// Runs the supervision session until it reaches `Stopped`.
    ///
    /// Returns `Ok(())` after an operator shutdown or a declined restart, and
    /// `Err` when an instance could not be started. A watchdog runs one session;
    /// a second call returns [`RuntimeError::AlreadyRan`].
    pub async fn run(&self) -> Result<(), RuntimeError> {
        if self.ran.swap(true, Ordering::AcqRel) {
            return Err(RuntimeError::AlreadyRan);
        }
        let listener_done = CancellationToken::new();
        let listener = self.subscriber_listener(listener_done.clone());

        self.state.set(WatchdogState::Starting);
        let result = match self.register_signals() {
            Ok(mut signals) => self.supervise(&mut signals).await,
            Err(e) => Err(e),
        };
        self.state.set(WatchdogState::Stopped);

        let mut ev = Event::new(EventKind::WatchdogStopped);
        match &result {
            Ok(()) => tracing::info!("watchdog stopped"),
            Err(e) => {
                tracing::error!(error = %e, label = e.as_label(), "watchdog stopped with error");
                ev = ev.with_reason(e.as_message());
            }
        }
        self.bus.publish(ev);

        listener_done.cancel();
        if let Some(handle) = listener {
            let _ = handle.await;
        }
        result
    }

    /// Requests an orderly shutdown, as if SIGTERM had reached the supervisor.
    ///
    /// Idempotent; has no effect once the session is stopped.
    pub fn stop(&self) {
        if !self.stop.is_cancelled() {
            tracing::debug!(state = self.state().as_label(), "stop requested");
        }
        self.stop.cancel();
    }

    /// Delivers `signal` to the current instance.
    ///
    /// Fails with [`WatchdogError::NoCurrentInstance`] while no instance is
    /// current, e.g. during a restart delay.
    pub fn send_signal(&self, signal: Signal) -> Result<(), WatchdogError> {
        self.slot
            .with_current(|instance| instance.send_signal(signal))
            .ok_or(WatchdogError::NoCurrentInstance)?
            .map_err(WatchdogError::from)
    }

    /// Process id of the current instance.
    pub fn current_pid(&self) -> Option<u32> {
        self.slot.with_current(Instance::pid).flatten()
    }

    /// True if an instance is current and its process is running.
    pub fn is_instance_alive(&self) -> bool {
        self.slot.with_current(Instance::is_alive).unwrap_or(false)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WatchdogState {
        self.state.get()
    }

    /// Receiver that observes every state transition.
    pub fn subscribe_state(&self) -> watch::Receiver<WatchdogState> {
        self.state.subscribe()
    }

    /// Receiver for lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Logger used for the most recent instance.
    pub fn logger(&self) -> Logger {
        self.logger.lock().clone()
    }

    /// Session configuration.
    pub fn config(&self) -> &WatchdogConfig {
        &self.cfg
    }

    /// Subscribes to the bus and forwards events to the subscriber set.
    ///
    /// Stops after `done` is cancelled and every buffered event was forwarded.
    fn subscriber_listener(&self, done: CancellationToken) -> Option<JoinHandle<()>> {
        let subs = std::mem::take(&mut *self.subscribers.lock());
        if subs.is_empty() {
            return None;
        }
        let mut rx = self.bus.subscribe();
        Some(tokio::spawn(async move {
            let set = SubscriberSet::new(subs);
            loop {
                tokio::select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "subscriber listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = done.cancelled() => break,
                }
            }
            set.shutdown().await;
        }))
    }

    fn register_signals(&self) -> Result<Option<ShutdownSignals>, RuntimeError> {
        if !self.cfg.os_signals {
            return Ok(None);
        }
        ShutdownSignals::register()
            .map(Some)
            .map_err(RuntimeError::Signals)
    }

    /// The monitoring loop.
    async fn supervise(&self, signals: &mut Option<ShutdownSignals>) -> Result<(), RuntimeError> {
        let mut attempt: u32 = 0;
        loop {
            if self.stop.is_cancelled() {
                self.publish_shutdown(ShutdownCause::Requested);
                return Ok(());
            }
            attempt = attempt.saturating_add(1);

            let Some(instance) = self.start_instance(attempt).await? else {
                self.publish_shutdown(ShutdownCause::Requested);
                return Ok(());
            };

            let span = instance.logger().span();
            let outcome = self.monitor(&instance, signals).instrument(span.clone()).await;
            if let Outcome::Shutdown = outcome {
                return Ok(());
            }
            if !self.should_restart(&instance).instrument(span.clone()).await {
                return Ok(());
            }

            let delay = self.cfg.restart.delay;
            self.state.set(WatchdogState::Starting);
            span.in_scope(|| {
                tracing::info!(delay_ms = delay.as_millis() as u64, attempt, "restart scheduled");
            });
            self.bus.publish(
                Event::new(EventKind::RestartScheduled)
                    .with_instance(instance.logger().name_arc())
                    .with_attempt(attempt)
                    .with_delay(delay),
            );
            drop(instance);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                cause = shutdown::shutdown_requested(signals, &self.stop) => {
                    tracing::info!(cause = %cause.describe(), "shutdown requested during restart delay");
                    self.publish_shutdown(cause);
                    return Ok(());
                }
            }
        }
    }

    /// Runs one start attempt. `Ok(None)` means a stop arrived before spawning.
    async fn start_instance(&self, attempt: u32) -> Result<Option<InstanceRef>, RuntimeError> {
        self.bus
            .publish(Event::new(EventKind::InstanceStarting).with_attempt(attempt));

        match self.try_start().await {
            Ok(Some(instance)) => {
                let pid = instance.pid();
                instance.logger().span().in_scope(|| {
                    tracing::info!(pid, attempt, executable = %instance.executable().display(), "instance started");
                });
                self.bus.publish(
                    Event::new(EventKind::InstanceStarted)
                        .with_instance(instance.logger().name_arc())
                        .with_pid_opt(pid)
                        .with_attempt(attempt),
                );
                Ok(Some(instance))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                tracing::error!(attempt, error = %e, label = e.as_label(), "failed to start instance");
                self.bus.publish(
                    Event::new(EventKind::StartFailed)
                        .with_attempt(attempt)
                        .with_reason(e.as_message()),
                );
                Err(e)
            }
        }
    }

    async fn try_start(&self) -> Result<Option<InstanceRef>, RuntimeError> {
        self.pre_action
            .run()
            .map_err(|reason| RuntimeError::PreAction { reason })?;

        let current = self.logger.lock().clone();
        let logger = self.provider.update_logger(&current).await?;
        *self.logger.lock() = logger.clone();

        let instance = self.provider.create_instance(&logger).await?;
        if self.stop.is_cancelled() {
            return Ok(None);
        }
        instance.spawn()?;

        let instance = Arc::new(instance);
        self.slot.install(Arc::clone(&instance));
        self.state.set(WatchdogState::Running);
        Ok(Some(instance))
    }

    /// Suspends until the instance exits or shutdown is requested.
    async fn monitor(
        &self,
        instance: &InstanceRef,
        signals: &mut Option<ShutdownSignals>,
    ) -> Outcome {
        tokio::select! {
            res = instance.wait() => {
                self.slot.clear();
                let status = match res {
                    Ok(status) => status.to_string(),
                    Err(e) => {
                        tracing::error!(error = %e, "waiting for instance failed");
                        e.as_message()
                    }
                };
                tracing::warn!(pid = instance.pid(), %status, "instance exited");
                self.bus.publish(
                    Event::new(EventKind::InstanceExited)
                        .with_instance(instance.logger().name_arc())
                        .with_pid_opt(instance.pid())
                        .with_reason(status),
                );
                Outcome::Exited
            }
            cause = shutdown::shutdown_requested(signals, &self.stop) => {
                self.shutdown_instance(instance, cause).await;
                Outcome::Shutdown
            }
        }
    }

    /// Forwards the termination signal and waits up to the grace period.
    async fn shutdown_instance(&self, instance: &Instance, cause: ShutdownCause) {
        self.state.set(WatchdogState::Stopping);
        tracing::info!(cause = %cause.describe(), "shutdown requested");
        self.publish_shutdown(cause);

        let name = instance.logger().name_arc();
        let pid = instance.pid();
        let signal = cause.forward();
        match instance.send_signal(signal) {
            Ok(()) => {
                tracing::debug!(pid, ?signal, "signal forwarded");
                self.bus.publish(
                    Event::new(EventKind::SignalForwarded)
                        .with_instance(Arc::clone(&name))
                        .with_pid_opt(pid)
                        .with_reason(format!("{signal:?}")),
                );
            }
            Err(e) => {
                tracing::warn!(pid, ?signal, error = %e, "failed to forward signal");
                self.bus.publish(
                    Event::new(EventKind::SignalFailed)
                        .with_instance(Arc::clone(&name))
                        .with_pid_opt(pid)
                        .with_reason(e.as_message()),
                );
            }
        }

        let grace = self.cfg.grace;
        match tokio::time::timeout(grace, instance.wait()).await {
            Ok(res) => {
                let status = res.map(|s| s.to_string()).unwrap_or_else(|e| e.as_message());
                tracing::info!(pid, %status, "instance stopped within grace period");
                self.bus.publish(
                    Event::new(EventKind::StoppedWithinGrace)
                        .with_instance(Arc::clone(&name))
                        .with_pid_opt(pid)
                        .with_reason(status),
                );
            }
            Err(_) => {
                tracing::warn!(pid, grace_ms = grace.as_millis() as u64, "grace period exceeded, killing instance");
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded)
                        .with_instance(Arc::clone(&name))
                        .with_pid_opt(pid)
                        .with_timeout(grace),
                );
                if let Err(e) = instance.kill() {
                    tracing::warn!(pid, error = %e, "failed to kill instance");
                }
                match instance.wait().await {
                    Ok(status) => tracing::debug!(pid, %status, "instance killed"),
                    Err(e) => tracing::error!(pid, error = %e, "waiting for killed instance failed"),
                }
            }
        }
        self.slot.clear();
    }

    /// Decides whether the exited instance is replaced.
    async fn should_restart(&self, instance: &Instance) -> bool {
        let name = instance.logger().name_arc();
        let declined = |reason: String| {
            tracing::info!(%reason, "not restarting instance");
            self.bus.publish(
                Event::new(EventKind::RestartDeclined)
                    .with_instance(Arc::clone(&name))
                    .with_reason(reason),
            );
            false
        };

        if !self.cfg.restart.enabled {
            return declined("restart disabled".to_string());
        }
        match self.provider.is_restartable().await {
            Ok(true) => true,
            Ok(false) => declined("provider declined restart".to_string()),
            Err(e) => {
                tracing::warn!(error = %e, label = e.as_label(), "restart check failed");
                declined(e.as_message())
            }
        }
    }

    fn publish_shutdown(&self, cause: ShutdownCause) {
        self.bus
            .publish(Event::new(EventKind::ShutdownRequested).with_reason(cause.describe()));
    }
}

impl std::fmt::Debug for Watchdog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watchdog")
            .field("state", &self.state())
            .field("restart", &self.cfg.restart)
            .field("grace", &self.cfg.grace)
            .field("current_pid", &self.current_pid())
            .finish()
    }
}
