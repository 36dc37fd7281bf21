//! # LogWriter: events as `tracing` records
//!
//! A minimal subscriber that renders incoming [`Event`]s as `tracing` records
//! under the `procvisor::events` target, one record per event.
//!
//! ## Example output (fmt layer)
//! ```text
//! DEBUG procvisor::events: [starting] attempt=1
//!  INFO procvisor::events: [started] instance="primary" pid=4242 attempt=1
//!  WARN procvisor::events: [exited] instance="primary" pid=4242 status="signal: 9 (SIGKILL)"
//!  INFO procvisor::events: [restart] instance="primary" delay_ms=1000 after_attempt=1
//!  INFO procvisor::events: [shutdown-requested] reason="SIGTERM"
//!  INFO procvisor::events: [stopped-within-grace] instance="primary" pid=4243
//!  INFO procvisor::events: [watchdog-stopped]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const TARGET: &str = "procvisor::events";

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let instance = e.instance.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::InstanceStarting => {
                tracing::debug!(target: TARGET, seq = e.seq, attempt = ?e.attempt, "[starting]");
            }
            EventKind::InstanceStarted => {
                tracing::info!(target: TARGET, seq = e.seq, instance, pid = ?e.pid, attempt = ?e.attempt, "[started]");
            }
            EventKind::StartFailed => {
                tracing::error!(target: TARGET, seq = e.seq, attempt = ?e.attempt, reason, "[start-failed]");
            }
            EventKind::InstanceExited => {
                tracing::warn!(target: TARGET, seq = e.seq, instance, pid = ?e.pid, status = reason, "[exited]");
            }
            EventKind::RestartScheduled => {
                tracing::info!(target: TARGET, seq = e.seq, instance, delay_ms = ?e.delay_ms, after_attempt = ?e.attempt, "[restart]");
            }
            EventKind::RestartDeclined => {
                tracing::info!(target: TARGET, seq = e.seq, instance, reason, "[restart-declined]");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(target: TARGET, seq = e.seq, reason, "[shutdown-requested]");
            }
            EventKind::SignalForwarded => {
                tracing::debug!(target: TARGET, seq = e.seq, instance, pid = ?e.pid, signal = reason, "[signal-forwarded]");
            }
            EventKind::SignalFailed => {
                tracing::warn!(target: TARGET, seq = e.seq, instance, pid = ?e.pid, reason, "[signal-failed]");
            }
            EventKind::StoppedWithinGrace => {
                tracing::info!(target: TARGET, seq = e.seq, instance, pid = ?e.pid, status = reason, "[stopped-within-grace]");
            }
            EventKind::GraceExceeded => {
                tracing::warn!(target: TARGET, seq = e.seq, instance, pid = ?e.pid, grace_ms = ?e.timeout_ms, "[grace-exceeded]");
            }
            EventKind::WatchdogStopped => {
                tracing::info!(target: TARGET, seq = e.seq, reason, "[watchdog-stopped]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
