//! Error types used by the procvisor runtime, instances and providers.
//!
//! This module defines one error enum per layer:
//!
//! - [`InstanceError`] errors raised by a single supervised process (spawn, signal, wait).
//! - [`ProviderError`] errors raised by a [`Provider`](crate::Provider) implementation.
//! - [`RuntimeError`] terminal errors returned by [`Watchdog::run`](crate::Watchdog::run).
//! - [`WatchdogError`] errors returned to external callers of the watchdog handle.
//!
//! Every type provides `as_label` (stable snake_case label for logs) and
//! `as_message` (human-readable details).

use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use nix::sys::signal::Signal;
use thiserror::Error;

/// # Errors produced by a supervised process.
///
/// Instances never retry on their own; these errors are reported to the
/// watchdog, which decides what happens next.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum InstanceError {
    /// The OS refused to create the process (missing or non-executable binary, etc.).
    #[error("failed to spawn {executable:?}: {source}")]
    Spawn {
        /// Executable that was launched.
        executable: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// `spawn` was called on an instance that already owns a process.
    #[error("instance already spawned")]
    AlreadySpawned,

    /// The process was never spawned or has already exited.
    #[error("instance is not running")]
    NotRunning,

    /// Signal delivery failed.
    #[error("failed to deliver {signal:?} to pid {pid}: {source}")]
    Signal {
        /// Signal that was sent.
        signal: Signal,
        /// Target process id.
        pid: u32,
        /// Underlying errno.
        #[source]
        source: Errno,
    },

    /// Waiting for the process failed.
    #[error("failed to wait for instance: {source}")]
    Wait {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl InstanceError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use procvisor::InstanceError;
    ///
    /// assert_eq!(InstanceError::NotRunning.as_label(), "instance_not_running");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            InstanceError::Spawn { .. } => "instance_spawn_failed",
            InstanceError::AlreadySpawned => "instance_already_spawned",
            InstanceError::NotRunning => "instance_not_running",
            InstanceError::Signal { .. } => "instance_signal_failed",
            InstanceError::Wait { .. } => "instance_wait_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            InstanceError::Spawn { executable, source } => {
                format!("spawn {}: {source}", executable.display())
            }
            InstanceError::AlreadySpawned => "already spawned".to_string(),
            InstanceError::NotRunning => "not running".to_string(),
            InstanceError::Signal {
                signal,
                pid,
                source,
            } => format!("signal {signal:?} to pid={pid}: {source}"),
            InstanceError::Wait { source } => format!("wait: {source}"),
        }
    }
}

/// # Errors produced by a [`Provider`](crate::Provider).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The configuration file could not be read.
    #[error("failed to read config {path:?}: {source}")]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML or does not match the schema.
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// The configuration parsed but is semantically invalid.
    #[error("invalid config: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },

    /// A bare executable name was not found in the supervisor's `PATH`.
    #[error("executable {executable:?} not found in PATH: {source}")]
    NotFound {
        /// Name as written in the configuration.
        executable: PathBuf,
        /// Lookup failure.
        #[source]
        source: which::Error,
    },

    /// Preparing the instance environment (directories, files) failed.
    #[error("failed to prepare {path:?}: {source}")]
    Prepare {
        /// Path that could not be prepared.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Any other provider-specific failure.
    #[error("{reason}")]
    Other {
        /// Failure description.
        reason: String,
    },
}

impl ProviderError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProviderError::Read { .. } => "provider_read_failed",
            ProviderError::Parse { .. } => "provider_parse_failed",
            ProviderError::Invalid { .. } => "provider_invalid_config",
            ProviderError::NotFound { .. } => "provider_executable_not_found",
            ProviderError::Prepare { .. } => "provider_prepare_failed",
            ProviderError::Other { .. } => "provider_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// # Terminal errors of a supervision session.
///
/// Only start-time failures end a session with an error. Crashes, policy
/// errors and signal delivery problems are absorbed by the watchdog and logged.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The pre-action hook failed before a (re)start.
    #[error("pre-action failed: {reason}")]
    PreAction {
        /// Message returned by the hook.
        reason: String,
    },

    /// The provider failed to supply a logger or an instance.
    #[error("provider failed: {0}")]
    Provider(#[from] ProviderError),

    /// The instance could not be spawned.
    #[error("failed to start instance: {0}")]
    Start(#[from] InstanceError),

    /// Operator signal handlers could not be registered.
    #[error("failed to register signal handlers: {0}")]
    Signals(#[source] io::Error),

    /// `run` was called on a watchdog that already ran a session.
    #[error("watchdog already ran a supervision session")]
    AlreadyRan,
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use procvisor::RuntimeError;
    ///
    /// let err = RuntimeError::PreAction { reason: "no data dir".into() };
    /// assert_eq!(err.as_label(), "runtime_pre_action_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::PreAction { .. } => "runtime_pre_action_failed",
            RuntimeError::Provider(_) => "runtime_provider_failed",
            RuntimeError::Start(_) => "runtime_start_failed",
            RuntimeError::Signals(_) => "runtime_signals_failed",
            RuntimeError::AlreadyRan => "runtime_already_ran",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::PreAction { reason } => format!("pre-action: {reason}"),
            RuntimeError::Provider(e) => format!("provider: {}", e.as_message()),
            RuntimeError::Start(e) => format!("start: {}", e.as_message()),
            RuntimeError::Signals(e) => format!("signals: {e}"),
            RuntimeError::AlreadyRan => "already ran".to_string(),
        }
    }
}

/// # Errors returned to callers holding a watchdog handle.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WatchdogError {
    /// No instance is current (not started yet, restarting, or stopped).
    #[error("no current instance")]
    NoCurrentInstance,

    /// The current instance rejected the operation.
    #[error(transparent)]
    Instance(#[from] InstanceError),
}

impl WatchdogError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            WatchdogError::NoCurrentInstance => "watchdog_no_current_instance",
            WatchdogError::Instance(e) => e.as_label(),
        }
    }
}
