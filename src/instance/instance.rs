//! # Instance: one supervised OS process.
//!
//! An [`Instance`] is created by a [`Provider`](crate::Provider), spawned once
//! by the watchdog and dropped after its process exits. It is never reused;
//! a restart always builds a new `Instance`.
//!
//! ## Lifecycle
//! ```text
//! new() ──► spawn() ──► alive ──► wait() returns ──► exited (status recorded)
//!              │                      ▲
//!              └─► Err(Spawn)         └── send_signal()/kill() or crash
//! ```
//!
//! ## Rules
//! - `spawn` succeeds at most once; later calls return `AlreadySpawned`.
//! - `is_alive` never blocks and is safe to call while another task is inside `wait`.
//! - `wait` is cancel-safe: dropping it leaves the child owned by the instance.
//! - `send_signal` refuses to target a process that has been observed to exit.
//! - A dropped instance kills its process if it is still running.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::error::InstanceError;
use crate::instance::InstanceCtx;
use crate::logger::Logger;

/// Shared handle to an instance.
pub type InstanceRef = Arc<Instance>;

/// Single-use wrapper around a child process.
pub struct Instance {
    executable: PathBuf,
    ctx: InstanceCtx,
    env: Vec<(OsString, OsString)>,
    logger: Logger,

    spawned: AtomicBool,
    alive: AtomicBool,
    pid: OnceLock<u32>,
    status: OnceLock<ExitStatus>,
    child: Mutex<Option<Child>>,
}

impl Instance {
    /// Creates an instance that is not yet running.
    ///
    /// `env` is the complete environment of the child; the supervisor's own
    /// environment is not inherited unless it is included here.
    pub fn new(
        executable: impl Into<PathBuf>,
        ctx: InstanceCtx,
        env: Vec<(OsString, OsString)>,
        logger: Logger,
    ) -> Self {
        Self {
            executable: executable.into(),
            ctx,
            env,
            logger,
            spawned: AtomicBool::new(false),
            alive: AtomicBool::new(false),
            pid: OnceLock::new(),
            status: OnceLock::new(),
            child: Mutex::new(None),
        }
    }

    /// Launches the process.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self) -> Result<(), InstanceError> {
        if self.spawned.swap(true, Ordering::AcqRel) {
            return Err(InstanceError::AlreadySpawned);
        }
        let spawn_err = |source| InstanceError::Spawn {
            executable: self.executable.clone(),
            source,
        };

        let (stdout, stderr) = self.logger.stdio().map_err(spawn_err)?;
        let mut cmd = Command::new(&self.executable);
        cmd.args(self.ctx.command_args())
            .env_clear()
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true);
        if let Some(dir) = &self.ctx.work_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(spawn_err)?;
        let pid = child.id();
        {
            // `wait` and `is_alive` only lock once the pid/alive flag are published below.
            let mut slot = self
                .child
                .try_lock()
                .map_err(|_| InstanceError::AlreadySpawned)?;
            *slot = Some(child);
        }
        if let Some(pid) = pid {
            let _ = self.pid.set(pid);
        }
        self.alive.store(true, Ordering::Release);
        Ok(())
    }

    /// Reports whether the process is running.
    pub fn is_alive(&self) -> bool {
        if !self.alive.load(Ordering::Acquire) {
            return false;
        }
        // Nobody may be waiting yet; reap opportunistically so exits are observed.
        if let Ok(mut slot) = self.child.try_lock() {
            if let Some(child) = slot.as_mut() {
                if let Ok(Some(status)) = child.try_wait() {
                    self.record_exit(status);
                    return false;
                }
            }
        }
        self.alive.load(Ordering::Acquire)
    }

    /// Delivers `signal` to the process.
    pub fn send_signal(&self, signal: Signal) -> Result<(), InstanceError> {
        let pid = match self.pid.get() {
            Some(pid) if self.is_alive() => *pid,
            _ => return Err(InstanceError::NotRunning),
        };
        let target = i32::try_from(pid).map_err(|_| InstanceError::NotRunning)?;
        kill(Pid::from_raw(target), signal).map_err(|source| InstanceError::Signal {
            signal,
            pid,
            source,
        })
    }

    /// Sends `SIGKILL`.
    pub fn kill(&self) -> Result<(), InstanceError> {
        self.send_signal(Signal::SIGKILL)
    }

    /// Suspends until the process exits and returns its status.
    ///
    /// Once an exit has been observed, returns the recorded status immediately.
    pub async fn wait(&self) -> Result<ExitStatus, InstanceError> {
        if let Some(status) = self.status.get() {
            return Ok(*status);
        }
        if self.pid.get().is_none() {
            return Err(InstanceError::NotRunning);
        }
        let mut slot = self.child.lock().await;
        if let Some(status) = self.status.get() {
            return Ok(*status);
        }
        let Some(child) = slot.as_mut() else {
            self.record_lost();
            return Err(InstanceError::NotRunning);
        };
        match child.wait().await {
            Ok(status) => {
                self.record_exit(status);
                Ok(status)
            }
            Err(source) => {
                self.record_lost();
                Err(InstanceError::Wait { source })
            }
        }
    }

    /// OS process id, present once spawned.
    pub fn pid(&self) -> Option<u32> {
        self.pid.get().copied()
    }

    /// Exit status, present once the exit has been observed.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.status.get().copied()
    }

    /// Executable path.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Launch context.
    pub fn ctx(&self) -> &InstanceCtx {
        &self.ctx
    }

    /// Logger bound to this instance.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    fn record_exit(&self, status: ExitStatus) {
        let _ = self.status.set(status);
        self.alive.store(false, Ordering::Release);
    }

    /// The child can no longer be observed; treat it as gone.
    fn record_lost(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("executable", &self.executable)
            .field("name", &self.logger.name())
            .field("pid", &self.pid())
            .field("alive", &self.alive.load(Ordering::Acquire))
            .finish()
    }
}
