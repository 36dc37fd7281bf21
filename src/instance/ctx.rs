//! # Launch context for a supervised process.

use std::ffi::OsString;
use std::path::PathBuf;

/// Everything besides the executable and environment that shapes a launch.
///
/// The command line is built as `executable [app_path] [args...]`, which
/// matches servers that take the application script as their first argument.
///
/// # Example
/// ```
/// use procvisor::InstanceCtx;
///
/// let ctx = InstanceCtx::default()
///     .with_app_path("init.lua")
///     .with_work_dir("/var/lib/app")
///     .with_args(["--listen", "3301"]);
///
/// assert_eq!(ctx.command_args().len(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstanceCtx {
    /// Application entry point passed as the first argument, if any.
    pub app_path: Option<PathBuf>,
    /// Working directory of the child (`None` = supervisor's cwd).
    pub work_dir: Option<PathBuf>,
    /// Extra arguments appended after `app_path`.
    pub args: Vec<OsString>,
}

impl InstanceCtx {
    /// Sets the application path.
    pub fn with_app_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.app_path = Some(path.into());
        self
    }

    /// Sets the working directory.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Replaces the extra arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Full argument vector passed to the executable.
    pub fn command_args(&self) -> Vec<OsString> {
        self.app_path
            .iter()
            .map(|p| p.clone().into_os_string())
            .chain(self.args.iter().cloned())
            .collect()
    }
}
