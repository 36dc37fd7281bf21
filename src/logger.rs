//! # Instance logger.
//!
//! A [`Logger`] names the supervised instance and decides where its standard
//! output and error go. The watchdog's own structured records are emitted
//! through `tracing` inside [`Logger::span`], so every record carries the
//! instance name.
//!
//! Loggers are cheap to clone. A [`Provider`](crate::Provider) may hand back
//! a new one on every (re)start; file sinks are reopened each time, which lets
//! an external rotation tool move the file between restarts.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

/// Destination for the instance's stdout/stderr.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogSink {
    /// Share the supervisor's stdout/stderr.
    Inherit,
    /// Discard all output.
    Null,
    /// Append both streams to a file (created if missing).
    File(PathBuf),
}

/// Named log destination for one supervised instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Logger {
    name: Arc<str>,
    sink: LogSink,
}

impl Logger {
    /// Creates a logger with the given instance name and sink.
    pub fn new(name: impl Into<Arc<str>>, sink: LogSink) -> Self {
        Self {
            name: name.into(),
            sink,
        }
    }

    /// Logger that shares the supervisor's stdio.
    pub fn inherit(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, LogSink::Inherit)
    }

    /// Logger that discards instance output.
    pub fn discard(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, LogSink::Null)
    }

    /// Logger that appends instance output to `path`.
    pub fn file(name: impl Into<Arc<str>>, path: impl AsRef<Path>) -> Self {
        Self::new(name, LogSink::File(path.as_ref().to_path_buf()))
    }

    /// Instance name used in log records and events.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the instance name.
    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// Where instance output goes.
    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    /// Span that tags supervisor records about this instance.
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!("instance", name = %self.name)
    }

    /// Opens the sink and returns `(stdout, stderr)` handles for a child process.
    pub(crate) fn stdio(&self) -> io::Result<(Stdio, Stdio)> {
        match &self.sink {
            LogSink::Inherit => Ok((Stdio::inherit(), Stdio::inherit())),
            LogSink::Null => Ok((Stdio::null(), Stdio::null())),
            LogSink::File(path) => {
                let out = OpenOptions::new().create(true).append(true).open(path)?;
                let err = out.try_clone()?;
                Ok((Stdio::from(out), Stdio::from(err)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sink_is_created_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instance.log");
        let logger = Logger::file("app", &path);

        assert!(!path.exists());
        logger.stdio().unwrap();
        assert!(path.exists());
        assert_eq!(logger.sink(), &LogSink::File(path));
    }

    #[test]
    fn test_file_sink_in_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::file("app", dir.path().join("missing").join("x.log"));
        assert!(logger.stdio().is_err());
    }

    #[test]
    fn test_clone_shares_name() {
        let a = Logger::discard("db");
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(b.name(), "db");
        assert!(Arc::ptr_eq(&a.name_arc(), &b.name_arc()));
    }
}
