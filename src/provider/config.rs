//! # TOML-backed provider.
//!
//! [`ConfigProvider`] reads its file on **every** call, so edits made while an
//! instance is running take effect at the next restart: command line,
//! environment, log destination and the restart flag itself.
//!
//! ## File format
//! ```toml
//! [instance]
//! executable = "/usr/bin/tarantool"
//! app_path = "init.lua"          # optional, passed as the first argument
//! work_dir = "var/run"           # optional
//! args = ["--name", "primary"]   # optional
//! inherit_env = true             # default: true
//! env = { TT_LISTEN = "3301" }   # optional overrides
//!
//! [restart]
//! enabled = true                 # default: true
//!
//! [log]
//! name = "primary"               # default: executable file name
//! file = "var/log/primary.log"   # optional; omitted = inherit stdio
//! discard = false                # optional; cannot be combined with `file`
//! ```
//!
//! Relative `app_path`, `work_dir` and `log.file` are resolved against the
//! directory of the config file. A relative `executable` with more than one
//! path component is resolved the same way; a bare name is looked up in the
//! supervisor's own `PATH` when the file is parsed, so the child receives an
//! absolute path even when `inherit_env = false` leaves it without `PATH`.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::instance::{Instance, InstanceCtx};
use crate::logger::{LogSink, Logger};
use crate::provider::Provider;

fn default_true() -> bool {
    true
}

/// Parsed configuration file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct InstanceFile {
    /// How to launch the instance.
    pub instance: InstanceSection,
    /// Restart switch.
    #[serde(default)]
    pub restart: RestartSection,
    /// Where instance output goes.
    #[serde(default)]
    pub log: LogSection,
}

/// `[instance]` table.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct InstanceSection {
    pub executable: PathBuf,
    pub app_path: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_true")]
    pub inherit_env: bool,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// `[restart]` table.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RestartSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for RestartSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// `[log]` table.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    pub name: Option<String>,
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub discard: bool,
}

impl InstanceFile {
    /// Parses `content` read from `path`, resolving relative paths and validating.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ProviderError> {
        Self::parse_in(content, path, std::env::var_os("PATH").as_deref())
    }

    /// Same as [`parse`](Self::parse), looking bare executable names up in `search`.
    pub(crate) fn parse_in(
        content: &str,
        path: &Path,
        search: Option<&OsStr>,
    ) -> Result<Self, ProviderError> {
        let file: InstanceFile = toml::from_str(content).map_err(|source| ProviderError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        file.validate()?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        file.resolve(base, search)
    }

    fn resolve(mut self, base: &Path, search: Option<&OsStr>) -> Result<Self, ProviderError> {
        let join = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };

        let executable = &self.instance.executable;
        if executable.is_relative() {
            let resolved = if executable.components().count() > 1 {
                base.join(executable)
            } else {
                which::which_in(executable, search, base).map_err(|source| {
                    ProviderError::NotFound {
                        executable: executable.clone(),
                        source,
                    }
                })?
            };
            self.instance.executable = resolved;
        }
        self.instance.app_path = self.instance.app_path.take().map(join);
        self.instance.work_dir = self.instance.work_dir.take().map(join);
        self.log.file = self.log.file.take().map(join);
        Ok(self)
    }

    fn validate(&self) -> Result<(), ProviderError> {
        if self.instance.executable.as_os_str().is_empty() {
            return Err(ProviderError::Invalid {
                reason: "instance.executable is empty".to_string(),
            });
        }
        if self.log.discard && self.log.file.is_some() {
            return Err(ProviderError::Invalid {
                reason: "log.discard and log.file are mutually exclusive".to_string(),
            });
        }
        Ok(())
    }

    /// Launch context described by the file.
    pub fn ctx(&self) -> InstanceCtx {
        InstanceCtx {
            app_path: self.instance.app_path.clone(),
            work_dir: self.instance.work_dir.clone(),
            args: self.instance.args.iter().map(OsString::from).collect(),
        }
    }

    /// Child environment: optionally the supervisor's, then the overrides.
    pub fn env(&self) -> Vec<(OsString, OsString)> {
        let mut env: BTreeMap<OsString, OsString> = if self.instance.inherit_env {
            std::env::vars_os().collect()
        } else {
            BTreeMap::new()
        };
        for (k, v) in &self.instance.env {
            env.insert(OsString::from(k), OsString::from(v));
        }
        env.into_iter().collect()
    }

    /// Logger described by the `[log]` table.
    pub fn logger(&self) -> Logger {
        let name = self.log.name.clone().unwrap_or_else(|| {
            self.instance
                .executable
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "instance".to_string())
        });
        let sink = match (&self.log.file, self.log.discard) {
            (Some(path), _) => LogSink::File(path.clone()),
            (None, true) => LogSink::Null,
            (None, false) => LogSink::Inherit,
        };
        Logger::new(name, sink)
    }
}

/// Provider that reads a TOML file on every call.
#[derive(Debug, Clone)]
pub struct ConfigProvider {
    path: PathBuf,
}

impl ConfigProvider {
    /// Creates a provider for the file at `path`. The file is not read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the configuration file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the file.
    ///
    /// Blocking; the [`Provider`] methods use [`fetch`](Self::fetch) instead.
    pub fn load(&self) -> Result<InstanceFile, ProviderError> {
        let content = fs::read_to_string(&self.path).map_err(|source| self.read_err(source))?;
        InstanceFile::parse(&content, &self.path)
    }

    /// Reads and parses the file without blocking the runtime.
    pub async fn fetch(&self) -> Result<InstanceFile, ProviderError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| self.read_err(source))?;
        InstanceFile::parse(&content, &self.path)
    }

    fn read_err(&self, source: std::io::Error) -> ProviderError {
        ProviderError::Read {
            path: self.path.clone(),
            source,
        }
    }

    /// Creates the working directory and log directory if they are missing.
    ///
    /// Intended as the watchdog's pre-action.
    pub fn prepare(&self) -> Result<(), ProviderError> {
        let file = self.load()?;
        let log_dir = file
            .log
            .file
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf);
        for dir in file.instance.work_dir.iter().chain(log_dir.iter()) {
            fs::create_dir_all(dir).map_err(|source| ProviderError::Prepare {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl Provider for ConfigProvider {
    async fn create_instance(&self, logger: &Logger) -> Result<Instance, ProviderError> {
        let file = self.fetch().await?;
        Ok(Instance::new(
            file.instance.executable.clone(),
            file.ctx(),
            file.env(),
            logger.clone(),
        ))
    }

    async fn update_logger(&self, current: &Logger) -> Result<Logger, ProviderError> {
        let fresh = self.fetch().await?.logger();
        if &fresh == current {
            return Ok(current.clone());
        }
        tracing::debug!(name = %fresh.name(), sink = ?fresh.sink(), "logger reconfigured");
        Ok(fresh)
    }

    async fn is_restartable(&self) -> Result<bool, ProviderError> {
        Ok(self.fetch().await?.restart.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [instance]
        executable = "bin/server"
        app_path = "init.lua"
        work_dir = "/srv/app"
        args = ["--port", "3301"]
        inherit_env = false
        env = { MODE = "primary" }

        [restart]
        enabled = false

        [log]
        name = "primary"
        file = "log/primary.log"
    "#;

    #[test]
    fn test_parse_full_file() {
        let file = InstanceFile::parse(FULL, Path::new("/etc/app/instance.toml")).unwrap();

        assert_eq!(file.instance.executable, PathBuf::from("/etc/app/bin/server"));
        assert_eq!(file.instance.app_path, Some(PathBuf::from("/etc/app/init.lua")));
        assert_eq!(file.instance.work_dir, Some(PathBuf::from("/srv/app")));
        assert!(!file.restart.enabled);
        assert_eq!(
            file.env(),
            vec![(OsString::from("MODE"), OsString::from("primary"))]
        );
        assert_eq!(
            file.logger(),
            Logger::file("primary", "/etc/app/log/primary.log")
        );
        assert_eq!(file.ctx().command_args().len(), 3);
    }

    #[test]
    fn test_defaults() {
        let file = InstanceFile::parse(
            "[instance]\nexecutable = \"sh\"\n",
            Path::new("/etc/app/instance.toml"),
        )
        .unwrap();

        assert!(file.instance.executable.is_absolute());
        assert_eq!(file.instance.executable.file_name(), Some(OsStr::new("sh")));
        assert!(file.restart.enabled);
        assert!(file.instance.inherit_env);
        assert_eq!(file.logger(), Logger::inherit("sh"));
    }

    #[tokio::test]
    async fn test_bare_executable_runs_without_inherited_env() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir(&bin).unwrap();
        let script = bin.join("procvisor-test-server");
        fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let search = std::env::join_paths([Path::new("/nonexistent"), bin.as_path()]).unwrap();
        let content = "[instance]\nexecutable = \"procvisor-test-server\"\ninherit_env = false\n";
        let path = dir.path().join("instance.toml");
        let file = InstanceFile::parse_in(content, &path, Some(search.as_os_str())).unwrap();

        assert!(file.instance.executable.is_absolute());
        assert_eq!(
            file.instance.executable.file_name(),
            Some(OsStr::new("procvisor-test-server"))
        );
        assert!(file.env().is_empty());

        let inst = Instance::new(
            file.instance.executable.clone(),
            file.ctx(),
            file.env(),
            Logger::discard("server"),
        );
        inst.spawn().unwrap();
        assert!(inst.wait().await.unwrap().success());
    }

    #[test]
    fn test_unknown_bare_executable_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let content = "[instance]\nexecutable = \"procvisor-missing-binary\"\n";
        let err = InstanceFile::parse_in(
            content,
            &dir.path().join("instance.toml"),
            Some(dir.path().as_os_str()),
        )
        .unwrap_err();
        assert_eq!(err.as_label(), "provider_executable_not_found");
    }

    #[test]
    fn test_discard_and_file_conflict() {
        let content = r#"
            [instance]
            executable = "sleep"
            [log]
            file = "x.log"
            discard = true
        "#;
        let err = InstanceFile::parse(content, Path::new("a.toml")).unwrap_err();
        assert_eq!(err.as_label(), "provider_invalid_config");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let content = "[instance]\nexecutable = \"sleep\"\nrestartable = true\n";
        let err = InstanceFile::parse(content, Path::new("a.toml")).unwrap_err();
        assert_eq!(err.as_label(), "provider_parse_failed");
    }

    #[tokio::test]
    async fn test_restart_flag_follows_file_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instance.toml");
        fs::write(&path, "[instance]\nexecutable = \"sleep\"\n").unwrap();
        let provider = ConfigProvider::new(&path);
        assert!(provider.is_restartable().await.unwrap());

        fs::write(
            &path,
            "[instance]\nexecutable = \"sleep\"\n[restart]\nenabled = false\n",
        )
        .unwrap();
        assert!(!provider.is_restartable().await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let provider = ConfigProvider::new("/nonexistent/procvisor/instance.toml");
        let err = provider.is_restartable().await.unwrap_err();
        assert_eq!(err.as_label(), "provider_read_failed");
    }

    #[tokio::test]
    async fn test_update_logger_reuses_unchanged_logger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instance.toml");
        fs::write(
            &path,
            "[instance]\nexecutable = \"sleep\"\n[log]\nname = \"s\"\ndiscard = true\n",
        )
        .unwrap();
        let provider = ConfigProvider::new(&path);

        let current = Logger::discard("s");
        assert_eq!(provider.update_logger(&current).await.unwrap(), current);

        let other = Logger::inherit("old");
        assert_eq!(provider.update_logger(&other).await.unwrap(), current);
    }

    #[test]
    fn test_prepare_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instance.toml");
        fs::write(
            &path,
            "[instance]\nexecutable = \"sleep\"\nwork_dir = \"run\"\n[log]\nfile = \"log/a.log\"\n",
        )
        .unwrap();

        ConfigProvider::new(&path).prepare().unwrap();
        assert!(dir.path().join("run").is_dir());
        assert!(dir.path().join("log").is_dir());
    }
}
