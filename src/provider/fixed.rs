//! # In-memory provider with a fixed command line.
//!
//! [`StaticProvider`] always launches the same executable. Its restart flag can
//! be flipped at runtime, which is how an embedder ends supervision after one
//! intentional kill: clear the flag, then signal the instance.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::instance::{Instance, InstanceCtx};
use crate::logger::Logger;
use crate::provider::Provider;

/// Provider that launches a fixed command.
#[derive(Debug)]
pub struct StaticProvider {
    executable: PathBuf,
    ctx: InstanceCtx,
    env: Vec<(OsString, OsString)>,
    restartable: AtomicBool,
}

impl StaticProvider {
    /// Creates a restartable provider that inherits the supervisor's environment.
    pub fn new(executable: impl Into<PathBuf>, ctx: InstanceCtx) -> Self {
        Self {
            executable: executable.into(),
            ctx,
            env: std::env::vars_os().collect(),
            restartable: AtomicBool::new(true),
        }
    }

    /// Replaces the child environment.
    pub fn with_env<I, K, V>(mut self, env: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        self.env = env.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    /// Sets the initial restart flag.
    pub fn with_restartable(self, restartable: bool) -> Self {
        self.set_restartable(restartable);
        self
    }

    /// Changes the restart flag; takes effect at the next exit.
    pub fn set_restartable(&self, restartable: bool) {
        self.restartable.store(restartable, Ordering::Release);
    }

    /// Current restart flag.
    pub fn restartable(&self) -> bool {
        self.restartable.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Provider for StaticProvider {
    async fn create_instance(&self, logger: &Logger) -> Result<Instance, ProviderError> {
        Ok(Instance::new(
            self.executable.clone(),
            self.ctx.clone(),
            self.env.clone(),
            logger.clone(),
        ))
    }

    async fn update_logger(&self, current: &Logger) -> Result<Logger, ProviderError> {
        Ok(current.clone())
    }

    async fn is_restartable(&self) -> Result<bool, ProviderError> {
        Ok(self.restartable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_restart_flag_is_read_every_call() {
        let provider = StaticProvider::new("sleep", InstanceCtx::default());
        assert!(provider.is_restartable().await.unwrap());

        provider.set_restartable(false);
        assert!(!provider.is_restartable().await.unwrap());
    }

    #[tokio::test]
    async fn test_instances_are_fresh_and_bound_to_logger() {
        let provider = StaticProvider::new("sleep", InstanceCtx::default().with_args(["1"]))
            .with_env([("A", "1")]);
        let logger = Logger::discard("sleeper");

        let a = provider.create_instance(&logger).await.unwrap();
        let b = provider.create_instance(&logger).await.unwrap();
        assert!(a.pid().is_none());
        assert!(b.pid().is_none());
        assert_eq!(a.logger().name(), "sleeper");
        assert_eq!(a.ctx().args, vec![OsString::from("1")]);
    }
}
