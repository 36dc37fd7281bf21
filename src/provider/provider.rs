//! # Provider capability trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::instance::Instance;
use crate::logger::Logger;

/// Shared handle to a provider.
pub type ProviderRef = Arc<dyn Provider>;

/// # Source of instances, loggers and restart decisions.
///
/// Each call may consult external configuration freshly; the watchdog never
/// caches the answers. Providers manufacture instances but must not keep them.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use procvisor::{Instance, InstanceCtx, Logger, Provider, ProviderError};
///
/// struct Sleeper;
///
/// #[async_trait]
/// impl Provider for Sleeper {
///     async fn create_instance(&self, logger: &Logger) -> Result<Instance, ProviderError> {
///         let ctx = InstanceCtx::default().with_args(["60"]);
///         Ok(Instance::new("sleep", ctx, std::env::vars_os().collect(), logger.clone()))
///     }
///
///     async fn update_logger(&self, current: &Logger) -> Result<Logger, ProviderError> {
///         Ok(current.clone())
///     }
///
///     async fn is_restartable(&self) -> Result<bool, ProviderError> {
///         Ok(true)
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    /// Builds a new, not yet spawned instance from current configuration.
    ///
    /// An error aborts the start attempt.
    async fn create_instance(&self, logger: &Logger) -> Result<Instance, ProviderError>;

    /// Returns the logger for the next instance.
    ///
    /// May return `current` unchanged or rebuild it from configuration.
    async fn update_logger(&self, current: &Logger) -> Result<Logger, ProviderError>;

    /// Reports whether an instance that just exited should be replaced.
    ///
    /// The watchdog treats an error as "do not restart".
    async fn is_restartable(&self) -> Result<bool, ProviderError>;
}
