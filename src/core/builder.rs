use std::sync::Arc;
use std::time::Duration;

use crate::{
    core::{Watchdog, WatchdogConfig},
    hooks::{self, PreAction},
    logger::Logger,
    policies::RestartPolicy,
    provider::ProviderRef,
    subscribers::Subscribe,
};

/// Builder for constructing a [`Watchdog`] with optional features.
pub struct WatchdogBuilder {
    cfg: WatchdogConfig,
    provider: ProviderRef,
    logger: Logger,
    pre_action: Box<dyn PreAction>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl WatchdogBuilder {
    /// Creates a builder with default configuration and a no-op pre-action.
    pub fn new(provider: ProviderRef, logger: Logger) -> Self {
        Self {
            cfg: WatchdogConfig::default(),
            provider,
            logger,
            pre_action: Box::new(hooks::noop()),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, cfg: WatchdogConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the restart policy.
    pub fn with_restart(mut self, restart: RestartPolicy) -> Self {
        self.cfg.restart = restart;
        self
    }

    /// Sets the shutdown grace period.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.cfg.grace = grace;
        self
    }

    /// Enables or disables SIGINT/SIGTERM handling on the supervisor process.
    pub fn with_os_signals(mut self, enabled: bool) -> Self {
        self.cfg.os_signals = enabled;
        self
    }

    /// Sets the event bus capacity.
    pub fn with_bus_capacity(mut self, capacity: usize) -> Self {
        self.cfg.bus_capacity = capacity;
        self
    }

    /// Sets the hook executed before every (re)start.
    pub fn with_pre_action(mut self, pre_action: impl PreAction) -> Self {
        self.pre_action = Box::new(pre_action);
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events through dedicated workers with
    /// bounded queues while [`Watchdog::run`] is active.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the watchdog. Nothing is spawned until [`Watchdog::run`].
    pub fn build(self) -> Arc<Watchdog> {
        Arc::new(Watchdog::new_internal(
            self.cfg,
            self.provider,
            self.logger,
            self.pre_action,
            self.subscribers,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WatchdogState;
    use crate::instance::InstanceCtx;
    use crate::provider::StaticProvider;

    #[test]
    fn test_builder_applies_settings() {
        let provider: ProviderRef = Arc::new(StaticProvider::new("true", InstanceCtx::default()));
        let wd = WatchdogBuilder::new(provider, Logger::discard("t"))
            .with_restart(RestartPolicy::never())
            .with_grace(Duration::from_millis(250))
            .with_os_signals(false)
            .with_bus_capacity(0)
            .build();

        let cfg = wd.config();
        assert!(!cfg.restart.enabled);
        assert_eq!(cfg.grace, Duration::from_millis(250));
        assert!(!cfg.os_signals);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(wd.state(), WatchdogState::Idle);
        assert_eq!(wd.logger().name(), "t");
    }
}
