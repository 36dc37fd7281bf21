//! # Current-instance slot.
//!
//! The only state shared between the monitoring loop and external callers.
//! Every read and write happens under one mutex, so a caller either sees the
//! previous instance, no instance, or the new one; never a half-installed one.
//!
//! ```text
//! monitoring loop:  install(new) ─── ... ─── wait() returns ─── clear()
//! external caller:           with_current(|i| i.send_signal(sig))
//! ```
//!
//! The slot is cleared as soon as an exit is observed, so during a restart
//! delay operations report "no current instance" instead of reaching a
//! process that is gone or one that does not exist yet.

use parking_lot::Mutex;

use crate::instance::{Instance, InstanceRef};

pub(crate) struct InstanceSlot {
    current: Mutex<Option<InstanceRef>>,
}

impl InstanceSlot {
    pub(crate) fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    /// Makes `instance` current, dropping the slot's handle to the previous one.
    pub(crate) fn install(&self, instance: InstanceRef) {
        *self.current.lock() = Some(instance);
    }

    /// Removes the current instance.
    pub(crate) fn clear(&self) {
        self.current.lock().take();
    }

    /// Runs `f` on the current instance while holding the slot lock.
    ///
    /// `f` must not block; signal delivery and liveness checks are fine.
    pub(crate) fn with_current<R>(&self, f: impl FnOnce(&Instance) -> R) -> Option<R> {
        let guard = self.current.lock();
        guard.as_deref().map(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::InstanceCtx;
    use crate::logger::Logger;
    use std::sync::Arc;

    fn instance() -> InstanceRef {
        Arc::new(Instance::new(
            "sleep",
            InstanceCtx::default(),
            Vec::new(),
            Logger::discard("t"),
        ))
    }

    #[test]
    fn test_install_replaces_and_clear_empties() {
        let slot = InstanceSlot::new();
        assert!(slot.with_current(|_| ()).is_none());

        let first = instance();
        slot.install(Arc::clone(&first));
        assert_eq!(slot.with_current(|i| std::ptr::eq(i, &*first)), Some(true));

        let second = instance();
        slot.install(Arc::clone(&second));
        assert_eq!(slot.with_current(|i| std::ptr::eq(i, &*second)), Some(true));
        assert_eq!(Arc::strong_count(&first), 1);

        slot.clear();
        assert!(slot.with_current(|_| ()).is_none());
        assert_eq!(Arc::strong_count(&second), 1);
    }

    #[test]
    fn test_with_current_sees_unspawned_instance_as_not_running() {
        let slot = InstanceSlot::new();
        slot.install(instance());
        let res = slot.with_current(|i| i.send_signal(nix::sys::signal::Signal::SIGTERM));
        assert!(matches!(
            res,
            Some(Err(crate::error::InstanceError::NotRunning))
        ));
    }
}
