//! # Example: supervised_sleep
//!
//! Supervises `sleep 1`, letting it be restarted a few times before the
//! provider declines further restarts and the session ends on its own.
//!
//! Shows how to:
//! - Describe the process with a [`StaticProvider`].
//! - Build a [`Watchdog`] with a restart delay and a [`LogWriter`] subscriber.
//! - Follow the session through [`Watchdog::subscribe`].
//! - End supervision by flipping [`StaticProvider::set_restartable`].
//!
//! ## Flow
//! ```text
//! Watchdog::run()
//!     ├─► InstanceStarted (sleep 1)
//!     ├─► InstanceExited ──► RestartScheduled ──► delay ──► InstanceStarted
//!     │        ... after MAX_STARTS starts the provider is made non-restartable
//!     ├─► InstanceExited ──► RestartDeclined
//!     └─► WatchdogStopped
//! ```
//!
//! Ctrl-C at any point forwards SIGINT to `sleep` and stops the session.
//!
//! ## Run
//! ```bash
//! PROCVISOR_LOG=procvisor=debug cargo run --example supervised_sleep
//! ```

use std::{sync::Arc, time::Duration};

use procvisor::{
    EventKind, InstanceCtx, LogWriter, Logger, RestartPolicy, StaticProvider, Subscribe, Watchdog,
};
use tracing_subscriber::EnvFilter;

const MAX_STARTS: u32 = 3;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("PROCVISOR_LOG")
                .unwrap_or_else(|_| EnvFilter::new("procvisor=info")),
        )
        .init();

    let provider = Arc::new(StaticProvider::new(
        "sleep",
        InstanceCtx::default().with_args(["1"]),
    ));
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];

    let wd = Watchdog::builder(provider.clone(), Logger::inherit("sleep"))
        .with_restart(RestartPolicy::after(Duration::from_millis(500)))
        .with_grace(Duration::from_secs(2))
        .with_subscribers(subs)
        .build();

    let mut events = wd.subscribe();
    let observer = tokio::spawn(async move {
        let mut starts = 0;
        while let Ok(ev) = events.recv().await {
            match ev.kind {
                EventKind::InstanceStarted => {
                    starts += 1;
                    println!("[demo] start #{starts}: pid={:?}", ev.pid);
                    if starts == MAX_STARTS {
                        provider.set_restartable(false);
                    }
                }
                EventKind::WatchdogStopped => break,
                _ => {}
            }
        }
        starts
    });

    wd.run().await?;
    let starts = observer.await?;
    println!("[demo] session over after {starts} start(s)");
    Ok(())
}
