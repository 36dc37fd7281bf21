//! procvisor: supervise one process described by a TOML file.
//!
//! Usage:
//!   procvisor --config <file> [--restart-delay-ms <MS>] [--grace-ms <MS>] [--no-restart] [--trace-events]
//!
//! The supervisor runs until it receives SIGINT or SIGTERM, which it forwards
//! to the instance before exiting. The config file is re-read before every
//! restart, so `[restart] enabled = false` stops supervision after the next
//! exit without touching the supervisor.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use procvisor::{ConfigProvider, LogWriter, Logger, RestartPolicy, Subscribe, Watchdog};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PROCVISOR_LOG";
const DEFAULT_FILTER: &str = "procvisor=info";

/// Command line arguments
struct Args {
    /// Path to the instance config file
    config: PathBuf,
    /// Pause between an exit and the next start
    restart_delay_ms: u64,
    /// Time a stopping instance gets before SIGKILL
    grace_ms: u64,
    /// Never restart, whatever the config file says
    no_restart: bool,
    /// Log every lifecycle event
    trace_events: bool,
}

impl Args {
    fn parse() -> Result<Self, String> {
        let mut args = std::env::args().skip(1);
        let mut config = None;
        let mut restart_delay_ms = 5_000u64;
        let mut grace_ms = 30_000u64;
        let mut no_restart = false;
        let mut trace_events = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--restart-delay-ms" => {
                    let val = args.next().ok_or("--restart-delay-ms needs a value")?;
                    restart_delay_ms = val.parse().map_err(|_| "Invalid restart-delay-ms value")?;
                }
                "--grace-ms" => {
                    let val = args.next().ok_or("--grace-ms needs a value")?;
                    grace_ms = val.parse().map_err(|_| "Invalid grace-ms value")?;
                }
                "--no-restart" => {
                    no_restart = true;
                }
                "--trace-events" => {
                    trace_events = true;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                _ => {
                    return Err(format!("Unknown argument: {arg}"));
                }
            }
        }

        let config = config.ok_or("--config is required")?;

        Ok(Self {
            config,
            restart_delay_ms,
            grace_ms,
            no_restart,
            trace_events,
        })
    }

    fn restart(&self) -> RestartPolicy {
        if self.no_restart {
            RestartPolicy::never()
        } else {
            RestartPolicy::after(Duration::from_millis(self.restart_delay_ms))
        }
    }
}

fn print_help() {
    println!(
        r#"procvisor - single-instance process watchdog

USAGE:
    procvisor [OPTIONS] --config <FILE>

OPTIONS:
    -c, --config <FILE>          Instance config file (TOML, required)
        --restart-delay-ms <MS>  Pause before restarting a crashed instance (default: 5000)
        --grace-ms <MS>          Time a stopping instance gets before SIGKILL (default: 30000)
        --no-restart             Stop supervising after the first exit
        --trace-events           Log every lifecycle event
    -h, --help                   Print this help message

ENVIRONMENT:
    PROCVISOR_LOG                Log filter (default: procvisor=info)

CONFIG FILE:
    [instance]
    executable = "./server"        # relative paths resolve against the config file,
                                   # bare names against PATH
    app_path = "app.js"            # optional first argument
    work_dir = "data"              # optional, created before every start
    args = ["--port", "8080"]
    inherit_env = true
    env = {{ MODE = "production" }}

    [restart]
    enabled = true                 # re-read after every exit

    [log]
    file = "logs/server.log"       # or: discard = true (default: inherit)
"#
    );
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = match Args::parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Use --help for usage information");
            std::process::exit(2);
        }
    };
    init_logging();

    let provider = Arc::new(ConfigProvider::new(&args.config));
    let file = provider
        .load()
        .with_context(|| format!("invalid config {}", args.config.display()))?;
    tracing::info!(
        config = %args.config.display(),
        executable = %file.instance.executable.display(),
        "starting procvisor"
    );

    let hook = {
        let provider = Arc::clone(&provider);
        move || provider.prepare()
    };
    let mut subs: Vec<Arc<dyn Subscribe>> = Vec::new();
    if args.trace_events {
        subs.push(Arc::new(LogWriter::new()));
    }

    let wd = Watchdog::builder(provider, Logger::inherit("procvisor"))
        .with_restart(args.restart())
        .with_grace(Duration::from_millis(args.grace_ms))
        .with_pre_action(hook)
        .with_subscribers(subs)
        .build();

    wd.run().await.context("supervision failed")?;
    Ok(())
}
