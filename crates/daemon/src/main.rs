// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runwell Daemon (rwd)
//!
//! Background process that pulls CI jobs and runs them to completion,
//! resuming any job a previous process left unfinished.

use rw_adapters::ExecutorRegistry;
use rw_daemon::{run_jobs, startup, Config, LifecycleError};
use rw_engine::interrupt_channel;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("rwd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("rwd {}", env!("CARGO_PKG_VERSION"));
                println!("Runwell Daemon - runs CI jobs and resumes them after a restart");
                println!();
                println!("USAGE:");
                println!("    rwd");
                println!();
                println!("State lives under $RW_STATE_DIR (default ~/.local/state/rw).");
                println!("Tuning is read from RW_* environment variables.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: rwd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    let _log_guard = setup_logging(&config)?;

    info!(state_dir = %config.state_dir.display(), "Starting daemon");

    // Backends plug in through the library; the bare binary registers none
    let registry = ExecutorRegistry::new();
    let daemon = match startup(&config, registry) {
        Ok(daemon) => daemon,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            eprintln!("rwd is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            error!("Failed to start daemon: {}", e);
            eprintln!("rwd: failed to start: {e}");
            return Err(e.into());
        }
    };

    let (interrupt_handle, mut interrupt) = interrupt_channel();
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
        let _ = shutdown_tx.send(true);
        interrupt_handle.trigger();
    });

    info!("Daemon ready");
    run_jobs(&daemon.runner, &mut interrupt, &mut shutdown_rx).await;

    daemon.shutdown();
    Ok(())
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
