mod action;
mod break_event;
mod config;
mod control;
mod engine;
mod event;
mod hotkey;
mod idle;
mod paths;
mod process_monitor;
mod reducer;
mod scheduler;
mod session;
mod state;
mod status;
mod watch;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::event::DaemonEvent;
use crate::paths::AppPaths;
use crate::scheduler::Driver;

/// Break reminder daemon: tracks activity and announces mini and work breaks.
#[derive(Debug, Parser)]
#[command(name = "respite-daemon", version, about)]
struct Cli {
    /// Directory holding config.toml, status.toml and control.toml.
    /// Defaults to the platform's per-user configuration directory.
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Print the effective settings as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RESPITE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // ── App data directory ────────────────────────────────────────────────────
    let paths = AppPaths::resolve(cli.config_dir)?;
    std::fs::create_dir_all(paths.dir()).with_context(|| {
        format!("Failed to create app data directory {}", paths.dir().display())
    })?;

    // ── Configuration ─────────────────────────────────────────────────────────
    let settings = config::load_or_default(&paths.config_file()).unwrap_or_else(|e| {
        warn!(target: "config", "{e:#} (using defaults)");
        config::Settings::default()
    });

    if cli.print_config {
        let mut effective = settings.clone();
        effective.set_configuration(settings.configuration_or_default());
        print!("{}", toml::to_string_pretty(&effective)?);
        return Ok(());
    }

    control::discard_stale(&paths.control_file());
    let shared_watch = Arc::new(RwLock::new(settings.watch.clone()));

    let (event_tx, mut event_rx) = mpsc::channel::<DaemonEvent>(32);

    // ── Background tasks ──────────────────────────────────────────────────────
    tokio::spawn(watch::run(paths.clone(), event_tx.clone()));
    tokio::spawn(process_monitor::run(Arc::clone(&shared_watch), event_tx.clone()));

    let hotkey_handle = hotkey::start(&settings.hotkeys, event_tx.clone());
    let session_handle = session::start(event_tx.clone());

    // Graceful shutdown on Ctrl+C.
    {
        let tx = event_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(DaemonEvent::Shutdown).await;
            }
        });
    }

    // ── Engine ────────────────────────────────────────────────────────────────
    let mut driver = Driver::new(settings, &paths, Box::new(idle::SystemIdle));
    driver.start(Instant::now());

    info!(
        dir = %paths.dir().display(),
        paused = driver.engine().is_paused(),
        "respite-daemon v{} started",
        env!("CARGO_PKG_VERSION")
    );

    // ── Event loop ────────────────────────────────────────────────────────────
    loop {
        tokio::select! {
            now = driver.next_tick() => driver.on_tick(now),
            evt = event_rx.recv() => match evt {
                Some(DaemonEvent::Command(command)) => {
                    driver.handle_command(command, Instant::now());
                }
                Some(DaemonEvent::ConfigReloaded(new_settings)) => {
                    info!(target: "config", "Config reloaded");
                    hotkey_handle.update(&new_settings.hotkeys);
                    *shared_watch.write().await = new_settings.watch.clone();
                    driver.handle_config_reload(new_settings, Instant::now());
                }
                Some(DaemonEvent::ProcessesChanged(running)) => {
                    driver.handle_processes(running, Instant::now());
                }
                Some(DaemonEvent::Shutdown) | None => {
                    info!("Shutting down");
                    break;
                }
            },
        }
    }

    driver.shutdown(Instant::now());
    // Unblocks any notification still waiting on a full channel.
    drop(event_rx);
    hotkey_handle.stop();
    session_handle.stop();
    Ok(())
}
