use notify::{Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use tokio::sync::mpsc;

use crate::config::load_or_default;
use crate::control::take_command;
use crate::event::DaemonEvent;
use crate::paths::AppPaths;

/// Which of the daemon's input files a filesystem event touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Touched {
    Config,
    Control,
}

fn classify(event: &notify::Event, paths: &AppPaths) -> Vec<Touched> {
    let is_write = matches!(
        event.kind,
        notify::EventKind::Create(_) | notify::EventKind::Modify(_)
    );
    if !is_write {
        return Vec::new();
    }
    let config = paths.config_file();
    let control = paths.control_file();
    let mut touched = Vec::new();
    if event.paths.iter().any(|p| p == &config) {
        touched.push(Touched::Config);
    }
    if event.paths.iter().any(|p| p == &control) {
        touched.push(Touched::Control);
    }
    touched
}

/// Watches the app data directory and forwards config reloads and control
/// commands to the event loop.
///
/// The directory is watched rather than the files so that editor-style atomic
/// saves (write-new + rename) and files that do not exist yet are picked up.
pub async fn run(paths: AppPaths, tx: mpsc::Sender<DaemonEvent>) {
    let (watch_tx, mut watch_rx) = mpsc::channel::<notify::Event>(16);

    let mut watcher = match RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                let _ = watch_tx.blocking_send(event);
            }
        },
        NotifyConfig::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            tracing::error!(target: "watch", "Failed to create file watcher: {e}");
            return;
        }
    };

    if let Err(e) = watcher.watch(paths.dir(), RecursiveMode::NonRecursive) {
        tracing::error!(target: "watch", "Failed to watch {}: {e}", paths.dir().display());
        return;
    }

    while let Some(event) = watch_rx.recv().await {
        for touched in classify(&event, &paths) {
            let forwarded = match touched {
                Touched::Config => reload_config(&paths.config_file()),
                Touched::Control => read_control(&paths.control_file()),
            };
            if let Some(evt) = forwarded {
                if tx.send(evt).await.is_err() {
                    return;
                }
            }
        }
    }
}

fn reload_config(path: &Path) -> Option<DaemonEvent> {
    match load_or_default(path) {
        Ok(settings) => Some(DaemonEvent::ConfigReloaded(settings)),
        Err(e) => {
            tracing::warn!(target: "config", "Failed to reload config: {e:#}");
            None
        }
    }
}

fn read_control(path: &Path) -> Option<DaemonEvent> {
    match take_command(path) {
        Ok(command) => command.map(DaemonEvent::Command),
        Err(e) => {
            tracing::warn!(target: "control", "Ignoring control file: {e:#}");
            None
        }
    }
}
