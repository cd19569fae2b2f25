use std::sync::Arc;
use sysinfo::{ProcessesToUpdate, System};
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::config::WatchConfig;
use crate::event::DaemonEvent;

/// Returns the entries of `watched` that appear in `running`, compared
/// case-insensitively. Keeps the spelling and order of `watched` and drops
/// duplicates.
pub fn running_watched<'a, I>(watched: &[String], running: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let running: Vec<String> = running.into_iter().map(str::to_lowercase).collect();
    let mut found: Vec<String> = Vec::new();
    for name in watched {
        let target = name.to_lowercase();
        if running.contains(&target) && !found.iter().any(|f| f.to_lowercase() == target) {
            found.push(name.clone());
        }
    }
    found
}

/// Polls the OS process list and emits [`DaemonEvent::ProcessesChanged`]
/// whenever the set of running watched processes changes.
///
/// The watch list and poll interval are re-read on every poll, so config
/// reloads take effect without restarting the task.
pub async fn run(watch: Arc<RwLock<WatchConfig>>, tx: mpsc::Sender<DaemonEvent>) {
    let mut sys = System::new();
    let mut last: Vec<String> = Vec::new();
    let mut period = poll_period(&*watch.read().await);
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        // Dead processes must be dropped, otherwise an exited watched process
        // keeps its inhibitor for the rest of the run.
        sys.refresh_processes(ProcessesToUpdate::All, true);

        let config = watch.read().await;
        let found = running_watched(
            &config.processes,
            sys.processes()
                .values()
                .filter_map(|p| p.name().to_str()),
        );
        let wanted_period = poll_period(&config);

        // Release the read lock before any awaits below.
        drop(config);

        if wanted_period != period {
            period = wanted_period;
            ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        if found != last {
            tracing::info!(target: "monitor", "Watched processes running: {found:?}");
            last = found.clone();
            if tx.send(DaemonEvent::ProcessesChanged(found)).await.is_err() {
                break;
            }
        }
    }
}

fn poll_period(config: &WatchConfig) -> Duration {
    Duration::from_secs(config.poll_interval_secs.max(1))
}
