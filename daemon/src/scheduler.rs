//! Drives the engine from real time and routes daemon inputs into it.
//!
//! The [`TickClock`] runs only while the engine is not effectively paused, so
//! no ticks (and no idle sampling) happen during a pause. The [`Driver`] owns
//! the engine and applies the side effects of each dispatch: clock resync,
//! settings persistence and status-file writes.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::time::{interval_at, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::break_event::BreakEvent;
use crate::config::{self, ConfigPatch, Settings};
use crate::control::Command;
use crate::engine::{Dispatch, Engine, SubscriptionId};
use crate::idle::{IdleSampler, IdleSource};
use crate::paths::AppPaths;
use crate::status::{Snapshot, StatusWriter};

/// Inhibitor ids owned by the process monitor start with this prefix.
pub const PROCESS_INHIBITOR_PREFIX: &str = "process:";

pub fn process_inhibitor(name: &str) -> String {
    format!("{PROCESS_INHIBITOR_PREFIX}{name}")
}

/// A tick delta longer than this many tick intervals is a suspend gap.
pub const SUSPEND_GAP_TICKS: f64 = 10.0;

/// Lower bound for the suspend-gap threshold, in seconds.
pub const SUSPEND_GAP_MIN_SECONDS: f64 = 60.0;

/// Deltas above this are time the machine spent asleep (or the loop spent
/// stalled), not time the user spent working.
pub fn suspend_gap_threshold(tick_interval_ms: u64) -> f64 {
    (tick_interval_ms as f64 / 1000.0 * SUSPEND_GAP_TICKS).max(SUSPEND_GAP_MIN_SECONDS)
}

// ── Tick clock ────────────────────────────────────────────────────────────────

/// Periodic tick source with a remembered last-tick time.
#[derive(Debug, Default)]
pub struct TickClock {
    interval: Option<Interval>,
    last_tick: Option<Instant>,
}

impl TickClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)creates the timer with `period`. The first tick fires one period
    /// from now and elapsed time is measured from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn restart(&mut self, period: Duration) {
        let start = tokio::time::Instant::now();
        let mut ticker = interval_at(start + period, period);
        // A stalled loop must not be followed by a burst of catch-up ticks.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(ticker);
        self.last_tick = Some(start.into_std());
    }

    pub fn stop(&mut self) {
        self.interval = None;
        self.last_tick = None;
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Waits for the next tick. Never completes while stopped.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// Seconds since the previous call (or since `restart`), never negative.
    /// Returns 0 while stopped.
    pub fn delta_since_last(&mut self, now: Instant) -> f64 {
        let Some(last) = self.last_tick else {
            return 0.0;
        };
        if now < last {
            return 0.0;
        }
        self.last_tick = Some(now);
        now.duration_since(last).as_secs_f64()
    }
}

// ── Driver ────────────────────────────────────────────────────────────────────

fn log_transition(event: &BreakEvent, snapshot: &Snapshot) {
    if event.is_transition() {
        info!(
            target: "breaks",
            event = event.name(),
            mini_elapsed = snapshot.timings.mini_elapsed,
            work_elapsed = snapshot.timings.work_elapsed,
            "{}",
            event.name()
        );
    }
}

pub struct Driver {
    engine: Engine,
    log_subscription: SubscriptionId,
    clock: TickClock,
    idle: IdleSampler,
    settings: Settings,
    settings_path: PathBuf,
    status: StatusWriter,
}

impl Driver {
    pub fn new(settings: Settings, paths: &AppPaths, idle: Box<dyn IdleSource + Send>) -> Self {
        let mut engine = Engine::new(settings.configuration_or_default());
        let log_subscription = engine.subscribe(log_transition);
        let status = StatusWriter::new(paths.status_file(), engine.state());
        Self {
            engine,
            log_subscription,
            clock: TickClock::new(),
            idle: IdleSampler::new(idle),
            settings,
            settings_path: paths.config_file(),
            status,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Starts the clock and writes the initial status file.
    pub fn start(&mut self, now: Instant) {
        self.sync_clock();
        self.status.flush(now);
    }

    /// Writes the final status file and detaches the transition logger.
    pub fn shutdown(&mut self, now: Instant) {
        self.clock.stop();
        self.status.flush(now);
        if !self.engine.unsubscribe(self.log_subscription) {
            debug!(target: "driver", "Transition logger was already detached");
        }
        info!(
            target: "driver",
            last_event = self.status.status().last_event.as_deref().unwrap_or("none"),
            "Engine stopped"
        );
    }

    /// Waits for the next clock tick and returns the time it was observed.
    pub async fn next_tick(&mut self) -> Instant {
        self.clock.tick().await;
        Instant::now()
    }

    pub fn on_tick(&mut self, now: Instant) {
        let mut dt = self.clock.delta_since_last(now);
        if dt > suspend_gap_threshold(self.engine.config().tick_interval_ms) {
            info!(target: "driver", gap_seconds = dt, "Skipping suspend gap");
            dt = 0.0;
        }
        let idle = self.idle.sample();
        let idle_flipped = self.status.set_idle_available(!self.idle.is_failing());
        let report = self.engine.tick(idle, dt);
        self.settle(report, now, true);
        if idle_flipped {
            self.status.flush(now);
        }
    }

    pub fn handle_command(&mut self, command: Command, now: Instant) {
        debug!(target: "driver", command = command.name(), "Handling command");
        let report = match command {
            Command::TriggerWorkBreak => self.engine.trigger_work_break(),
            Command::TriggerMiniBreak => self.engine.trigger_mini_break(),
            Command::PostponeWorkBreak => self.engine.postpone_work_break(),
            Command::SkipWorkBreak => self.engine.skip_work_break(),
            Command::SkipMiniBreak => self.engine.skip_mini_break(),
            Command::SkipBreak => self.engine.skip_break(),
            Command::Pause => self.engine.pause(),
            Command::Resume => self.engine.resume(),
            Command::TogglePause => self.engine.toggle_pause(),
            Command::ResetTimings => {
                let report = self.engine.reset_timings();
                // Elapsed time counts from the reset, not from the last tick.
                self.sync_clock();
                report
            }
            Command::ResetConfig => {
                let report = self.engine.reset_config();
                self.sync_clock();
                report
            }
            Command::SetConfig(patch) => match self.engine.set_config(patch) {
                Ok(report) => report,
                Err(e) => {
                    warn!(target: "config", "Rejected configuration change: {e}");
                    return;
                }
            },
            Command::AddInhibitor(id) => self.engine.add_inhibitor(id),
            Command::RemoveInhibitor(id) => self.engine.remove_inhibitor(id),
            Command::Unknown(name) => {
                warn!(target: "control", "Ignoring unknown command {name:?}");
                return;
            }
        };
        self.settle(report, now, true);
    }

    /// Applies a re-read `config.toml`.
    ///
    /// Break timings are only pushed into the engine when they differ from the
    /// current ones, so the daemon's own writes do not reset any timers.
    pub fn handle_config_reload(&mut self, settings: Settings, now: Instant) {
        let config = match settings.configuration() {
            Ok(config) => config,
            Err(e) => {
                warn!(target: "config", "Ignoring reloaded break configuration: {e}");
                self.settings.watch = settings.watch;
                self.settings.hotkeys = settings.hotkeys;
                return;
            }
        };
        self.settings = settings;
        if config == self.engine.config() {
            return;
        }
        info!(target: "config", "Break configuration changed on disk");
        match self.engine.set_config(ConfigPatch::from(config)) {
            Ok(report) => self.settle(report, now, false),
            Err(e) => warn!(target: "config", "Rejected configuration change: {e}"),
        }
    }

    /// Records the running watched processes and keeps one
    /// `process:<name>` inhibitor per running process.
    pub fn handle_processes(&mut self, running: Vec<String>, now: Instant) {
        let wanted: BTreeSet<String> = running.iter().map(|n| process_inhibitor(n)).collect();
        let stale: Vec<String> = self
            .engine
            .state()
            .inhibitors
            .iter()
            .filter(|id| id.starts_with(PROCESS_INHIBITOR_PREFIX) && !wanted.contains(*id))
            .cloned()
            .collect();

        let mut report = self.engine.set_processes(running);
        for id in stale {
            report = report.merge(self.engine.remove_inhibitor(id));
        }
        for id in wanted {
            report = report.merge(self.engine.add_inhibitor(id));
        }
        self.settle(report, now, false);
    }

    fn settle(&mut self, report: Dispatch, now: Instant, persist: bool) {
        if !report.changed {
            return;
        }
        if report.config_changed && persist {
            self.persist_settings();
        }
        if report.pause_changed || report.config_changed || report.tick_interval_changed {
            self.sync_clock();
        }
        self.status.record(&report.events, self.engine.state(), now);
    }

    fn persist_settings(&mut self) {
        self.settings.set_configuration(self.engine.config());
        if let Err(e) = config::save(&self.settings_path, &self.settings) {
            error!(target: "config", "Failed to save settings: {e:#}");
        }
    }

    /// Stops the clock while paused, (re)starts it otherwise.
    fn sync_clock(&mut self) {
        if self.engine.is_paused() {
            if self.clock.is_running() {
                debug!(target: "driver", "Clock stopped");
            }
            self.clock.stop();
        } else {
            let period = Duration::from_millis(self.engine.config().tick_interval_ms);
            debug!(target: "driver", ?period, "Clock started");
            self.clock.restart(period);
        }
    }
}
