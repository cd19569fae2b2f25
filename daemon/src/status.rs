use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::break_event::BreakEvent;
use crate::state::{EngineState, Status, Timings};

/// Minimum spacing between two status-file writes caused by plain updates.
pub const STATUS_THROTTLE: Duration = Duration::from_millis(250);

/// Read-only copy of the externally visible part of the engine state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: Status,
    pub timings: Timings,
    pub last_idle_seconds: f64,
    pub last_updated_seconds: f64,
    pub paused: bool,
}

impl Snapshot {
    pub fn of(state: &EngineState) -> Self {
        Self {
            state: state.status,
            timings: state.timings,
            last_idle_seconds: state.last_idle_seconds,
            last_updated_seconds: state.last_updated_seconds,
            paused: state.is_paused(),
        }
    }
}

/// Runtime status written by the daemon to `status.toml`.
/// The GUI reads this file (read-only) to render timers and break overlays.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DaemonStatus {
    /// Daemon binary version (set from Cargo.toml at compile time).
    pub version: String,
    /// RFC 3339 time of the last write.
    pub written_at: String,
    /// Name of the most recent transition event, e.g. `work-break-start`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_event: Option<String>,
    /// Watched processes currently running.
    #[serde(default)]
    pub processes: Vec<String>,
    /// Active inhibitors, in sorted order.
    #[serde(default)]
    pub inhibitors: Vec<String>,
    /// False while the OS idle time cannot be read. Idle then counts as zero,
    /// so breaks do not end on their own and have to be skipped.
    #[serde(default = "available")]
    pub idle_available: bool,
    pub snapshot: Snapshot,
}

fn available() -> bool {
    true
}

impl DaemonStatus {
    /// Constructs the initial status on daemon startup.
    pub fn new(state: &EngineState) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            written_at: chrono::Local::now().to_rfc3339(),
            last_event: None,
            processes: state.processes.clone(),
            inhibitors: state.inhibitors.iter().cloned().collect(),
            idle_available: true,
            snapshot: Snapshot::of(state),
        }
    }
}

/// Serializes `status` to TOML and writes it to `path`.
/// Creates the parent directory if it does not exist.
/// Logs errors rather than panicking; a status write failure should
/// never crash the daemon.
pub fn write_status(path: &Path, status: &DaemonStatus) {
    match toml::to_string_pretty(status) {
        Ok(content) => {
            if let Err(e) = crate::paths::write_atomic(path, &content) {
                tracing::error!(target: "status", "Failed to write status file: {e:#}");
            }
        }
        Err(e) => tracing::error!(target: "status", "Failed to serialize status: {e}"),
    }
}

/// Keeps `status.toml` in sync with the engine.
///
/// Transition events (break start/end, pause/resume) are written immediately;
/// plain updates at most once per [`STATUS_THROTTLE`].
pub struct StatusWriter {
    path: PathBuf,
    status: DaemonStatus,
    last_write: Option<Instant>,
}

impl StatusWriter {
    pub fn new(path: PathBuf, state: &EngineState) -> Self {
        Self {
            path,
            status: DaemonStatus::new(state),
            last_write: None,
        }
    }

    pub fn status(&self) -> &DaemonStatus {
        &self.status
    }

    /// Returns whether the flag changed.
    pub fn set_idle_available(&mut self, available: bool) -> bool {
        let changed = self.status.idle_available != available;
        self.status.idle_available = available;
        changed
    }

    /// Records the outcome of one dispatch. Returns whether the file was written.
    pub fn record(&mut self, events: &[BreakEvent], state: &EngineState, now: Instant) -> bool {
        if let Some(last) = events.iter().rev().find(|e| e.is_transition()) {
            self.status.last_event = Some(last.name().to_string());
        }
        self.status.snapshot = Snapshot::of(state);
        self.status.processes = state.processes.clone();
        self.status.inhibitors = state.inhibitors.iter().cloned().collect();

        let urgent = events.iter().any(BreakEvent::is_transition);
        let due = self
            .last_write
            .map_or(true, |last| now.saturating_duration_since(last) >= STATUS_THROTTLE);
        if urgent || due {
            self.flush(now);
            true
        } else {
            false
        }
    }

    /// Writes the current status unconditionally.
    pub fn flush(&mut self, now: Instant) {
        self.status.written_at = chrono::Local::now().to_rfc3339();
        write_status(&self.path, &self.status);
        self.last_write = Some(now);
    }
}
