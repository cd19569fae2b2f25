use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_MINI_INTERVAL_SECS: f64 = 4.0 * 60.0;
pub const DEFAULT_MINI_DURATION_SECS: f64 = 13.0;
pub const DEFAULT_WORK_INTERVAL_SECS: f64 = 50.0 * 60.0;
pub const DEFAULT_WORK_DURATION_SECS: f64 = 8.0 * 60.0;
pub const DEFAULT_WORK_POSTPONE_SECS: f64 = 10.0 * 60.0;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 500;
/// Idle time after which the user is considered to have taken the mini break on their own.
pub const DEFAULT_NATURAL_BREAK_WINDOW_SECS: f64 = 30.0;
pub const DEFAULT_WATCHED_PROCESSES: &[&str] = &["zoom.us"];
pub const DEFAULT_PROCESS_POLL_SECS: u64 = 2;

/// Interval/duration pair shared by both break kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakConfig {
    /// Seconds of work between two breaks.
    pub interval_seconds: f64,
    /// Seconds the break lasts.
    pub duration_seconds: f64,
}

/// Work breaks can additionally be postponed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkBreakConfig {
    pub interval_seconds: f64,
    pub duration_seconds: f64,
    /// How far a postponed work break is pushed back.
    pub postpone_seconds: f64,
}

/// Complete, validated break timing configuration.
///
/// Replaced wholesale on every change; the engine never patches it in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub mini: BreakConfig,
    pub work: WorkBreakConfig,
    /// Cadence of the scheduler's tick timer.
    pub tick_interval_ms: u64,
    pub natural_break_continuation_window_seconds: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            mini: BreakConfig {
                interval_seconds: DEFAULT_MINI_INTERVAL_SECS,
                duration_seconds: DEFAULT_MINI_DURATION_SECS,
            },
            work: WorkBreakConfig {
                interval_seconds: DEFAULT_WORK_INTERVAL_SECS,
                duration_seconds: DEFAULT_WORK_DURATION_SECS,
                postpone_seconds: DEFAULT_WORK_POSTPONE_SECS,
            },
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            natural_break_continuation_window_seconds: DEFAULT_NATURAL_BREAK_WINDOW_SECS,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
}

impl Configuration {
    /// Checks the positivity constraints. The reducer assumes every
    /// configuration it sees has passed this check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("mini.interval_seconds", self.mini.interval_seconds)?;
        positive("mini.duration_seconds", self.mini.duration_seconds)?;
        positive("work.interval_seconds", self.work.interval_seconds)?;
        positive("work.duration_seconds", self.work.duration_seconds)?;
        positive("work.postpone_seconds", self.work.postpone_seconds)?;
        positive("tick_interval_ms", self.tick_interval_ms as f64)?;
        let window = self.natural_break_continuation_window_seconds;
        if !(window >= 0.0) {
            return Err(ConfigError::Negative {
                field: "natural_break_continuation_window_seconds",
                value: window,
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    // Written so that NaN is rejected too.
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

// ── Partial configuration ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkBreakPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postpone_seconds: Option<f64>,
}

/// A configuration where every leaf is optional. Used for persisted files
/// (which may be incomplete) and for `set-config` requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub natural_break_continuation_window_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mini: Option<BreakPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work: Option<WorkBreakPatch>,
}

impl From<Configuration> for ConfigPatch {
    fn from(config: Configuration) -> Self {
        Self {
            tick_interval_ms: Some(config.tick_interval_ms),
            natural_break_continuation_window_seconds: Some(
                config.natural_break_continuation_window_seconds,
            ),
            mini: Some(BreakPatch {
                interval_seconds: Some(config.mini.interval_seconds),
                duration_seconds: Some(config.mini.duration_seconds),
            }),
            work: Some(WorkBreakPatch {
                interval_seconds: Some(config.work.interval_seconds),
                duration_seconds: Some(config.work.duration_seconds),
                postpone_seconds: Some(config.work.postpone_seconds),
            }),
        }
    }
}

/// Overlays `patch` onto `base` leaf by leaf. Nested `mini`/`work` sections
/// are merged field-by-field. No validation happens here.
pub fn merge_config(base: &Configuration, patch: Option<&ConfigPatch>) -> Configuration {
    let Some(patch) = patch else {
        return *base;
    };
    let mini = patch.mini.clone().unwrap_or_default();
    let work = patch.work.clone().unwrap_or_default();
    Configuration {
        mini: BreakConfig {
            interval_seconds: mini.interval_seconds.unwrap_or(base.mini.interval_seconds),
            duration_seconds: mini.duration_seconds.unwrap_or(base.mini.duration_seconds),
        },
        work: WorkBreakConfig {
            interval_seconds: work.interval_seconds.unwrap_or(base.work.interval_seconds),
            duration_seconds: work.duration_seconds.unwrap_or(base.work.duration_seconds),
            postpone_seconds: work.postpone_seconds.unwrap_or(base.work.postpone_seconds),
        },
        tick_interval_ms: patch.tick_interval_ms.unwrap_or(base.tick_interval_ms),
        natural_break_continuation_window_seconds: patch
            .natural_break_continuation_window_seconds
            .unwrap_or(base.natural_break_continuation_window_seconds),
    }
}

// ── Settings file ─────────────────────────────────────────────────────────────

/// Root of `config.toml`. Written by the GUI and by the daemon itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Break timings as stored on disk; may be partial or invalid.
    #[serde(default)]
    pub breaks: ConfigPatch,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub hotkeys: HotkeyConfig,
}

/// Processes whose presence suspends break timing (e.g. video calls).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Process names matched case-insensitively against the OS process list.
    #[serde(default = "default_watched_processes")]
    pub processes: Vec<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            processes: default_watched_processes(),
            poll_interval_secs: DEFAULT_PROCESS_POLL_SECS,
        }
    }
}

/// Optional global hotkeys. Key names follow [`crate::hotkey::parse_vk`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotkeyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_toggle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postpone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_work: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_mini: Option<String>,
}

impl Settings {
    /// Resolves the stored break timings against the defaults.
    ///
    /// A stored configuration that fails validation is discarded as a whole
    /// and the defaults are used instead.
    pub fn configuration(&self) -> Result<Configuration, ConfigError> {
        let merged = merge_config(&Configuration::default(), Some(&self.breaks));
        merged.validate()?;
        Ok(merged)
    }

    /// Like [`Settings::configuration`], but falls back to the defaults and logs.
    pub fn configuration_or_default(&self) -> Configuration {
        self.configuration().unwrap_or_else(|e| {
            tracing::warn!(target: "config", "Invalid break configuration ({e}); using defaults");
            Configuration::default()
        })
    }

    /// Replaces the stored break timings with a complete configuration.
    pub fn set_configuration(&mut self, config: Configuration) {
        self.breaks = ConfigPatch::from(config);
    }
}

/// Loads the settings file at `path`, returning `Settings::default()` if the file does not exist.
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_or_default(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Serializes `settings` to TOML and atomically replaces `path`, creating the parent directory.
pub fn save(path: &Path, settings: &Settings) -> Result<()> {
    let content = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
    crate::paths::write_atomic(path, &content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))
}

fn default_watched_processes() -> Vec<String> {
    DEFAULT_WATCHED_PROCESSES.iter().map(|s| s.to_string()).collect()
}

fn default_poll_interval() -> u64 {
    DEFAULT_PROCESS_POLL_SECS
}
