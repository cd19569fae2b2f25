use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::Configuration;

/// The engine's single discrete mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Normal,
    InMini,
    InWork,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakType {
    Mini,
    Work,
}

impl Status {
    /// The break this status represents, if any.
    pub fn break_type(self) -> Option<BreakType> {
        match self {
            Status::Normal => None,
            Status::InMini => Some(BreakType::Mini),
            Status::InWork => Some(BreakType::Work),
        }
    }
}

/// Four independent accumulators, each kept within `[0, max]` for its break kind.
///
/// `*_elapsed` counts towards the next break, `*_taking` counts time spent in
/// the current break (or idle time while still in [`Status::Normal`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    pub mini_elapsed: f64,
    pub mini_taking: f64,
    pub work_elapsed: f64,
    pub work_taking: f64,
}

/// Everything the timing engine owns. Only the reducer produces new values.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    pub status: Status,
    pub timings: Timings,
    pub last_idle_seconds: f64,
    /// Sum of all accepted tick deltas since the last reset.
    pub last_updated_seconds: f64,
    pub config: Configuration,
    pub user_paused: bool,
    /// Named reasons that currently suspend timing, e.g. `system:lock` or `process:zoom.us`.
    pub inhibitors: BTreeSet<String>,
    /// Last reported watched processes. Informational only.
    pub processes: Vec<String>,
}

impl EngineState {
    /// Fresh `normal` state with zeroed timings.
    pub fn new(config: Configuration) -> Self {
        Self {
            status: Status::Normal,
            timings: Timings::default(),
            last_idle_seconds: 0.0,
            last_updated_seconds: 0.0,
            config,
            user_paused: false,
            inhibitors: BTreeSet::new(),
            processes: Vec::new(),
        }
    }

    /// User pause or any active inhibitor.
    pub fn is_paused(&self) -> bool {
        self.user_paused || !self.inhibitors.is_empty()
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}
