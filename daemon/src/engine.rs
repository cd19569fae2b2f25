//! Explicit owner of the engine state.
//!
//! The [`Engine`] is the single writer: every change goes through
//! [`Engine::dispatch`], which runs the reducer, derives events and fans them
//! out to subscribed listeners in subscription order. There is no global
//! instance; the scheduler owns the engine and passes it around by reference.

use tracing::debug;

use crate::action::Action;
use crate::break_event::{derive_events, BreakEvent};
use crate::config::{merge_config, ConfigError, ConfigPatch, Configuration};
use crate::reducer::{reduce, Reduction};
use crate::state::{EngineState, Status};
use crate::status::Snapshot;

pub type Listener = Box<dyn FnMut(&BreakEvent, &Snapshot) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// What a dispatch did. All flags are false when the action was a no-op.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatch {
    pub changed: bool,
    /// Events published to listeners, in order.
    pub events: Vec<BreakEvent>,
    pub snapshot_changed: bool,
    pub pause_changed: bool,
    pub config_changed: bool,
    pub tick_interval_changed: bool,
    pub processes_changed: bool,
}

impl Dispatch {
    /// Folds a later dispatch into this one.
    pub fn merge(mut self, later: Dispatch) -> Dispatch {
        self.changed |= later.changed;
        self.events.extend(later.events);
        self.snapshot_changed |= later.snapshot_changed;
        self.pause_changed |= later.pause_changed;
        self.config_changed |= later.config_changed;
        self.tick_interval_changed |= later.tick_interval_changed;
        self.processes_changed |= later.processes_changed;
        self
    }
}

pub struct Engine {
    state: EngineState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Engine {
    pub fn new(config: Configuration) -> Self {
        Self {
            state: EngineState::new(config),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::of(&self.state)
    }

    pub fn config(&self) -> Configuration {
        self.state.config
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Registers `listener` and immediately sends it a `StatusUpdate` with the
    /// current snapshot.
    pub fn subscribe<F>(&mut self, mut listener: F) -> SubscriptionId
    where
        F: FnMut(&BreakEvent, &Snapshot) + Send + 'static,
    {
        listener(&BreakEvent::StatusUpdate, &self.snapshot());
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    pub fn dispatch(&mut self, action: Action) -> Dispatch {
        let next = match reduce(&self.state, &action) {
            Reduction::Unchanged => return Dispatch::default(),
            Reduction::Changed(next) => next,
        };
        let prev = std::mem::replace(&mut self.state, next);
        let derived = derive_events(&prev, &self.state, &action);

        debug!(
            target: "engine",
            action = action.name(),
            status = ?self.state.status,
            events = ?derived.events.iter().map(BreakEvent::name).collect::<Vec<_>>(),
            "dispatched"
        );

        let snapshot = self.snapshot();
        for event in &derived.events {
            for (_, listener) in self.listeners.iter_mut() {
                listener(event, &snapshot);
            }
        }

        Dispatch {
            changed: true,
            snapshot_changed: derived.snapshot_changed,
            pause_changed: prev.is_paused() != self.state.is_paused(),
            config_changed: prev.config != self.state.config,
            tick_interval_changed: prev.config.tick_interval_ms != self.state.config.tick_interval_ms,
            processes_changed: prev.processes != self.state.processes,
            events: derived.events,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn tick(&mut self, idle_seconds: f64, dt_seconds: f64) -> Dispatch {
        self.dispatch(Action::Tick {
            idle_seconds,
            dt_seconds,
        })
    }

    /// Break commands are ignored while paused.
    fn unless_paused(&mut self, action: Action) -> Dispatch {
        if self.is_paused() {
            debug!(target: "engine", action = action.name(), "ignored while paused");
            return Dispatch::default();
        }
        self.dispatch(action)
    }

    pub fn trigger_work_break(&mut self) -> Dispatch {
        self.unless_paused(Action::StartWorkBreak {
            natural_continuation: false,
        })
    }

    pub fn trigger_mini_break(&mut self) -> Dispatch {
        self.unless_paused(Action::StartMiniBreak)
    }

    pub fn postpone_work_break(&mut self) -> Dispatch {
        self.unless_paused(Action::PostponeWorkBreak)
    }

    pub fn skip_work_break(&mut self) -> Dispatch {
        self.unless_paused(Action::EndWorkBreak)
    }

    pub fn skip_mini_break(&mut self) -> Dispatch {
        self.unless_paused(Action::EndMiniBreak)
    }

    /// Ends whichever break is active. No-op in `normal`.
    pub fn skip_break(&mut self) -> Dispatch {
        match self.state.status {
            Status::InMini => self.skip_mini_break(),
            Status::InWork => self.skip_work_break(),
            Status::Normal => Dispatch::default(),
        }
    }

    pub fn pause(&mut self) -> Dispatch {
        self.dispatch(Action::SetUserPaused(true))
    }

    pub fn resume(&mut self) -> Dispatch {
        self.dispatch(Action::SetUserPaused(false))
    }

    pub fn toggle_pause(&mut self) -> Dispatch {
        let paused = self.state.user_paused;
        self.dispatch(Action::SetUserPaused(!paused))
    }

    /// Clears the user pause and starts over from zero.
    pub fn reset_timings(&mut self) -> Dispatch {
        let resumed = self.resume();
        resumed.merge(self.dispatch(Action::ResetTimings))
    }

    /// Rejects patches whose merged result would not be a valid configuration.
    pub fn set_config(&mut self, patch: ConfigPatch) -> Result<Dispatch, ConfigError> {
        merge_config(&self.state.config, Some(&patch)).validate()?;
        Ok(self.dispatch(Action::SetConfig(patch)))
    }

    pub fn reset_config(&mut self) -> Dispatch {
        self.dispatch(Action::ResetConfig)
    }

    pub fn add_inhibitor(&mut self, id: impl Into<String>) -> Dispatch {
        self.dispatch(Action::AddInhibitor(id.into()))
    }

    pub fn remove_inhibitor(&mut self, id: impl Into<String>) -> Dispatch {
        self.dispatch(Action::RemoveInhibitor(id.into()))
    }

    pub fn set_processes(&mut self, processes: Vec<String>) -> Dispatch {
        self.dispatch(Action::SetProcesses(processes))
    }
}
