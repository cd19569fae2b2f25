use crate::action::Action;
use crate::state::{BreakType, EngineState};
use crate::status::Snapshot;

/// Discrete notifications published to listeners after each accepted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakEvent {
    MiniBreakStart,
    WorkBreakStart { natural_continuation: bool },
    BreakUpdate { break_type: BreakType },
    BreakEnd { break_type: BreakType },
    /// Generic "something changed" signal; always the last event of a batch.
    StatusUpdate,
    Paused,
    Resumed,
}

impl BreakEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BreakEvent::MiniBreakStart => "mini-break-start",
            BreakEvent::WorkBreakStart { .. } => "work-break-start",
            BreakEvent::BreakUpdate { .. } => "break-update",
            BreakEvent::BreakEnd { .. } => "break-end",
            BreakEvent::StatusUpdate => "status-update",
            BreakEvent::Paused => "paused",
            BreakEvent::Resumed => "resumed",
        }
    }

    /// Everything except the periodic update events.
    pub fn is_transition(&self) -> bool {
        !matches!(self, BreakEvent::BreakUpdate { .. } | BreakEvent::StatusUpdate)
    }
}

/// Result of comparing two consecutive states.
#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    pub events: Vec<BreakEvent>,
    /// Whether the externally observable snapshot differs.
    pub snapshot_changed: bool,
}

/// Derives the events for the transition `prev -> next` caused by `action`.
pub fn derive_events(prev: &EngineState, next: &EngineState, action: &Action) -> Derived {
    let mut events = Vec::new();

    let (prev_paused, next_paused) = (prev.is_paused(), next.is_paused());
    if prev_paused != next_paused {
        events.push(if next_paused {
            BreakEvent::Paused
        } else {
            BreakEvent::Resumed
        });
    }

    let prev_break = prev.status.break_type();
    let next_break = next.status.break_type();

    if prev.status != next.status {
        match next_break {
            Some(BreakType::Mini) => events.push(BreakEvent::MiniBreakStart),
            Some(BreakType::Work) => events.push(BreakEvent::WorkBreakStart {
                natural_continuation: action.is_natural_continuation(),
            }),
            None => {}
        }
        if let Some(ended) = prev_break {
            if next_break != Some(ended) {
                events.push(BreakEvent::BreakEnd { break_type: ended });
            }
        }
    } else if let Some(break_type) = next_break {
        events.push(BreakEvent::BreakUpdate { break_type });
    }

    events.push(BreakEvent::StatusUpdate);

    Derived {
        events,
        snapshot_changed: Snapshot::of(prev) != Snapshot::of(next),
    }
}
