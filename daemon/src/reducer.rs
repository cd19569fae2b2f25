//! The break-timing state machine.
//!
//! [`reduce`] is pure: it never performs I/O and never mutates its input. It
//! reports [`Reduction::Unchanged`] when an action has no effect so that the
//! caller can skip event derivation and listener fan-out entirely.
//!
//! ```text
//!            miniElapsed >= interval              miniTaking >= duration
//!   Normal ───────────────────────────▶ InMini ────────────────────────▶ Normal
//!     │                                   │
//!     │ workElapsed >= interval           │ workElapsed >= interval
//!     ▼                                   ▼
//!   InWork ◀──────────────────────────────┘
//!     │ workTaking >= duration
//!     ▼
//!   Normal
//! ```

use crate::action::Action;
use crate::config::{merge_config, Configuration};
use crate::state::{EngineState, Status, Timings};

/// While in `normal`, idle time up to `mini.duration_seconds * MINI_ACTIVITY_FACTOR`
/// still counts as being active.
pub const MINI_ACTIVITY_FACTOR: f64 = 0.3;
/// Idle time below this during a mini break means the user went back to work.
pub const MINI_RESUME_IDLE_SECONDS: f64 = 1.0;
/// Minimum idle time for a work-break tick to count towards the break.
pub const WORK_COMPLIANCE_IDLE_SECONDS: f64 = 4.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Reduction {
    /// The action had no effect; the previous state is still current.
    Unchanged,
    Changed(EngineState),
}

#[cfg(test)]
impl Reduction {
    pub fn is_changed(&self) -> bool {
        matches!(self, Reduction::Changed(_))
    }
}

/// Applies `action` to `state`.
pub fn reduce(state: &EngineState, action: &Action) -> Reduction {
    match action {
        Action::Tick {
            idle_seconds,
            dt_seconds,
        } => tick(state, *idle_seconds, *dt_seconds),
        Action::SetConfig(patch) => {
            let config = merge_config(&state.config, Some(patch));
            Reduction::Changed(reset_with_config(state, config))
        }
        Action::ResetConfig => {
            Reduction::Changed(reset_with_config(state, Configuration::default()))
        }
        Action::ResetTimings => Reduction::Changed(EngineState {
            status: Status::Normal,
            timings: Timings::default(),
            last_idle_seconds: 0.0,
            last_updated_seconds: 0.0,
            ..state.clone()
        }),
        Action::StartMiniBreak => changed_with(state, enter_mini_break),
        Action::EndMiniBreak => changed_with(state, leave_mini_break),
        Action::StartWorkBreak {
            natural_continuation,
        } => changed_with(state, |s| enter_work_break(s, *natural_continuation)),
        Action::EndWorkBreak => changed_with(state, leave_work_break),
        Action::PostponeWorkBreak => changed_with(state, postpone_work_break),
        Action::SetUserPaused(value) => {
            if state.user_paused == *value {
                return Reduction::Unchanged;
            }
            Reduction::Changed(EngineState {
                user_paused: *value,
                ..state.clone()
            })
        }
        Action::AddInhibitor(id) => {
            if state.inhibitors.contains(id) {
                return Reduction::Unchanged;
            }
            changed_with(state, |s| {
                s.inhibitors.insert(id.clone());
            })
        }
        Action::RemoveInhibitor(id) => {
            if !state.inhibitors.contains(id) {
                return Reduction::Unchanged;
            }
            changed_with(state, |s| {
                s.inhibitors.remove(id);
            })
        }
        Action::SetProcesses(processes) => {
            if state.processes == *processes {
                return Reduction::Unchanged;
            }
            changed_with(state, |s| s.processes = processes.clone())
        }
    }
}

fn changed_with(state: &EngineState, apply: impl FnOnce(&mut EngineState)) -> Reduction {
    let mut next = state.clone();
    apply(&mut next);
    Reduction::Changed(next)
}

fn clamp_to(value: f64, max: f64) -> f64 {
    value.clamp(0.0, max)
}

/// New configuration with baseline timings. Pause flags, inhibitors and
/// processes survive.
fn reset_with_config(state: &EngineState, config: Configuration) -> EngineState {
    EngineState {
        config,
        user_paused: state.user_paused,
        inhibitors: state.inhibitors.clone(),
        processes: state.processes.clone(),
        ..EngineState::new(config)
    }
}

fn tick(state: &EngineState, idle_seconds: f64, dt_seconds: f64) -> Reduction {
    if state.is_paused() {
        return Reduction::Unchanged;
    }
    let delta = dt_seconds.max(0.0);
    if delta == 0.0 && idle_seconds == state.last_idle_seconds {
        return Reduction::Unchanged;
    }

    let config = state.config;
    let mut next = state.clone();
    next.last_idle_seconds = idle_seconds;
    next.last_updated_seconds += delta;

    match state.status {
        Status::Normal => {
            let t = &mut next.timings;
            if idle_seconds <= config.mini.duration_seconds * MINI_ACTIVITY_FACTOR {
                t.mini_elapsed = clamp_to(t.mini_elapsed + delta, config.mini.interval_seconds);
                t.mini_taking = 0.0;
            } else {
                t.mini_taking = clamp_to(t.mini_taking + delta, config.mini.duration_seconds);
            }
            t.work_elapsed = clamp_to(t.work_elapsed + delta, config.work.interval_seconds);
            t.work_taking = 0.0;

            // The user already stepped away long enough: count it as the mini break.
            let natural_reset = idle_seconds >= config.natural_break_continuation_window_seconds;
            if natural_reset {
                t.mini_elapsed = 0.0;
                t.mini_taking = config.mini.duration_seconds;
            }

            if next.timings.work_elapsed >= config.work.interval_seconds {
                enter_work_break(&mut next, false);
            } else if !natural_reset && next.timings.mini_elapsed >= config.mini.interval_seconds {
                enter_mini_break(&mut next);
            }
        }
        Status::InMini => {
            let t = &mut next.timings;
            t.work_elapsed = clamp_to(t.work_elapsed + delta, config.work.interval_seconds);
            if idle_seconds < MINI_RESUME_IDLE_SECONDS {
                t.mini_taking = 0.0;
            } else {
                t.mini_taking = clamp_to(t.mini_taking + delta, config.mini.duration_seconds);
            }

            if next.timings.work_elapsed >= config.work.interval_seconds {
                enter_work_break(&mut next, false);
            } else if next.timings.mini_taking >= config.mini.duration_seconds {
                leave_mini_break(&mut next);
            }
        }
        Status::InWork => {
            let t = &mut next.timings;
            if idle_seconds >= WORK_COMPLIANCE_IDLE_SECONDS {
                t.work_taking = clamp_to(t.work_taking + delta, config.work.duration_seconds);
            }

            if next.timings.work_taking >= config.work.duration_seconds {
                leave_work_break(&mut next);
            }
        }
    }

    Reduction::Changed(next)
}

fn enter_mini_break(state: &mut EngineState) {
    state.status = Status::InMini;
    state.timings.mini_elapsed = state.config.mini.interval_seconds;
    state.timings.mini_taking = 0.0;
}

fn leave_mini_break(state: &mut EngineState) {
    state.status = Status::Normal;
    state.timings.mini_elapsed = 0.0;
    state.timings.mini_taking = state.config.mini.duration_seconds;
}

fn enter_work_break(state: &mut EngineState, natural_continuation: bool) {
    state.status = Status::InWork;
    let t = &mut state.timings;
    t.work_elapsed = state.config.work.interval_seconds;
    if !natural_continuation {
        t.work_taking = 0.0;
    }
    // Mini breaks are suppressed for the duration of the work break.
    t.mini_elapsed = 0.0;
    t.mini_taking = state.config.mini.duration_seconds;
}

fn leave_work_break(state: &mut EngineState) {
    state.status = Status::Normal;
    state.timings = Timings {
        mini_elapsed: 0.0,
        mini_taking: state.config.mini.duration_seconds,
        work_elapsed: 0.0,
        work_taking: state.config.work.duration_seconds,
    };
}

fn postpone_work_break(state: &mut EngineState) {
    let work = state.config.work;
    state.status = Status::Normal;
    state.timings = Timings {
        mini_elapsed: 0.0,
        mini_taking: 0.0,
        work_elapsed: clamp_to(work.interval_seconds - work.postpone_seconds, work.interval_seconds),
        work_taking: 0.0,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BreakPatch, ConfigPatch};

    /// Applies `action`, keeping the old state when nothing changed.
    fn apply(state: &EngineState, action: Action) -> EngineState {
        match reduce(state, &action) {
            Reduction::Unchanged => state.clone(),
            Reduction::Changed(next) => next,
        }
    }

    fn tick_action(idle_seconds: f64, dt_seconds: f64) -> Action {
        Action::Tick {
            idle_seconds,
            dt_seconds,
        }
    }

    fn ticks(state: &EngineState, n: usize, idle_seconds: f64, dt_seconds: f64) -> EngineState {
        (0..n).fold(state.clone(), |s, _| apply(&s, tick_action(idle_seconds, dt_seconds)))
    }

    fn in_work_state() -> EngineState {
        apply(
            &EngineState::default(),
            Action::StartWorkBreak {
                natural_continuation: false,
            },
        )
    }

    fn assert_within_bounds(s: &EngineState) {
        let c = &s.config;
        let t = &s.timings;
        assert!((0.0..=c.mini.interval_seconds).contains(&t.mini_elapsed), "{t:?}");
        assert!((0.0..=c.mini.duration_seconds).contains(&t.mini_taking), "{t:?}");
        assert!((0.0..=c.work.interval_seconds).contains(&t.work_elapsed), "{t:?}");
        assert!((0.0..=c.work.duration_seconds).contains(&t.work_taking), "{t:?}");
    }

    // ── no-op ticks ───────────────────────────────────────────────────────────

    #[test]
    fn tick_while_user_paused_is_unchanged() {
        let mut s = EngineState::default();
        s.user_paused = true;
        for (idle, dt) in [(0.0, 1.0), (100.0, 0.5), (3.0, -2.0), (0.0, 0.0)] {
            assert_eq!(reduce(&s, &tick_action(idle, dt)), Reduction::Unchanged);
        }
    }

    #[test]
    fn tick_while_inhibited_is_unchanged() {
        let mut s = in_work_state();
        s.inhibitors.insert("process:zoom.us".to_string());
        assert_eq!(reduce(&s, &tick_action(10.0, 1.0)), Reduction::Unchanged);
    }

    #[test]
    fn zero_dt_with_same_idle_is_unchanged() {
        let s = EngineState::default();
        assert_eq!(reduce(&s, &tick_action(0.0, 0.0)), Reduction::Unchanged);
        assert_eq!(reduce(&s, &tick_action(0.0, -1.0)), Reduction::Unchanged);
    }

    #[test]
    fn zero_dt_with_new_idle_records_idle_only() {
        let s = EngineState::default();
        let next = apply(&s, tick_action(2.0, 0.0));
        assert_eq!(next.last_idle_seconds, 2.0);
        assert_eq!(next.last_updated_seconds, 0.0);
        assert_eq!(next.timings, Timings::default());
    }

    #[test]
    fn negative_dt_does_not_rewind() {
        let s = ticks(&EngineState::default(), 10, 0.0, 1.0);
        let next = apply(&s, tick_action(1.0, -5.0));
        assert_eq!(next.last_updated_seconds, 10.0);
        assert_eq!(next.timings.mini_elapsed, 10.0);
        assert_eq!(next.timings.work_elapsed, 10.0);
    }

    // ── normal ────────────────────────────────────────────────────────────────

    #[test]
    fn mini_break_starts_exactly_at_interval() {
        let s = EngineState::default();
        let before = ticks(&s, 239, 0.0, 1.0);
        assert_eq!(before.status, Status::Normal);
        assert_eq!(before.timings.mini_elapsed, 239.0);

        let at = apply(&before, tick_action(0.0, 1.0));
        assert_eq!(at.status, Status::InMini);
        assert_eq!(at.timings.mini_elapsed, 240.0);
        assert_eq!(at.timings.mini_taking, 0.0);
        assert_eq!(at.last_updated_seconds, 240.0);
    }

    #[test]
    fn short_idle_counts_as_activity() {
        // Threshold is 13 * 0.3 = 3.9 seconds.
        let s = apply(&EngineState::default(), tick_action(3.8, 1.0));
        assert_eq!(s.timings.mini_elapsed, 1.0);
        assert_eq!(s.timings.mini_taking, 0.0);

        let idle = apply(&s, tick_action(4.0, 1.0));
        assert_eq!(idle.timings.mini_elapsed, 1.0);
        assert_eq!(idle.timings.mini_taking, 1.0);
        assert_eq!(idle.timings.work_elapsed, 2.0);
    }

    #[test]
    fn activity_clears_passive_mini_credit() {
        let s = ticks(&EngineState::default(), 5, 10.0, 1.0);
        assert_eq!(s.timings.mini_taking, 5.0);
        let active = apply(&s, tick_action(0.0, 1.0));
        assert_eq!(active.timings.mini_taking, 0.0);
    }

    #[test]
    fn natural_break_resets_mini_timers() {
        let s = ticks(&EngineState::default(), 100, 0.0, 1.0);
        let next = apply(&s, tick_action(35.0, 1.0));
        assert_eq!(next.status, Status::Normal);
        assert_eq!(next.timings.mini_elapsed, 0.0);
        assert_eq!(next.timings.mini_taking, 13.0);
        assert_eq!(next.timings.work_elapsed, 101.0);
    }

    #[test]
    fn natural_break_suppresses_pending_mini_break() {
        let mut s = EngineState::default();
        s.timings.mini_elapsed = 240.0;
        let next = apply(&s, tick_action(35.0, 1.0));
        assert_eq!(next.status, Status::Normal);
        assert_eq!(next.timings.mini_elapsed, 0.0);
        assert_eq!(next.timings.mini_taking, 13.0);
    }

    #[test]
    fn natural_break_window_is_configurable() {
        let mut s = EngineState::default();
        s.config.natural_break_continuation_window_seconds = 60.0;
        let next = apply(&s, tick_action(35.0, 1.0));
        assert_eq!(next.timings.mini_taking, 1.0);
    }

    #[test]
    fn work_break_wins_over_mini_break() {
        let mut s = EngineState::default();
        s.timings.mini_elapsed = 240.0;
        s.timings.work_elapsed = 3000.0;
        let next = apply(&s, tick_action(0.0, 1.0));
        assert_eq!(next.status, Status::InWork);
        assert_eq!(next.timings.work_elapsed, 3000.0);
        assert_eq!(next.timings.work_taking, 0.0);
        assert_eq!(next.timings.mini_elapsed, 0.0);
        assert_eq!(next.timings.mini_taking, 13.0);
    }

    #[test]
    fn work_break_also_triggers_during_natural_break() {
        let mut s = EngineState::default();
        s.timings.work_elapsed = 2999.5;
        let next = apply(&s, tick_action(120.0, 1.0));
        assert_eq!(next.status, Status::InWork);
    }

    // ── in-mini ───────────────────────────────────────────────────────────────

    #[test]
    fn mini_break_completes_after_duration_of_idleness() {
        let s = apply(&EngineState::default(), Action::StartMiniBreak);
        let almost = ticks(&s, 12, 13.0, 1.0);
        assert_eq!(almost.status, Status::InMini);
        assert_eq!(almost.timings.mini_taking, 12.0);

        let done = apply(&almost, tick_action(13.0, 1.0));
        assert_eq!(done.status, Status::Normal);
        assert_eq!(done.timings.mini_elapsed, 0.0);
        assert_eq!(done.timings.mini_taking, 13.0);
    }

    #[test]
    fn activity_during_mini_break_restarts_it() {
        let s = ticks(&apply(&EngineState::default(), Action::StartMiniBreak), 8, 5.0, 1.0);
        assert_eq!(s.timings.mini_taking, 8.0);
        let active = apply(&s, tick_action(0.5, 1.0));
        assert_eq!(active.status, Status::InMini);
        assert_eq!(active.timings.mini_taking, 0.0);
    }

    #[test]
    fn work_break_preempts_mini_break() {
        let mut s = apply(&EngineState::default(), Action::StartMiniBreak);
        s.timings.work_elapsed = 2999.0;
        let next = apply(&s, tick_action(5.0, 1.0));
        assert_eq!(next.status, Status::InWork);
        assert_eq!(next.timings.mini_taking, 13.0);
    }

    // ── in-work ───────────────────────────────────────────────────────────────

    #[test]
    fn work_break_only_counts_compliant_idle_time() {
        let s = in_work_state();
        let active = ticks(&s, 10, 3.0, 1.0);
        assert_eq!(active.timings.work_taking, 0.0);
        assert_eq!(active.last_updated_seconds, 10.0);

        let away = ticks(&active, 10, 4.0, 1.0);
        assert_eq!(away.timings.work_taking, 10.0);
        assert_eq!(away.status, Status::InWork);
    }

    #[test]
    fn work_break_completes_to_baseline() {
        let s = ticks(&in_work_state(), 480, 10.0, 1.0);
        assert_eq!(s.status, Status::Normal);
        assert_eq!(
            s.timings,
            Timings {
                mini_elapsed: 0.0,
                mini_taking: 13.0,
                work_elapsed: 0.0,
                work_taking: 480.0,
            }
        );
    }

    #[test]
    fn natural_continuation_keeps_work_credit() {
        let mut s = EngineState::default();
        s.timings.work_taking = 100.0;
        let kept = apply(
            &s,
            Action::StartWorkBreak {
                natural_continuation: true,
            },
        );
        assert_eq!(kept.status, Status::InWork);
        assert_eq!(kept.timings.work_taking, 100.0);

        let fresh = apply(
            &s,
            Action::StartWorkBreak {
                natural_continuation: false,
            },
        );
        assert_eq!(fresh.timings.work_taking, 0.0);
    }

    // ── postpone ──────────────────────────────────────────────────────────────

    #[test]
    fn postpone_rewinds_work_timer() {
        let s = apply(&in_work_state(), Action::PostponeWorkBreak);
        assert_eq!(s.status, Status::Normal);
        assert_eq!(
            s.timings,
            Timings {
                mini_elapsed: 0.0,
                mini_taking: 0.0,
                work_elapsed: 2400.0,
                work_taking: 0.0,
            }
        );
    }

    #[test]
    fn postponed_work_break_returns_after_postpone_seconds() {
        let s = apply(&in_work_state(), Action::PostponeWorkBreak);
        let almost = ticks(&s, 599, 0.0, 1.0);
        assert_ne!(almost.status, Status::InWork);
        assert_eq!(almost.timings.work_elapsed, 2999.0);

        let due = apply(&almost, tick_action(0.0, 1.0));
        assert_eq!(due.status, Status::InWork);
    }

    #[test]
    fn postpone_longer_than_interval_clamps_to_zero() {
        let mut s = in_work_state();
        s.config.work.postpone_seconds = 5000.0;
        let next = apply(&s, Action::PostponeWorkBreak);
        assert_eq!(next.timings.work_elapsed, 0.0);
    }

    // ── invariants ────────────────────────────────────────────────────────────

    #[test]
    fn timings_stay_within_bounds() {
        // Deterministic pseudo-random walk over idle/dt values.
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next_f64 = |max: f64| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed % 10_000) as f64 / 10_000.0 * max
        };
        let mut s = EngineState::default();
        s.config.mini.interval_seconds = 20.0;
        s.config.work.interval_seconds = 90.0;
        s.config.work.duration_seconds = 15.0;
        for _ in 0..5_000 {
            let idle = next_f64(40.0);
            let dt = next_f64(6.0) - 1.0;
            s = apply(&s, tick_action(idle, dt));
            assert_within_bounds(&s);
        }
    }

    // ── commands ──────────────────────────────────────────────────────────────

    #[test]
    fn reset_timings_keeps_flags_and_config() {
        let mut s = ticks(&EngineState::default(), 50, 0.0, 1.0);
        s.user_paused = true;
        s.inhibitors.insert("system:lock".to_string());
        s.processes = vec!["zoom.us".to_string()];
        s.config.tick_interval_ms = 1000;

        let next = apply(&s, Action::ResetTimings);
        assert_eq!(next.status, Status::Normal);
        assert_eq!(next.timings, Timings::default());
        assert_eq!(next.last_idle_seconds, 0.0);
        assert_eq!(next.last_updated_seconds, 0.0);
        assert!(next.user_paused);
        assert_eq!(next.inhibitors, s.inhibitors);
        assert_eq!(next.processes, s.processes);
        assert_eq!(next.config.tick_interval_ms, 1000);
    }

    #[test]
    fn set_config_resets_timings_and_keeps_pause() {
        let mut s = ticks(&EngineState::default(), 240, 0.0, 1.0);
        assert_eq!(s.status, Status::InMini);
        s.user_paused = true;
        s.inhibitors.insert("process:zoom.us".to_string());

        let patch = ConfigPatch {
            tick_interval_ms: Some(1000),
            ..Default::default()
        };
        let next = apply(&s, Action::SetConfig(patch));
        assert_eq!(next.status, Status::Normal);
        assert_eq!(next.timings, Timings::default());
        assert_eq!(next.config.tick_interval_ms, 1000);
        assert_eq!(next.config.mini, s.config.mini);
        assert!(next.user_paused);
        assert_eq!(next.inhibitors, s.inhibitors);
    }

    #[test]
    fn set_config_merges_onto_current_config() {
        let mut s = EngineState::default();
        s.config.tick_interval_ms = 1000;
        let patch = ConfigPatch {
            mini: Some(BreakPatch {
                interval_seconds: Some(60.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let next = apply(&s, Action::SetConfig(patch));
        assert_eq!(next.config.tick_interval_ms, 1000);
        assert_eq!(next.config.mini.interval_seconds, 60.0);
    }

    #[test]
    fn reset_config_restores_defaults() {
        let mut s = ticks(&EngineState::default(), 30, 0.0, 1.0);
        s.config.work.interval_seconds = 10.0;
        s.processes = vec!["zoom.us".to_string()];
        let next = apply(&s, Action::ResetConfig);
        assert_eq!(next.config, Configuration::default());
        assert_eq!(next.timings, Timings::default());
        assert_eq!(next.processes, s.processes);
    }

    #[test]
    fn inhibitors_are_idempotent() {
        let s = EngineState::default();
        let id = "system:suspend".to_string();
        let added = apply(&s, Action::AddInhibitor(id.clone()));
        assert!(added.is_paused());
        assert_eq!(reduce(&added, &Action::AddInhibitor(id.clone())), Reduction::Unchanged);

        let removed = apply(&added, Action::RemoveInhibitor(id.clone()));
        assert!(!removed.is_paused());
        assert_eq!(reduce(&removed, &Action::RemoveInhibitor(id)), Reduction::Unchanged);
    }

    #[test]
    fn inhibitors_never_touch_timings() {
        let s = ticks(&EngineState::default(), 20, 0.0, 1.0);
        let next = apply(&s, Action::AddInhibitor("system:lock".to_string()));
        assert_eq!(next.timings, s.timings);
        assert_eq!(next.status, s.status);
    }

    #[test]
    fn set_user_paused_same_value_is_unchanged() {
        let s = EngineState::default();
        assert_eq!(reduce(&s, &Action::SetUserPaused(false)), Reduction::Unchanged);
        assert!(reduce(&s, &Action::SetUserPaused(true)).is_changed());
    }

    #[test]
    fn pause_freezes_then_resume_continues() {
        let s = ticks(&EngineState::default(), 10, 0.0, 1.0);
        let paused = apply(&s, Action::SetUserPaused(true));
        let still = ticks(&paused, 100, 0.0, 1.0);
        assert_eq!(still.timings, s.timings);
        assert_eq!(still.status, s.status);

        let resumed = apply(&still, Action::SetUserPaused(false));
        let next = apply(&resumed, tick_action(0.0, 1.0));
        assert_eq!(next.timings.mini_elapsed, 11.0);
    }

    #[test]
    fn set_processes_compares_positionally() {
        let s = EngineState::default();
        let list = vec!["a".to_string(), "b".to_string()];
        let next = apply(&s, Action::SetProcesses(list.clone()));
        assert_eq!(next.processes, list);
        assert_eq!(reduce(&next, &Action::SetProcesses(list)), Reduction::Unchanged);

        let reordered = vec!["b".to_string(), "a".to_string()];
        assert!(reduce(&next, &Action::SetProcesses(reordered)).is_changed());
    }

    #[test]
    fn leaving_mini_break_pins_taking_at_duration() {
        let s = apply(&EngineState::default(), Action::StartMiniBreak);
        let next = apply(&s, Action::EndMiniBreak);
        assert_eq!(next.status, Status::Normal);
        assert_eq!(next.timings.mini_elapsed, 0.0);
        assert_eq!(next.timings.mini_taking, 13.0);
    }
}
