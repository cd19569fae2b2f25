use crate::config::ConfigPatch;

/// Everything that can change the engine state. Consumed by [`crate::reducer::reduce`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Periodic sample from the scheduler.
    Tick { idle_seconds: f64, dt_seconds: f64 },
    /// Merge a partial configuration and reset timings.
    SetConfig(ConfigPatch),
    /// Restore the default configuration and reset timings.
    ResetConfig,
    ResetTimings,
    StartMiniBreak,
    EndMiniBreak,
    /// `natural_continuation` keeps the work-break credit already accumulated.
    StartWorkBreak { natural_continuation: bool },
    EndWorkBreak,
    PostponeWorkBreak,
    SetUserPaused(bool),
    AddInhibitor(String),
    RemoveInhibitor(String),
    SetProcesses(Vec<String>),
}

impl Action {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Tick { .. } => "tick",
            Action::SetConfig(_) => "set-config",
            Action::ResetConfig => "reset-config",
            Action::ResetTimings => "reset-timings",
            Action::StartMiniBreak => "start-mini-break",
            Action::EndMiniBreak => "end-mini-break",
            Action::StartWorkBreak { .. } => "start-work-break",
            Action::EndWorkBreak => "end-work-break",
            Action::PostponeWorkBreak => "postpone-work-break",
            Action::SetUserPaused(_) => "set-user-paused",
            Action::AddInhibitor(_) => "add-inhibitor",
            Action::RemoveInhibitor(_) => "remove-inhibitor",
            Action::SetProcesses(_) => "set-processes",
        }
    }

    /// True only for a work-break start that continues an idle period.
    pub fn is_natural_continuation(&self) -> bool {
        matches!(
            self,
            Action::StartWorkBreak {
                natural_continuation: true
            }
        )
    }
}
