use crate::config::Settings;
use crate::control::Command;

pub enum DaemonEvent {
    /// A user command from the control file or a global hotkey.
    Command(Command),
    /// The config file changed on disk and was successfully re-parsed.
    ConfigReloaded(Settings),
    /// The set of running watched processes changed. Names are in config order.
    ProcessesChanged(Vec<String>),
    /// Ctrl+C received; the daemon should write its final status and exit.
    Shutdown,
}
