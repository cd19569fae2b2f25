/// User commands and the `control.toml` inbox.
///
/// A front end requests a command by writing a small TOML file:
///
/// ```toml
/// command = "add-inhibitor"
/// id = "system:lock"
/// ```
///
/// `set-config` carries its patch in a `[config]` table with the same layout as
/// the `[breaks]` section of `config.toml`. The daemon deletes the file once it
/// has been parsed.
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::config::ConfigPatch;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    TriggerWorkBreak,
    TriggerMiniBreak,
    PostponeWorkBreak,
    SkipWorkBreak,
    SkipMiniBreak,
    SkipBreak,
    Pause,
    Resume,
    TogglePause,
    ResetTimings,
    SetConfig(ConfigPatch),
    ResetConfig,
    AddInhibitor(String),
    RemoveInhibitor(String),
    /// Unrecognised command name; handled as a no-op.
    Unknown(String),
}

impl Command {
    pub fn name(&self) -> &str {
        match self {
            Command::TriggerWorkBreak => "trigger-work-break",
            Command::TriggerMiniBreak => "trigger-mini-break",
            Command::PostponeWorkBreak => "postpone-work-break",
            Command::SkipWorkBreak => "skip-work-break",
            Command::SkipMiniBreak => "skip-mini-break",
            Command::SkipBreak => "skip-break",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::TogglePause => "toggle-pause",
            Command::ResetTimings => "reset-timings",
            Command::SetConfig(_) => "set-config",
            Command::ResetConfig => "reset-config",
            Command::AddInhibitor(_) => "add-inhibitor",
            Command::RemoveInhibitor(_) => "remove-inhibitor",
            Command::Unknown(name) => name,
        }
    }
}

/// On-disk shape of `control.toml`.
#[derive(Debug, Deserialize)]
struct ControlRequest {
    command: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    config: ConfigPatch,
}

impl TryFrom<ControlRequest> for Command {
    type Error = anyhow::Error;

    fn try_from(req: ControlRequest) -> Result<Self> {
        let command = match req.command.as_str() {
            "trigger-work-break" => Command::TriggerWorkBreak,
            "trigger-mini-break" => Command::TriggerMiniBreak,
            "postpone-work-break" => Command::PostponeWorkBreak,
            "skip-work-break" => Command::SkipWorkBreak,
            "skip-mini-break" => Command::SkipMiniBreak,
            "skip-break" => Command::SkipBreak,
            "pause" => Command::Pause,
            "resume" => Command::Resume,
            "toggle-pause" => Command::TogglePause,
            "reset-timings" => Command::ResetTimings,
            "set-config" => Command::SetConfig(req.config),
            "reset-config" => Command::ResetConfig,
            "add-inhibitor" => Command::AddInhibitor(required_id(req.id, &req.command)?),
            "remove-inhibitor" => Command::RemoveInhibitor(required_id(req.id, &req.command)?),
            _ => Command::Unknown(req.command),
        };
        Ok(command)
    }
}

fn required_id(id: Option<String>, command: &str) -> Result<String> {
    match id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => bail!("`{command}` requires a non-empty `id`"),
    }
}

/// Parses the contents of a control file.
pub fn parse_command(content: &str) -> Result<Command> {
    let req: ControlRequest = toml::from_str(content).context("Failed to parse control file")?;
    Command::try_from(req)
}

/// Reads and deletes the control file at `path`.
///
/// Returns `Ok(None)` if there is no file. A file that cannot be parsed is left
/// in place, since the writer may not have finished with it yet; the next
/// modification triggers another attempt.
pub fn take_command(path: &Path) -> Result<Option<Command>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read control file: {}", path.display()))?;
    let command = parse_command(&content)?;
    std::fs::remove_file(path)
        .with_context(|| format!("Failed to remove control file: {}", path.display()))?;
    Ok(Some(command))
}

/// Deletes a control file left over from a previous run.
pub fn discard_stale(path: &Path) {
    if path.exists() {
        match std::fs::remove_file(path) {
            Ok(()) => tracing::info!(target: "control", "Discarded stale control file"),
            Err(e) => tracing::warn!(target: "control", "Failed to remove stale control file: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BreakPatch;

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse_command(r#"command = "pause""#).unwrap(), Command::Pause);
        assert_eq!(
            parse_command(r#"command = "postpone-work-break""#).unwrap(),
            Command::PostponeWorkBreak
        );
        assert_eq!(parse_command(r#"command = "skip-break""#).unwrap(), Command::SkipBreak);
    }

    #[test]
    fn every_known_name_round_trips_through_name() {
        let names = [
            "trigger-work-break",
            "trigger-mini-break",
            "postpone-work-break",
            "skip-work-break",
            "skip-mini-break",
            "skip-break",
            "pause",
            "resume",
            "toggle-pause",
            "reset-timings",
            "set-config",
            "reset-config",
        ];
        for name in names {
            let cmd = parse_command(&format!("command = \"{name}\"")).unwrap();
            assert_eq!(cmd.name(), name);
            assert!(!matches!(cmd, Command::Unknown(_)), "{name} parsed as unknown");
        }
    }

    #[test]
    fn inhibitor_commands_carry_id() {
        let add = parse_command("command = \"add-inhibitor\"\nid = \"system:lock\"").unwrap();
        assert_eq!(add, Command::AddInhibitor("system:lock".to_string()));
        let remove = parse_command("command = \"remove-inhibitor\"\nid = \"system:lock\"").unwrap();
        assert_eq!(remove, Command::RemoveInhibitor("system:lock".to_string()));
    }

    #[test]
    fn inhibitor_command_without_id_is_an_error() {
        assert!(parse_command(r#"command = "add-inhibitor""#).is_err());
        assert!(parse_command("command = \"remove-inhibitor\"\nid = \" \"").is_err());
    }

    #[test]
    fn set_config_reads_patch_table() {
        let toml_str = r#"
command = "set-config"

[config]
tick_interval_ms = 1000

[config.mini]
interval_seconds = 300
"#;
        let cmd = parse_command(toml_str).unwrap();
        assert_eq!(
            cmd,
            Command::SetConfig(ConfigPatch {
                tick_interval_ms: Some(1000),
                mini: Some(BreakPatch {
                    interval_seconds: Some(300.0),
                    duration_seconds: None,
                }),
                ..ConfigPatch::default()
            })
        );
    }

    #[test]
    fn set_config_without_table_is_empty_patch() {
        let cmd = parse_command(r#"command = "set-config""#).unwrap();
        assert_eq!(cmd, Command::SetConfig(ConfigPatch::default()));
    }

    #[test]
    fn unknown_command_keeps_its_name() {
        let cmd = parse_command(r#"command = "make-coffee""#).unwrap();
        assert_eq!(cmd, Command::Unknown("make-coffee".to_string()));
        assert_eq!(cmd.name(), "make-coffee");
    }

    #[test]
    fn missing_command_field_is_an_error() {
        assert!(parse_command("id = \"x\"").is_err());
        assert!(parse_command("not toml [[[").is_err());
    }

    #[test]
    fn take_command_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(take_command(&dir.path().join("control.toml")).unwrap().is_none());
    }

    #[test]
    fn take_command_consumes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control.toml");
        std::fs::write(&path, r#"command = "toggle-pause""#).unwrap();

        assert_eq!(take_command(&path).unwrap(), Some(Command::TogglePause));
        assert!(!path.exists());
        assert!(take_command(&path).unwrap().is_none());
    }

    #[test]
    fn take_command_leaves_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control.toml");
        std::fs::write(&path, "command = ").unwrap();

        assert!(take_command(&path).is_err());
        assert!(path.exists());
    }

    #[test]
    fn discard_stale_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control.toml");
        std::fs::write(&path, r#"command = "pause""#).unwrap();
        discard_stale(&path);
        assert!(!path.exists());
        // Missing file is fine.
        discard_stale(&path);
    }
}
