/// Canonical file paths for Respite data files.
///
/// All files live in one directory, by default `<config dir>/Respite/`
/// (`%APPDATA%\Respite\` on Windows, `~/Library/Application Support/Respite/`
/// on macOS, `$XDG_CONFIG_HOME/respite/` elsewhere):
///   - config.toml   Written by the GUI, read (and saved) by the daemon.
///   - status.toml   Written by the daemon, read by the GUI.
///   - control.toml  Written by the GUI, consumed and deleted by the daemon.
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(any(windows, target_os = "macos"))]
const APP_DIR_NAME: &str = "Respite";
#[cfg(not(any(windows, target_os = "macos")))]
const APP_DIR_NAME: &str = "respite";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STATUS_FILE_NAME: &str = "status.toml";
pub const CONTROL_FILE_NAME: &str = "control.toml";

/// Returns the platform's default application data directory.
pub fn app_data_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("No per-user configuration directory on this platform")?;
    Ok(base.join(APP_DIR_NAME))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    dir: PathBuf,
}

impl AppPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Uses `override_dir` when given, the platform default otherwise.
    pub fn resolve(override_dir: Option<PathBuf>) -> Result<Self> {
        match override_dir {
            Some(dir) => Ok(Self::new(dir)),
            None => app_data_dir().map(Self::new),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }

    pub fn status_file(&self) -> PathBuf {
        self.dir.join(STATUS_FILE_NAME)
    }

    pub fn control_file(&self) -> PathBuf {
        self.dir.join(CONTROL_FILE_NAME)
    }
}

/// Replaces `path` with `contents` via a temporary file in the same directory,
/// so readers never observe a truncated or half-written file.
/// Creates the parent directory if it does not exist.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write temporary file for {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
