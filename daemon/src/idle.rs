//! Seconds since the last keyboard or mouse input, as reported by the OS.
//!
//! - Windows: `GetLastInputInfo` compared against `GetTickCount`.
//! - macOS: `HIDIdleTime` (nanoseconds) from `ioreg -c IOHIDSystem`.
//! - Other Unix: `xprintidle` (milliseconds), which needs an X11 session.
use anyhow::Result;
use tracing::warn;

pub trait IdleSource {
    fn idle_seconds(&mut self) -> Result<f64>;
}

/// The platform's idle-time API.
#[derive(Debug, Default)]
pub struct SystemIdle;

impl IdleSource for SystemIdle {
    fn idle_seconds(&mut self) -> Result<f64> {
        imp::idle_seconds()
    }
}

/// Wraps an [`IdleSource`] so that failures degrade to "user is active".
///
/// A failing source is logged once when it starts failing and once when it
/// recovers, not on every tick.
pub struct IdleSampler {
    source: Box<dyn IdleSource + Send>,
    failing: bool,
}

impl IdleSampler {
    pub fn new(source: Box<dyn IdleSource + Send>) -> Self {
        Self {
            source,
            failing: false,
        }
    }

    pub fn sample(&mut self) -> f64 {
        match self.source.idle_seconds() {
            Ok(secs) => {
                if self.failing {
                    tracing::info!(target: "idle", "Idle time source recovered");
                    self.failing = false;
                }
                secs.max(0.0)
            }
            Err(e) => {
                if !self.failing {
                    warn!(target: "idle", "Idle time unavailable, assuming active: {e:#}");
                    self.failing = true;
                }
                0.0
            }
        }
    }

    /// Whether the most recent sample fell back to zero.
    pub fn is_failing(&self) -> bool {
        self.failing
    }
}

/// Extracts `HIDIdleTime` from `ioreg -c IOHIDSystem` output, in seconds.
pub fn parse_ioreg_idle(output: &str) -> Option<f64> {
    output
        .lines()
        .find(|line| line.contains("\"HIDIdleTime\""))
        .and_then(|line| line.rsplit('=').next())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(|nanos| nanos as f64 / 1_000_000_000.0)
}

/// Parses `xprintidle` output (milliseconds) into seconds.
pub fn parse_xprintidle(output: &str) -> Option<f64> {
    output
        .trim()
        .parse::<u64>()
        .ok()
        .map(|millis| millis as f64 / 1000.0)
}

#[cfg(not(windows))]
fn run(program: &str, args: &[&str]) -> Result<String> {
    use anyhow::{bail, Context};

    let output = std::process::Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("Failed to run {program}"))?;
    if !output.status.success() {
        bail!("{program} exited with {}", output.status);
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

// ── Platform implementations ──────────────────────────────────────────────────

#[cfg(windows)]
mod imp {
    use anyhow::{bail, Result};
    use windows::Win32::System::SystemInformation::GetTickCount;
    use windows::Win32::UI::Input::KeyboardAndMouse::{GetLastInputInfo, LASTINPUTINFO};

    pub fn idle_seconds() -> Result<f64> {
        let mut info = LASTINPUTINFO {
            cbSize: std::mem::size_of::<LASTINPUTINFO>() as u32,
            dwTime: 0,
        };
        let ok = unsafe { GetLastInputInfo(&mut info) };
        if !ok.as_bool() {
            bail!("GetLastInputInfo failed");
        }
        // Both values are milliseconds since boot and wrap after ~49.7 days.
        let now = unsafe { GetTickCount() };
        Ok(now.wrapping_sub(info.dwTime) as f64 / 1000.0)
    }
}

#[cfg(target_os = "macos")]
mod imp {
    use anyhow::{Context, Result};

    pub fn idle_seconds() -> Result<f64> {
        let output = super::run("ioreg", &["-c", "IOHIDSystem"])?;
        super::parse_ioreg_idle(&output).context("HIDIdleTime not found in ioreg output")
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
mod imp {
    use anyhow::{Context, Result};

    pub fn idle_seconds() -> Result<f64> {
        let output = super::run("xprintidle", &[])?;
        super::parse_xprintidle(&output).context("Unexpected xprintidle output")
    }
}
