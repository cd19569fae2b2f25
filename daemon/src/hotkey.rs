/// Global hotkeys using a low-level Windows keyboard hook (`WH_KEYBOARD_LL`).
///
/// The hook runs on a dedicated OS thread with its own Windows message pump, so it
/// fires regardless of which window has focus. Each [`HotkeyAction`] has its own
/// binding; a press sends the matching [`Command`] to the daemon.
///
/// On non-Windows platforms the public API compiles but is a no-op at runtime.
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use tokio::sync::mpsc;

use crate::config::HotkeyConfig;
use crate::control::Command;
use crate::event::DaemonEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    PauseToggle,
    Postpone,
    Skip,
    TriggerWork,
    TriggerMini,
}

impl HotkeyAction {
    pub const ALL: [HotkeyAction; 5] = [
        HotkeyAction::PauseToggle,
        HotkeyAction::Postpone,
        HotkeyAction::Skip,
        HotkeyAction::TriggerWork,
        HotkeyAction::TriggerMini,
    ];

    pub fn command(self) -> Command {
        match self {
            HotkeyAction::PauseToggle => Command::TogglePause,
            HotkeyAction::Postpone => Command::PostponeWorkBreak,
            HotkeyAction::Skip => Command::SkipBreak,
            HotkeyAction::TriggerWork => Command::TriggerWorkBreak,
            HotkeyAction::TriggerMini => Command::TriggerMiniBreak,
        }
    }

    fn binding(self, config: &HotkeyConfig) -> Option<&str> {
        match self {
            HotkeyAction::PauseToggle => config.pause_toggle.as_deref(),
            HotkeyAction::Postpone => config.postpone.as_deref(),
            HotkeyAction::Skip => config.skip.as_deref(),
            HotkeyAction::TriggerWork => config.trigger_work.as_deref(),
            HotkeyAction::TriggerMini => config.trigger_mini.as_deref(),
        }
    }

    fn slot(self) -> &'static AtomicU32 {
        &HOOK_VKS[self as usize]
    }
}

/// Virtual-key code bound to each [`HotkeyAction`], indexed by discriminant
/// (0 = unbound). Written by [`HotkeyHandle::update`]; read inside the hook callback.
static HOOK_VKS: [AtomicU32; 5] = [
    AtomicU32::new(0),
    AtomicU32::new(0),
    AtomicU32::new(0),
    AtomicU32::new(0),
    AtomicU32::new(0),
];

/// Tokio channel used to forward hotkey commands from the hook callback to the
/// main event loop. Set once by [`start`].
static HOOK_TX: OnceLock<mpsc::Sender<DaemonEvent>> = OnceLock::new();

/// Converts a hotkey name string (e.g. `"F8"`, `"A"`) to a Windows virtual-key code.
///
/// Supported keys:
/// - Function keys `F1`–`F12` (case-insensitive).
/// - ASCII letters `A`–`Z` (normalised to their uppercase VK values, `0x41`–`0x5A`).
/// - ASCII digits `0`–`9` (VK values `0x30`–`0x39`).
///
/// Returns `None` for any unrecognised name.
pub fn parse_vk(name: &str) -> Option<u32> {
    let upper = name.trim().to_uppercase();
    if let Some(digits) = upper.strip_prefix('F') {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            let n: u32 = digits.parse().ok()?;
            return (1..=12).contains(&n).then(|| 0x6F + n);
        }
    }
    let mut chars = upper.chars();
    match (chars.next(), chars.next()) {
        // 'A'=0x41..'Z'=0x5A and '0'=0x30..'9'=0x39 are the VK codes themselves.
        (Some(c), None) if c.is_ascii_alphanumeric() => Some(c as u32),
        _ => None,
    }
}

/// Finds the action bound to `vk`, if any. The first action in
/// [`HotkeyAction::ALL`] wins when two share a key.
fn action_for_vk(vk: u32) -> Option<HotkeyAction> {
    if vk == 0 {
        return None;
    }
    HotkeyAction::ALL
        .into_iter()
        .find(|a| a.slot().load(Ordering::Relaxed) == vk)
}

fn store_bindings(config: &HotkeyConfig) {
    for action in HotkeyAction::ALL {
        let vk = match action.binding(config) {
            Some(name) => parse_vk(name).unwrap_or_else(|| {
                tracing::warn!(target: "hotkey", "Unrecognised key {name:?} for {action:?}; unbound");
                0
            }),
            None => 0,
        };
        action.slot().store(vk, Ordering::Relaxed);
    }
}

// ── Public handle ─────────────────────────────────────────────────────────────

/// A handle to the running keyboard hook.
///
/// Allows rebinding keys on config reload and stopping the hook thread when
/// the daemon exits.
pub struct HotkeyHandle {
    #[cfg(windows)]
    thread: Option<std::thread::JoinHandle<()>>,
    /// Thread ID of the message-pump thread, used to post `WM_QUIT`.
    #[cfg(windows)]
    thread_id: u32,
}

impl HotkeyHandle {
    /// Replaces all bindings. Unset or unrecognised keys disable their action
    /// without stopping the hook thread.
    pub fn update(&self, config: &HotkeyConfig) {
        store_bindings(config);
    }

    /// Signals the hook thread to stop and blocks until it exits.
    pub fn stop(self) {
        #[cfg(windows)]
        if let Some(thread) = self.thread {
            imp::post_quit(self.thread_id);
            let _ = thread.join();
        }
    }
}

// ── Startup ───────────────────────────────────────────────────────────────────

/// Installs a `WH_KEYBOARD_LL` keyboard hook on a dedicated OS thread and
/// returns a [`HotkeyHandle`] for managing it.
///
/// When a bound key is pressed, [`DaemonEvent::Command`] is sent to `tx` via a
/// non-blocking [`try_send`](mpsc::Sender::try_send). If the channel is full the
/// press is dropped.
///
/// If the hook thread cannot be started the error is logged and hotkeys stay
/// inactive for the rest of the run.
///
/// # Non-Windows
/// Returns a stub handle; all methods compile and run but do nothing.
pub fn start(config: &HotkeyConfig, tx: mpsc::Sender<DaemonEvent>) -> HotkeyHandle {
    store_bindings(config);
    // Silently ignore if called more than once (e.g. in test binaries).
    let _ = HOOK_TX.set(tx);

    #[cfg(windows)]
    {
        let (id_tx, id_rx) = std::sync::mpsc::sync_channel::<u32>(1);
        let spawned = std::thread::Builder::new()
            .name("hotkey-pump".into())
            .spawn(move || imp::run_message_pump(id_tx));
        match spawned.map(|thread| (thread, id_rx.recv())) {
            Ok((thread, Ok(thread_id))) => HotkeyHandle {
                thread: Some(thread),
                thread_id,
            },
            Ok((_, Err(_))) => {
                tracing::error!(target: "hotkey", "Hook thread exited during startup");
                HotkeyHandle { thread: None, thread_id: 0 }
            }
            Err(e) => {
                tracing::error!(target: "hotkey", "Failed to spawn hotkey thread: {e}");
                HotkeyHandle { thread: None, thread_id: 0 }
            }
        }
    }

    #[cfg(not(windows))]
    HotkeyHandle {}
}

// ── Windows implementation ────────────────────────────────────────────────────

#[cfg(windows)]
mod imp {
    use std::sync::mpsc as std_mpsc;

    use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
    use windows::Win32::System::Threading::GetCurrentThreadId;
    use windows::Win32::UI::WindowsAndMessaging::{
        CallNextHookEx, DispatchMessageW, GetMessageW, PostThreadMessageW, SetWindowsHookExW,
        UnhookWindowsHookEx, KBDLLHOOKSTRUCT, MSG, WH_KEYBOARD_LL, WM_KEYDOWN, WM_QUIT,
    };

    use super::{action_for_vk, HOOK_TX};
    use crate::event::DaemonEvent;

    /// Low-level keyboard hook procedure.
    ///
    /// Called by Windows on every keyboard event system-wide. Only key-down
    /// events for a bound key are forwarded.
    unsafe extern "system" fn keyboard_proc(
        n_code: i32,
        w_param: WPARAM,
        l_param: LPARAM,
    ) -> LRESULT {
        if n_code >= 0 && w_param.0 as u32 == WM_KEYDOWN {
            let kb = &*(l_param.0 as *const KBDLLHOOKSTRUCT);
            if let (Some(action), Some(tx)) = (action_for_vk(kb.vkCode), HOOK_TX.get()) {
                let _ = tx.try_send(DaemonEvent::Command(action.command()));
            }
        }
        CallNextHookEx(None, n_code, w_param, l_param)
    }

    /// Installs `WH_KEYBOARD_LL`, runs a Windows message pump until `WM_QUIT`,
    /// then uninstalls the hook.
    ///
    /// Sends the current thread ID to `id_tx` once the hook is installed so
    /// that [`super::start`] can later use it to post `WM_QUIT`.
    pub fn run_message_pump(id_tx: std_mpsc::SyncSender<u32>) {
        unsafe {
            let hook = match SetWindowsHookExW(
                WH_KEYBOARD_LL,
                Some(keyboard_proc),
                HINSTANCE::default(),
                0,
            ) {
                Ok(hook) => hook,
                Err(e) => {
                    tracing::error!(target: "hotkey", "SetWindowsHookExW failed: {e}");
                    return;
                }
            };
            let _ = id_tx.send(GetCurrentThreadId());
            drop(id_tx);

            let mut msg = MSG::default();
            // GetMessageW: >0 = message, 0 = WM_QUIT, <0 = error.
            while GetMessageW(&mut msg, None, 0, 0).0 > 0 {
                DispatchMessageW(&msg);
            }

            let _ = UnhookWindowsHookEx(hook);
            tracing::debug!(target: "hotkey", "Hook thread exited");
        }
    }

    /// Posts `WM_QUIT` to `thread_id`, causing its `GetMessageW` loop to exit.
    pub fn post_quit(thread_id: u32) {
        unsafe {
            let _ = PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse_vk ──────────────────────────────────────────────────────────────

    #[test]
    fn f_keys_are_contiguous_from_0x70() {
        for n in 1u32..=12 {
            let name = format!("F{n}");
            assert_eq!(parse_vk(&name), Some(0x6F + n), "Wrong VK for {name}");
            assert_eq!(parse_vk(&name.to_lowercase()), Some(0x6F + n));
        }
    }

    #[test]
    fn letters_and_digits_match_ascii_uppercase() {
        for c in (b'A'..=b'Z').chain(b'0'..=b'9') {
            let name = (c as char).to_string();
            assert_eq!(parse_vk(&name), Some(c as u32), "Failed for {name}");
            assert_eq!(parse_vk(&name.to_lowercase()), Some(c as u32));
        }
    }

    #[test]
    fn single_f_is_the_letter() {
        assert_eq!(parse_vk("F"), Some(0x46));
    }

    #[test]
    fn unrecognised_names_return_none() {
        for name in ["", "F0", "F13", "F24", "Escape", "Space", "AB", "!", " ", "\t", "F+1"] {
            assert_eq!(parse_vk(name), None, "{name:?} should not parse");
        }
    }

    // ── Bindings ──────────────────────────────────────────────────────────────

    #[test]
    fn actions_map_to_commands() {
        assert_eq!(HotkeyAction::PauseToggle.command(), Command::TogglePause);
        assert_eq!(HotkeyAction::Postpone.command(), Command::PostponeWorkBreak);
        assert_eq!(HotkeyAction::Skip.command(), Command::SkipBreak);
        assert_eq!(HotkeyAction::TriggerWork.command(), Command::TriggerWorkBreak);
        assert_eq!(HotkeyAction::TriggerMini.command(), Command::TriggerMiniBreak);
    }

    /// Exercises binding storage and lookup through the shared statics.
    ///
    /// Only this test touches `HOOK_VKS`, so tests running in parallel do not
    /// interfere with each other.
    #[test]
    fn bindings_update_and_lookup() {
        let (tx, _rx) = tokio::sync::mpsc::channel::<DaemonEvent>(8);
        let handle = start(
            &HotkeyConfig {
                pause_toggle: Some("F8".to_string()),
                skip: Some("F9".to_string()),
                postpone: Some("NotAKey".to_string()),
                ..HotkeyConfig::default()
            },
            tx,
        );

        assert_eq!(action_for_vk(0x77), Some(HotkeyAction::PauseToggle));
        assert_eq!(action_for_vk(0x78), Some(HotkeyAction::Skip));
        assert_eq!(HotkeyAction::Postpone.slot().load(Ordering::Relaxed), 0);
        assert_eq!(action_for_vk(0), None);
        assert_eq!(action_for_vk(0x41), None);

        handle.update(&HotkeyConfig {
            trigger_mini: Some("M".to_string()),
            ..HotkeyConfig::default()
        });
        assert_eq!(action_for_vk(0x77), None);
        assert_eq!(action_for_vk(0x4D), Some(HotkeyAction::TriggerMini));

        handle.stop();
    }
}
