//! Screen lock and system sleep, reported as engine inhibitors.
//!
//! On Windows a hidden top-level window on its own thread receives
//! `WM_WTSSESSION_CHANGE` and `WM_POWERBROADCAST`. Lock and suspend add the
//! `system:lock` and `system:suspend` inhibitors; unlock and resume remove
//! them. Elsewhere no notifications are available and the tick driver's
//! suspend-gap check covers sleep.
use std::sync::OnceLock;
use tokio::sync::mpsc;

use crate::control::Command;
use crate::event::DaemonEvent;

pub const LOCK_INHIBITOR: &str = "system:lock";
pub const SUSPEND_INHIBITOR: &str = "system:suspend";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemSignal {
    Lock,
    Unlock,
    Suspend,
    Resume,
}

impl SystemSignal {
    pub fn command(self) -> Command {
        match self {
            SystemSignal::Lock => Command::AddInhibitor(LOCK_INHIBITOR.to_string()),
            SystemSignal::Unlock => Command::RemoveInhibitor(LOCK_INHIBITOR.to_string()),
            SystemSignal::Suspend => Command::AddInhibitor(SUSPEND_INHIBITOR.to_string()),
            SystemSignal::Resume => Command::RemoveInhibitor(SUSPEND_INHIBITOR.to_string()),
        }
    }
}

// Win32 message and notification codes (WinUser.h, WtsApi32.h).
#[cfg_attr(not(windows), allow(dead_code))]
const WM_POWERBROADCAST: u32 = 0x0218;
const WM_WTSSESSION_CHANGE: u32 = 0x02B1;
const WTS_SESSION_LOCK: usize = 0x7;
const WTS_SESSION_UNLOCK: usize = 0x8;
const PBT_APMSUSPEND: usize = 0x4;
const PBT_APMRESUMESUSPEND: usize = 0x7;
const PBT_APMRESUMEAUTOMATIC: usize = 0x12;

/// Maps a window message and its `wParam` to a signal.
///
/// Windows sends both resume notifications after a user-initiated wake, so
/// `Resume` may arrive twice. Removing an absent inhibitor is a no-op.
#[cfg_attr(not(windows), allow(dead_code))]
fn signal_for_message(msg: u32, wparam: usize) -> Option<SystemSignal> {
    match (msg, wparam) {
        (WM_WTSSESSION_CHANGE, WTS_SESSION_LOCK) => Some(SystemSignal::Lock),
        (WM_WTSSESSION_CHANGE, WTS_SESSION_UNLOCK) => Some(SystemSignal::Unlock),
        (WM_POWERBROADCAST, PBT_APMSUSPEND) => Some(SystemSignal::Suspend),
        (WM_POWERBROADCAST, PBT_APMRESUMESUSPEND | PBT_APMRESUMEAUTOMATIC) => {
            Some(SystemSignal::Resume)
        }
        _ => None,
    }
}

/// Channel to the main event loop. Set once by [`start`].
static SESSION_TX: OnceLock<mpsc::Sender<DaemonEvent>> = OnceLock::new();

/// Sends the signal's command to the event loop.
///
/// Blocks while the channel is full: a dropped unlock or resume would leave
/// the engine paused. Only called from the notification thread.
#[cfg_attr(not(windows), allow(dead_code))]
fn forward(signal: SystemSignal) {
    tracing::info!(target: "session", ?signal, "System state changed");
    if let Some(tx) = SESSION_TX.get() {
        let _ = tx.blocking_send(DaemonEvent::Command(signal.command()));
    }
}

// ── Public handle ─────────────────────────────────────────────────────────────

/// A handle to the notification thread.
pub struct SessionHandle {
    #[cfg(windows)]
    thread: Option<std::thread::JoinHandle<()>>,
    #[cfg(windows)]
    thread_id: u32,
}

impl SessionHandle {
    /// Signals the notification thread to stop and blocks until it exits.
    pub fn stop(self) {
        #[cfg(windows)]
        if let Some(thread) = self.thread {
            imp::post_quit(self.thread_id);
            let _ = thread.join();
        }
    }
}

/// Starts listening for lock and power notifications.
///
/// Failures are logged and leave the daemon without these inhibitors.
///
/// # Non-Windows
/// Returns a stub handle.
pub fn start(tx: mpsc::Sender<DaemonEvent>) -> SessionHandle {
    let _ = SESSION_TX.set(tx);

    #[cfg(windows)]
    {
        let (id_tx, id_rx) = std::sync::mpsc::sync_channel::<u32>(1);
        let spawned = std::thread::Builder::new()
            .name("session-notify".into())
            .spawn(move || imp::run_message_pump(id_tx));
        match spawned.map(|thread| (thread, id_rx.recv())) {
            Ok((thread, Ok(thread_id))) => SessionHandle {
                thread: Some(thread),
                thread_id,
            },
            Ok((_, Err(_))) => {
                tracing::error!(target: "session", "Notification thread exited during startup");
                SessionHandle { thread: None, thread_id: 0 }
            }
            Err(e) => {
                tracing::error!(target: "session", "Failed to spawn notification thread: {e}");
                SessionHandle { thread: None, thread_id: 0 }
            }
        }
    }

    #[cfg(not(windows))]
    {
        tracing::debug!(target: "session", "Lock and sleep notifications are not available here");
        SessionHandle {}
    }
}

// ── Windows implementation ────────────────────────────────────────────────────

#[cfg(windows)]
mod imp {
    use std::sync::mpsc as std_mpsc;

    use windows::core::w;
    use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::System::RemoteDesktop::{
        WTSRegisterSessionNotification, WTSUnRegisterSessionNotification, NOTIFY_FOR_THIS_SESSION,
    };
    use windows::Win32::System::Threading::GetCurrentThreadId;
    use windows::Win32::UI::WindowsAndMessaging::{
        CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
        PostThreadMessageW, RegisterClassW, MSG, WINDOW_EX_STYLE, WINDOW_STYLE, WM_QUIT,
        WNDCLASSW,
    };

    use super::{forward, signal_for_message, WM_POWERBROADCAST};

    unsafe extern "system" fn window_proc(
        hwnd: HWND,
        msg: u32,
        w_param: WPARAM,
        l_param: LPARAM,
    ) -> LRESULT {
        if let Some(signal) = signal_for_message(msg, w_param.0) {
            forward(signal);
        }
        if msg == WM_POWERBROADCAST {
            return LRESULT(1);
        }
        DefWindowProcW(hwnd, msg, w_param, l_param)
    }

    /// Creates a hidden window, registers it for session notifications and
    /// pumps messages until `WM_QUIT`.
    ///
    /// Message-only windows do not receive power broadcasts, so this is an
    /// ordinary top-level window that is never shown.
    pub fn run_message_pump(id_tx: std_mpsc::SyncSender<u32>) {
        unsafe {
            let instance = match GetModuleHandleW(None) {
                Ok(instance) => instance,
                Err(e) => {
                    tracing::error!(target: "session", "GetModuleHandleW failed: {e}");
                    return;
                }
            };
            let class_name = w!("RespiteSessionWindow");
            let class = WNDCLASSW {
                lpfnWndProc: Some(window_proc),
                hInstance: instance.into(),
                lpszClassName: class_name,
                ..Default::default()
            };
            if RegisterClassW(&class) == 0 {
                tracing::error!(target: "session", "RegisterClassW failed");
                return;
            }

            let hwnd = CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                class_name,
                w!("respite-daemon"),
                WINDOW_STYLE::default(),
                0,
                0,
                0,
                0,
                None,
                None,
                instance,
                None,
            );
            if hwnd == HWND::default() {
                tracing::error!(target: "session", "CreateWindowExW failed");
                return;
            }

            let registered = match WTSRegisterSessionNotification(hwnd, NOTIFY_FOR_THIS_SESSION) {
                Ok(()) => true,
                Err(e) => {
                    // Power notifications still arrive without it.
                    tracing::warn!(target: "session", "Lock notifications unavailable: {e}");
                    false
                }
            };
            let _ = id_tx.send(GetCurrentThreadId());
            drop(id_tx);

            let mut msg = MSG::default();
            while GetMessageW(&mut msg, None, 0, 0).0 > 0 {
                DispatchMessageW(&msg);
            }

            if registered {
                let _ = WTSUnRegisterSessionNotification(hwnd);
            }
            let _ = DestroyWindow(hwnd);
            tracing::debug!(target: "session", "Notification thread exited");
        }
    }

    pub fn post_quit(thread_id: u32) {
        unsafe {
            let _ = PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
        }
    }
}
