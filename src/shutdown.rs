//! Process-wide quit request, set from signal handlers or the SDL window
//! and polled at the top of every loop iteration.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

static QUIT_REQUESTED: AtomicBool = AtomicBool::new(false);
static EXIT_CODE: AtomicI32 = AtomicI32::new(0);

pub fn should_quit() -> bool {
    QUIT_REQUESTED.load(Ordering::SeqCst)
}

pub fn request_quit() {
    QUIT_REQUESTED.store(true, Ordering::SeqCst);
}

pub fn exit_code() -> i32 {
    EXIT_CODE.load(Ordering::SeqCst)
}

/// Record a failure code. The first non-zero code wins.
pub fn set_exit_code(code: i32) {
    if code == 0 {
        return;
    }
    let _ = EXIT_CODE.compare_exchange(0, code, Ordering::SeqCst, Ordering::SeqCst);
}

/// Route SIGINT/SIGTERM (Ctrl-C on Windows) to [`request_quit`].
#[cfg(unix)]
pub fn install() {
    use std::os::raw::c_int;
    const SIGINT: c_int = 2;
    const SIGTERM: c_int = 15;

    extern "C" fn on_signal(_sig: c_int) {
        // Only async-signal-safe work here.
        request_quit();
    }

    extern "C" {
        fn signal(sig: c_int, handler: extern "C" fn(c_int)) -> usize;
    }

    unsafe {
        let _ = signal(SIGINT, on_signal);
        let _ = signal(SIGTERM, on_signal);
    }
}

#[cfg(windows)]
pub fn install() {
    type HandlerRoutine = extern "system" fn(u32) -> i32;
    extern "system" {
        fn SetConsoleCtrlHandler(handler: Option<HandlerRoutine>, add: i32) -> i32;
    }
    extern "system" fn on_ctrl(_ctrl_type: u32) -> i32 {
        request_quit();
        1
    }
    unsafe {
        let _ = SetConsoleCtrlHandler(Some(on_ctrl), 1);
    }
}

#[cfg(not(any(unix, windows)))]
pub fn install() {}
