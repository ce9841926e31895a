//! Process interrupt handling.
//!
//! The signal handler sets a flag only; it does not print anything. The
//! pipeline observes the flag, erases the live status line, and unwinds so
//! the terminal is left tidy on every exit path.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static INTERRUPT_NOTIFY: OnceLock<Notify> = OnceLock::new();

#[derive(Debug)]
pub struct InterruptedError;

impl std::fmt::Display for InterruptedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interrupted")
    }
}

impl std::error::Error for InterruptedError {}

/// Installs the SIGINT/SIGTERM/SIGHUP handler.
///
/// The handler runs on a dedicated thread (not in signal context), so
/// waking async waiters from it is safe.
///
/// # Panics
/// Panics if registering the handler fails.
pub fn init() {
    ctrlc::set_handler(trigger).expect("Error setting signal handler");
}

/// Requests an interrupt, force-exiting on a second signal.
pub fn trigger() {
    if INTERRUPTED.swap(true, Ordering::SeqCst) {
        // Second signal - the pipeline is not winding down fast enough.
        std::process::exit(130);
    }
    INTERRUPT_NOTIFY.get_or_init(Notify::new).notify_waiters();
}

/// Checks if an interrupt has been requested.
pub fn is_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Waits until an interrupt is triggered.
pub async fn wait_for_interrupt() {
    loop {
        if is_interrupted() {
            return;
        }
        INTERRUPT_NOTIFY.get_or_init(Notify::new).notified().await;
    }
}
