//! Terminal raw-mode guard
//!
//! Raw mode is what lets single keystrokes reach the filter, and it must be
//! undone on every way out: normal return, error, interrupt and panic.

#![warn(clippy::all, rust_2018_idioms)]

use crossterm::{cursor, terminal, ExecutableCommand};
use std::io::{self, stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

static RAW_MODE_ENABLED: AtomicBool = AtomicBool::new(false);

/// RAII guard for raw mode.
///
/// No alternate screen is used: log output keeps scrolling in the normal
/// buffer and stays there after exit.
pub struct TerminalSession {
    _private: (),
}

impl TerminalSession {
    /// Enter raw mode
    pub fn start() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        RAW_MODE_ENABLED.store(true, Ordering::SeqCst);
        debug!("Terminal raw mode enabled");

        Ok(Self { _private: () })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        // Best effort cleanup
        let _ = restore();
    }
}

/// Leave raw mode if this process entered it. Safe to call more than once
/// and from the panic hook.
pub fn restore() -> io::Result<()> {
    if !RAW_MODE_ENABLED.swap(false, Ordering::SeqCst) {
        return Ok(());
    }

    let _ = stdout().execute(cursor::Show);
    terminal::disable_raw_mode()?;
    debug!("Terminal raw mode restored");
    Ok(())
}
