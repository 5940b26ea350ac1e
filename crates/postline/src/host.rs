//! Terminal implementations of the session's host collaborators.

use std::sync::atomic::{AtomicBool, Ordering};

use postline_core::{Navigator, Notifier};
use tracing::debug;

/// Reports to stderr and, optionally, the desktop notification daemon.
#[derive(Debug, Default)]
pub struct TerminalHost {
    desktop: bool,
    redirected: AtomicBool,
}

impl TerminalHost {
    /// Creates a host; `desktop` also raises desktop notifications.
    #[must_use]
    pub const fn new(desktop: bool) -> Self {
        Self {
            desktop,
            redirected: AtomicBool::new(false),
        }
    }

    /// Returns true if the session sent the user to login.
    #[must_use]
    pub fn was_redirected(&self) -> bool {
        self.redirected.load(Ordering::SeqCst)
    }
}

impl Notifier for TerminalHost {
    fn notify(&self, message: &str) {
        eprintln!("{message}");

        if self.desktop {
            if let Err(e) = notify_rust::Notification::new()
                .summary("Postline")
                .body(message)
                .show()
            {
                debug!("Desktop notification failed: {e}");
            }
        }
    }
}

impl Navigator for TerminalHost {
    fn redirect_to_login(&self) {
        // Only the first redirect of a run is worth telling the user about.
        if !self.redirected.swap(true, Ordering::SeqCst) {
            eprintln!("Session expired or missing. Run `postline login` to sign in again.");
        }
    }
}
