//! Host collaborators.
//!
//! The host environment supplies user feedback and navigation. Both are
//! fire-and-forget: a session never waits on them and never sees them fail.

/// Shows short-lived feedback to the user.
pub trait Notifier: Send + Sync {
    /// Displays `message`. Best-effort.
    fn notify(&self, message: &str);
}

/// Moves the user between screens.
pub trait Navigator: Send + Sync {
    /// Leaves the current screen for the login screen.
    fn redirect_to_login(&self);
}
