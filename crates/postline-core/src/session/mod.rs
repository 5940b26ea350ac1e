//! Message session.
//!
//! A [`MessageSession`] holds one screen's view of the inbox. Its two
//! operations, [`MessageSession::refresh_inbox`] and
//! [`MessageSession::send_message`], share a single request slot: while
//! one runs, calling either is a no-op that returns [`Outcome::Busy`].
//!
//! Every operation checks the credential through [`SessionGuard`] before
//! touching the network. Failures never escape as errors; they are shown to
//! the user through the [`Notifier`] and reported in the returned
//! [`Outcome`], and the session is left as it was before the call.

mod guard;
mod host;
mod in_flight;

pub use guard::SessionGuard;
pub use host::{Navigator, Notifier};

use std::sync::{Arc, Mutex};

use chrono::Utc;
use postline_auth::CredentialStore;
use tracing::{debug, info, warn};

use self::in_flight::{InFlight, lock};
use crate::api::{ApiError, MessagesApi};
use crate::draft::{DraftError, validate_draft};
use crate::model::{Message, OutgoingDraft, SessionState};

/// Shown when the inbox cannot be fetched.
pub const FETCH_FAILED_NOTICE: &str = "Error getting messages";

/// Shown when a draft is missing a required field.
pub const MISSING_FIELDS_NOTICE: &str = "Please fill in all fields";

/// Shown when a send fails without a backend explanation.
pub const SEND_FAILED_NOTICE: &str = "Error sending message";

/// How a session operation ended.
#[derive(Debug)]
#[must_use]
pub enum Outcome {
    /// The operation ran to success.
    Completed,
    /// Another operation held the session; nothing was done.
    Busy,
    /// The credential was missing or expired; the user was sent to login.
    SessionExpired,
    /// The draft was incomplete; nothing was sent.
    Invalid(Vec<DraftError>),
    /// The backend answered but did not confirm the send.
    Rejected(String),
    /// The request failed or the response was unusable.
    Failed(ApiError),
}

impl Outcome {
    /// Returns true if the operation ran to success.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Inbox and send operations for one logged-in user.
pub struct MessageSession<A, S> {
    api: A,
    guard: SessionGuard<S>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<SessionState>,
}

impl<A: MessagesApi, S: CredentialStore> MessageSession<A, S> {
    /// Creates a session with an empty inbox and no identity.
    pub fn new(api: A, guard: SessionGuard<S>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            guard,
            notifier,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Opens the session: checks the credential, loads the identity and
    /// fetches the inbox.
    pub async fn activate(&self) -> Outcome {
        if !self.guard.ensure_valid() {
            return Outcome::SessionExpired;
        }

        let identity = self.guard.identity();
        debug!("Session activated for {identity:?}");
        lock(&self.state).identity = identity;

        self.refresh_inbox().await
    }

    /// Replaces the inbox with the backend's current list.
    pub async fn refresh_inbox(&self) -> Outcome {
        let Some(slot) = InFlight::acquire(&self.state) else {
            debug!("Refresh skipped, request in flight");
            return Outcome::Busy;
        };

        self.refresh_holding(&slot).await
    }

    /// Sends `draft` as the session's identity.
    ///
    /// The draft is cleared only when the backend confirms the send, after
    /// which the inbox is refreshed before the session is released. On any
    /// other outcome the draft is left untouched.
    pub async fn send_message(&self, draft: &mut OutgoingDraft) -> Outcome {
        let Some(slot) = InFlight::acquire(&self.state) else {
            debug!("Send skipped, request in flight");
            return Outcome::Busy;
        };

        let sender = lock(&self.state).identity.clone();
        if let Err(errors) = validate_draft(draft, sender.as_deref()) {
            debug!("Draft rejected: {errors:?}");
            self.notifier.notify(MISSING_FIELDS_NOTICE);
            return Outcome::Invalid(errors);
        }

        let Some(credential) = self.guard.authorize() else {
            return Outcome::SessionExpired;
        };

        let request = draft.to_request(Utc::now());
        let receipt = match self.api.send_message(&credential.token, &request).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!("Failed to send message: {e}");
                self.notifier.notify(SEND_FAILED_NOTICE);
                return Outcome::Failed(e);
            }
        };

        let detail = receipt.detail();
        if !receipt.is_success() {
            warn!("Send not confirmed: {detail:?}");
            self.notifier.notify(if detail.is_empty() {
                SEND_FAILED_NOTICE
            } else {
                detail
            });
            return Outcome::Rejected(detail.to_string());
        }

        info!("Message sent to {}", request.receiver);
        if !detail.is_empty() {
            self.notifier.notify(detail);
        }
        draft.clear();

        // Reconcile while still holding the slot. A failed refresh has
        // already been reported and does not undo the send.
        let _ = self.refresh_holding(&slot).await;
        Outcome::Completed
    }

    async fn refresh_holding(&self, _slot: &InFlight<'_>) -> Outcome {
        let Some(credential) = self.guard.authorize() else {
            return Outcome::SessionExpired;
        };

        match self.api.fetch_messages(&credential.token).await {
            Ok(messages) => {
                info!("Fetched {} messages", messages.len());
                lock(&self.state).messages = messages;
                Outcome::Completed
            }
            Err(e) => {
                warn!("Failed to fetch messages: {e}");
                self.notifier.notify(FETCH_FAILED_NOTICE);
                Outcome::Failed(e)
            }
        }
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        lock(&self.state).clone()
    }

    /// Returns a copy of the inbox.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        lock(&self.state).messages.clone()
    }

    /// Returns the logged-in username, once loaded.
    #[must_use]
    pub fn identity(&self) -> Option<String> {
        lock(&self.state).identity.clone()
    }

    /// Returns true while an operation holds the session.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        lock(&self.state).request_in_flight
    }
}

impl<A, S> std::fmt::Debug for MessageSession<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageSession")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
