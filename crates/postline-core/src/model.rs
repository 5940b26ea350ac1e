//! Domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::SendRequest;

/// A message as delivered by the backend.
///
/// Messages are never edited locally; a refresh replaces the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Subject line.
    pub subject: String,
    /// Username of the sender.
    pub sender: String,
    /// Username of the receiver.
    pub receiver: String,
    /// Message body.
    pub message: String,
    /// Time the sender submitted the message.
    pub date: DateTime<Utc>,
}

/// A message being composed.
///
/// The sender is implicit: it is the identity of the session that sends it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingDraft {
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub message: String,
    /// Username of the receiver.
    pub receiver: String,
}

impl OutgoingDraft {
    /// Creates a draft.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        message: impl Into<String>,
        receiver: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
            receiver: receiver.into(),
        }
    }

    /// Resets every field to empty.
    pub fn clear(&mut self) {
        self.subject.clear();
        self.message.clear();
        self.receiver.clear();
    }

    /// Returns true if every field is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subject.is_empty() && self.message.is_empty() && self.receiver.is_empty()
    }

    /// Builds the request body, stamped with the submission time.
    #[must_use]
    pub fn to_request(&self, date: DateTime<Utc>) -> SendRequest {
        SendRequest {
            subject: self.subject.clone(),
            receiver: self.receiver.clone(),
            message: self.message.clone(),
            date,
        }
    }
}

/// Observable state of a message session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Username of the logged-in user, once loaded.
    pub identity: Option<String>,
    /// Inbox in server order, as of the last successful refresh.
    pub messages: Vec<Message>,
    /// Whether an operation currently holds the session.
    pub request_in_flight: bool,
}
