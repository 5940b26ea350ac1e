//! Draft validation.

use crate::model::OutgoingDraft;

/// A required draft field that is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftError {
    /// Subject is empty.
    EmptySubject,
    /// Message body is empty.
    EmptyMessage,
    /// Receiver is empty.
    EmptyReceiver,
    /// The session has no identity to send as.
    MissingSender,
}

impl DraftError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptySubject => "Subject is required",
            Self::EmptyMessage => "Message is required",
            Self::EmptyReceiver => "Receiver is required",
            Self::MissingSender => "Not logged in as any user",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptySubject => "subject",
            Self::EmptyMessage => "message",
            Self::EmptyReceiver => "receiver",
            Self::MissingSender => "sender",
        }
    }
}

impl std::fmt::Display for DraftError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for DraftError {}

/// Validate a draft before sending it as `sender`.
///
/// Returns `Ok(())` if valid, or `Err(Vec<DraftError>)` with every missing field.
/// Whitespace-only values count as missing.
///
/// # Errors
///
/// Returns a vector of `DraftError` if any required field is missing.
pub fn validate_draft(draft: &OutgoingDraft, sender: Option<&str>) -> Result<(), Vec<DraftError>> {
    let mut errors = Vec::new();

    if is_blank(&draft.subject) {
        errors.push(DraftError::EmptySubject);
    }
    if is_blank(&draft.message) {
        errors.push(DraftError::EmptyMessage);
    }
    if is_blank(&draft.receiver) {
        errors.push(DraftError::EmptyReceiver);
    }
    if sender.is_none_or(is_blank) {
        errors.push(DraftError::MissingSender);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
