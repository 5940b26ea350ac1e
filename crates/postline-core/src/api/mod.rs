//! Messaging backend API.
//!
//! Two endpoints, both authorized with `Authorization: Bearer <token>`:
//!
//! - `GET /messages/get` returns `{ "data": [Message, ...] }`
//! - `POST /messages/send` takes [`SendRequest`] and returns a [`SendReceipt`]

mod http;

pub use http::HttpApi;

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Message;

/// Path of the inbox endpoint.
pub const INBOX_PATH: &str = "/messages/get";

/// Path of the send endpoint.
pub const SEND_PATH: &str = "/messages/send";

/// Exact body text the backend uses to confirm a send.
pub const SEND_SUCCESS_LITERAL: &str = "Message successfully sent";

/// Errors from a backend request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request could not be completed (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("Backend returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// Response body did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// Creates a malformed response error.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed(reason.into())
    }
}

/// Result type for backend requests.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Body of a send request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    /// Subject line.
    pub subject: String,
    /// Username of the receiver.
    pub receiver: String,
    /// Message body.
    pub message: String,
    /// Client time of submission.
    pub date: DateTime<Utc>,
}

/// Body of a successful inbox response.
#[derive(Debug, Clone, Deserialize)]
pub struct InboxResponse {
    /// Messages in server order.
    pub data: Vec<Message>,
}

/// Backend answer to a send request.
///
/// A body carrying `message` is decided by that string alone: it counts as
/// success only when it is exactly [`SEND_SUCCESS_LITERAL`], whatever else
/// the body holds. Bodies without `message` are read from `ok`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SendReceipt {
    /// `{ "message": string }`
    Legacy {
        /// Human-readable result.
        message: String,
    },
    /// `{ "ok": bool, "detail": string }`
    Status {
        /// Whether the message was accepted.
        ok: bool,
        /// Human-readable detail.
        #[serde(default)]
        detail: String,
    },
}

impl SendReceipt {
    /// Returns true if the backend confirmed the send.
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            Self::Status { ok, .. } => *ok,
            Self::Legacy { message } => message == SEND_SUCCESS_LITERAL,
        }
    }

    /// Returns the backend's text for the user.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Status { detail, .. } => detail,
            Self::Legacy { message } => message,
        }
    }
}

/// Transport to the messaging backend.
pub trait MessagesApi: Send + Sync {
    /// Fetches the inbox of the token's owner.
    fn fetch_messages(&self, token: &str) -> impl Future<Output = ApiResult<Vec<Message>>> + Send;

    /// Submits a message as the token's owner.
    fn send_message(
        &self,
        token: &str,
        request: &SendRequest,
    ) -> impl Future<Output = ApiResult<SendReceipt>> + Send;
}
