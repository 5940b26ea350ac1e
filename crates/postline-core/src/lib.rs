//! # postline-core
//!
//! Session-gated messaging operations for the Postline client.
//!
//! This crate provides:
//! - Domain models (`Message`, `OutgoingDraft`, `SessionState`)
//! - Draft validation
//! - HTTP client for the messaging backend
//! - `SessionGuard` - credential check before every privileged call
//! - `MessageSession` - inbox refresh and send, serialized by a single
//!   in-flight guard
//! - Configuration loading
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use postline_auth::KeyringStore;
//! use postline_core::{Config, HttpApi, MessageSession, OutgoingDraft, SessionGuard};
//!
//! let config = Config::load().await?;
//! let api = HttpApi::new(&config)?;
//! let guard = SessionGuard::new(Arc::new(KeyringStore::default()), navigator)
//!     .with_leeway(config.expiry_leeway());
//! let session = MessageSession::new(api, guard, notifier);
//!
//! session.activate().await;
//! let mut draft = OutgoingDraft::new("Hi", "Hello", "bob");
//! session.send_message(&mut draft).await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod draft;
mod error;
pub mod model;
pub mod session;

pub use api::{ApiError, HttpApi, MessagesApi, SEND_SUCCESS_LITERAL, SendReceipt, SendRequest};
pub use config::Config;
pub use draft::{DraftError, validate_draft};
pub use error::{Error, Result};
pub use model::{Message, OutgoingDraft, SessionState};
pub use session::{MessageSession, Navigator, Notifier, Outcome, SessionGuard};
