//! # postline-auth
//!
//! Bearer credentials for the Postline messaging client.
//!
//! ## Features
//!
//! - **Credential model**: opaque bearer token with an expiry decoded from its JWT `exp` claim
//! - **Credential stores**: system keyring (Secret Service, Keychain, Credential Manager)
//!   and an in-memory store for tests and embedding
//! - **Login helpers**: write and clear the `token`/`username` pair a session reads
//!
//! ## Quick Start
//!
//! ```ignore
//! use postline_auth::{KeyringStore, load_credential, store_login};
//!
//! let store = KeyringStore::new("postline");
//! store_login(&store, "alice", "eyJhbGciOi...")?;
//!
//! if let Some(credential) = load_credential(&store)? {
//!     if credential.is_valid() {
//!         println!("Logged in until {:?}", credential.expires_at);
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod credential;
mod error;
pub mod store;

pub use credential::Credential;
pub use error::{Error, Result};
pub use store::{
    CredentialKey, CredentialStore, KeyringStore, MemoryStore, clear_login, load_credential,
    load_username, store_login,
};
