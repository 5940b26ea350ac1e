//! Credential stores.
//!
//! A session reads two entries from its store: the bearer `token` and the
//! `username` it was issued to. Both are written at login and removed at
//! logout, neither of which happens inside a session.

mod memory;
mod system;

pub use self::memory::MemoryStore;
pub use self::system::KeyringStore;

use tracing::{debug, warn};

use crate::credential::Credential;
use crate::error::{Error, Result};

/// Entry names a session reads from its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    /// Bearer token.
    Token,
    /// Username the token was issued to.
    Username,
}

impl CredentialKey {
    /// Returns the stable entry name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Username => "username",
        }
    }
}

impl std::fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secure key/value storage for credentials.
pub trait CredentialStore: Send + Sync {
    /// Reads an entry. A missing entry is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: CredentialKey) -> Result<Option<String>>;

    /// Writes an entry, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set(&self, key: CredentialKey, value: &str) -> Result<()>;

    /// Removes an entry. Removing a missing entry succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn delete(&self, key: CredentialKey) -> Result<()>;
}

impl<S: CredentialStore + ?Sized> CredentialStore for std::sync::Arc<S> {
    fn get(&self, key: CredentialKey) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: CredentialKey, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: CredentialKey) -> Result<()> {
        (**self).delete(key)
    }
}

/// Loads the bearer credential from a store.
///
/// A token that cannot be decoded is reported as absent: the session treats
/// it the same as a missing login.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn load_credential<S: CredentialStore + ?Sized>(store: &S) -> Result<Option<Credential>> {
    let Some(token) = store.get(CredentialKey::Token)? else {
        debug!("No token in credential store");
        return Ok(None);
    };

    if token.is_empty() {
        debug!("Empty token in credential store");
        return Ok(None);
    }

    match Credential::from_token(token) {
        Ok(credential) => Ok(Some(credential)),
        Err(e @ (Error::MalformedToken(_) | Error::ExpiryOutOfRange(_))) => {
            warn!("Ignoring stored token: {e}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Loads the username the stored token belongs to.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn load_username<S: CredentialStore + ?Sized>(store: &S) -> Result<Option<String>> {
    Ok(store
        .get(CredentialKey::Username)?
        .filter(|name| !name.trim().is_empty()))
}

/// Stores the username and token returned by a login.
///
/// # Errors
///
/// Returns an error if the token is not a decodable JWT or the store
/// cannot be written.
pub fn store_login<S: CredentialStore + ?Sized>(
    store: &S,
    username: &str,
    token: &str,
) -> Result<Credential> {
    let credential = Credential::from_token(token)?;
    store.set(CredentialKey::Token, token)?;
    store.set(CredentialKey::Username, username)?;
    debug!("Stored login for {username}");
    Ok(credential)
}

/// Removes the stored login.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn clear_login<S: CredentialStore + ?Sized>(store: &S) -> Result<()> {
    store.delete(CredentialKey::Token)?;
    store.delete(CredentialKey::Username)?;
    debug!("Cleared stored login");
    Ok(())
}
