//! In-memory credential store.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::{CredentialKey, CredentialStore};
use crate::error::Result;

/// Credential store that keeps entries in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<CredentialKey, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding a login.
    #[must_use]
    pub fn with_login(username: &str, token: &str) -> Self {
        let store = Self::new();
        {
            let mut entries = store.lock();
            entries.insert(CredentialKey::Username, username.to_string());
            entries.insert(CredentialKey::Token, token.to_string());
        }
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CredentialKey, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: CredentialKey) -> Result<Option<String>> {
        Ok(self.lock().get(&key).cloned())
    }

    fn set(&self, key: CredentialKey, value: &str) -> Result<()> {
        self.lock().insert(key, value.to_string());
        Ok(())
    }

    fn delete(&self, key: CredentialKey) -> Result<()> {
        self.lock().remove(&key);
        Ok(())
    }
}
