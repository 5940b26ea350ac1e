//! System keyring credential store.
//!
//! Uses the platform's native credential storage:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use keyring::Entry;
use tracing::{debug, warn};

use super::{CredentialKey, CredentialStore};
use crate::error::Result;

/// Default service name for keyring entries.
pub const DEFAULT_SERVICE: &str = "postline";

/// Credential store backed by the system keyring.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    /// Creates a store that files entries under `service`.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Returns the service name entries are filed under.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: CredentialKey) -> Result<Entry> {
        Ok(Entry::new(&self.service, key.as_str())?)
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE)
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self, key: CredentialKey) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => {
                debug!("No {key} entry in keyring");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: CredentialKey, value: &str) -> Result<()> {
        self.entry(key)?.set_password(value)?;
        debug!("Stored {key} in keyring");
        Ok(())
    }

    fn delete(&self, key: CredentialKey) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => {
                debug!("Deleted {key} from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No {key} entry to delete");
                Ok(())
            }
            Err(e) => {
                warn!("Failed to delete {key}: {e}");
                Err(e.into())
            }
        }
    }
}
