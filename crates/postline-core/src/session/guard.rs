//! Credential check in front of every privileged call.

use std::sync::Arc;

use chrono::Duration;
use postline_auth::{Credential, CredentialStore, load_credential, load_username};
use tracing::{debug, warn};

use super::host::Navigator;

/// Checks the stored credential before a network call.
///
/// Every check reads the store again: a token that was valid when the
/// screen opened may have expired by the time the user acts.
pub struct SessionGuard<S> {
    store: Arc<S>,
    navigator: Arc<dyn Navigator>,
    leeway: Duration,
}

impl<S: CredentialStore> SessionGuard<S> {
    /// Creates a guard over `store` that sends the user to `navigator` on failure.
    pub fn new(store: Arc<S>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            store,
            navigator,
            leeway: Duration::zero(),
        }
    }

    /// Treats tokens expiring within `leeway` as already expired.
    #[must_use]
    pub const fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Returns true if a present, unexpired credential is stored.
    ///
    /// On false the user has already been redirected to login; the caller
    /// must stop.
    pub fn ensure_valid(&self) -> bool {
        self.authorize().is_some()
    }

    /// Returns the stored credential if it is present and unexpired.
    ///
    /// On `None` the user has already been redirected to login.
    pub fn authorize(&self) -> Option<Credential> {
        let credential = match load_credential(self.store.as_ref()) {
            Ok(credential) => credential,
            Err(e) => {
                warn!("Failed to read credential: {e}");
                None
            }
        };

        match credential {
            Some(credential) if !credential.is_expired_within(self.leeway) => Some(credential),
            Some(_) => {
                debug!("Credential expired, redirecting to login");
                self.navigator.redirect_to_login();
                None
            }
            None => {
                debug!("No credential, redirecting to login");
                self.navigator.redirect_to_login();
                None
            }
        }
    }

    /// Reads the username the credential was issued to.
    pub fn identity(&self) -> Option<String> {
        load_username(self.store.as_ref()).unwrap_or_else(|e| {
            warn!("Failed to read username: {e}");
            None
        })
    }
}

impl<S> std::fmt::Debug for SessionGuard<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::Utc;
    use postline_auth::{CredentialKey, MemoryStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingNavigator(AtomicUsize);

    impl Navigator for CountingNavigator {
        fn redirect_to_login(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn jwt_expiring_in(seconds: i64) -> String {
        let exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        format!(
            "h.{}.s",
            URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#))
        )
    }

    fn guard(store: &Arc<MemoryStore>) -> (SessionGuard<MemoryStore>, Arc<CountingNavigator>) {
        let navigator = Arc::new(CountingNavigator::default());
        (SessionGuard::new(Arc::clone(store), navigator.clone()), navigator)
    }

    #[test]
    fn test_valid_credential() {
        let store = Arc::new(MemoryStore::with_login("alice", &jwt_expiring_in(3600)));
        let (guard, navigator) = guard(&store);

        assert!(guard.ensure_valid());
        assert_eq!(navigator.0.load(Ordering::SeqCst), 0);
        assert_eq!(guard.identity().as_deref(), Some("alice"));
    }

    #[test]
    fn test_missing_credential_redirects() {
        let store = Arc::new(MemoryStore::new());
        let (guard, navigator) = guard(&store);

        assert!(!guard.ensure_valid());
        assert_eq!(navigator.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_expired_credential_redirects() {
        let store = Arc::new(MemoryStore::with_login("alice", &jwt_expiring_in(-60)));
        let (guard, navigator) = guard(&store);

        assert!(guard.authorize().is_none());
        assert_eq!(navigator.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_leeway() {
        let store = Arc::new(MemoryStore::with_login("alice", &jwt_expiring_in(30)));
        let (guard, navigator) = guard(&store);
        assert!(guard.ensure_valid());

        let guard = guard.with_leeway(Duration::seconds(60));
        assert!(!guard.ensure_valid());
        assert_eq!(navigator.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_each_check_reads_the_store() {
        let store = Arc::new(MemoryStore::with_login("alice", &jwt_expiring_in(3600)));
        let (guard, navigator) = guard(&store);
        assert!(guard.ensure_valid());

        store
            .set(CredentialKey::Token, &jwt_expiring_in(-1))
            .unwrap();
        assert!(!guard.ensure_valid());
        assert_eq!(navigator.0.load(Ordering::SeqCst), 1);
    }
}
