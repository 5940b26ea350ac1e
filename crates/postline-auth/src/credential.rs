//! Bearer credential and expiry checks.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Bearer credential issued by the messaging backend at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Raw token string, sent verbatim in the `Authorization` header.
    pub token: String,
    /// Expiration time taken from the token's `exp` claim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Registered claims we read from the token payload.
#[derive(Debug, Deserialize)]
struct Claims {
    // NumericDate; may be fractional.
    #[serde(default)]
    exp: Option<f64>,
}

impl Credential {
    /// Creates a credential with no known expiry.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    /// Creates a credential from a JWT, reading the `exp` claim.
    ///
    /// The signature is not verified; the backend remains the authority on
    /// whether the token is accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not three dot-separated segments,
    /// the payload is not base64url JSON, or `exp` is out of range.
    pub fn from_token(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        let claims = decode_claims(&token)?;

        let expires_at = claims.exp.map(expiry_from_claim).transpose()?;

        Ok(Self { token, expires_at })
    }

    /// Sets the expiration time.
    #[must_use]
    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Checks if the credential is expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }

    /// Checks if the credential expires within `leeway` from now.
    ///
    /// A leeway reaching past the end of representable time counts as
    /// expired for any credential that has an expiry.
    #[must_use]
    pub fn is_expired_within(&self, leeway: Duration) -> bool {
        match Utc::now().checked_add_signed(leeway) {
            Some(at) => self.is_expired_at(at),
            None => self.expires_at.is_some(),
        }
    }

    /// Checks if the credential is expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns true if the credential is valid (not expired).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.is_expired()
    }
}

fn expiry_from_claim(exp: f64) -> Result<DateTime<Utc>> {
    if !exp.is_finite() {
        return Err(Error::ExpiryOutOfRange(exp));
    }
    // Saturates out-of-range values, which `from_timestamp` then rejects.
    #[allow(clippy::cast_possible_truncation)]
    let secs = exp.trunc() as i64;
    DateTime::from_timestamp(secs, 0).ok_or(Error::ExpiryOutOfRange(exp))
}

fn decode_claims(token: &str) -> Result<Claims> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(Error::malformed("expected three dot-separated segments"));
    };

    // Some issuers keep the base64 padding.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| Error::malformed(format!("payload is not base64url: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| Error::malformed(format!("payload is not a JSON object: {e}")))
}
