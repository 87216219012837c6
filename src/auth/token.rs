//! Signed bearer tokens for call authorization.
//!
//! Two token kinds exist, each signed with HMAC-SHA256 under its own secret
//! key and bound to its own lifetime: short-lived access tokens authorize
//! individual calls, long-lived refresh tokens only mint new access tokens.
//! The separation is structural (two keys), not a claim inspected after
//! verification, so neither kind can ever pass the other kind's verifier.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Claim set carried by both token kinds.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id the token was issued to.
    pub sub: i64,
    /// Unix timestamp the token was issued at.
    pub iat: i64,
    /// Unix timestamp the token expires at.
    pub exp: i64,
}

/// Immutable signing configuration, constructed once at process start.
#[derive(Clone)]
pub struct TokenConfig {
    /// Access-token signing key material.
    pub access_secret: Vec<u8>,
    /// Refresh-token signing key material.
    pub refresh_secret: Vec<u8>,
    /// Access token lifetime.
    pub access_ttl: Duration,
    /// Refresh token lifetime.
    pub refresh_ttl: Duration,
}

#[derive(Clone)]
struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Issues and verifies access and refresh tokens.
///
/// Immutable after construction; safe to share across concurrently handled
/// calls without synchronization.
#[derive(Clone)]
pub struct Authenticator {
    access: KeyPair,
    refresh: KeyPair,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl Authenticator {
    /// Creates an authenticator from signing configuration.
    pub fn new(config: TokenConfig) -> Self {
        Self {
            access: KeyPair::from_secret(&config.access_secret),
            refresh: KeyPair::from_secret(&config.refresh_secret),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        }
    }

    /// Issues an access token for the given subject.
    ///
    /// # Errors
    /// Returns [`Error::Signing`] if the signing primitive fails.
    pub fn issue_access(&self, subject: i64) -> Result<String> {
        Self::issue(&self.access.encoding, subject, self.access_ttl)
    }

    /// Issues a refresh token for the given subject.
    ///
    /// # Errors
    /// Returns [`Error::Signing`] if the signing primitive fails.
    pub fn issue_refresh(&self, subject: i64) -> Result<String> {
        Self::issue(&self.refresh.encoding, subject, self.refresh_ttl)
    }

    /// Verifies an access token and returns the subject it was issued to.
    ///
    /// # Errors
    /// Returns [`Error::InvalidToken`] when the signature does not verify
    /// under the access key, the declared algorithm is not HS256, or the
    /// token has expired. No leeway window is granted.
    pub fn verify_access(&self, token: &str) -> Result<i64> {
        Self::verify(&self.access.decoding, token)
    }

    /// Verifies a refresh token and returns the subject it was issued to.
    ///
    /// Used only to mint new access tokens; refresh tokens are never
    /// accepted as access credentials.
    ///
    /// # Errors
    /// Returns [`Error::InvalidToken`] on any verification failure.
    pub fn verify_refresh(&self, token: &str) -> Result<i64> {
        Self::verify(&self.refresh.decoding, token)
    }

    fn issue(key: &EncodingKey, subject: i64, ttl: Duration) -> Result<String> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: subject,
            iat: now,
            exp: now.saturating_add(ttl),
        };

        encode(&Header::new(Algorithm::HS256), &claims, key).map_err(Error::Signing)
    }

    fn verify(key: &DecodingKey, token: &str) -> Result<i64> {
        // The allowed-algorithm list is pinned server-side; a token whose
        // header declares any other algorithm (or "none") is rejected before
        // signature checking.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<Claims>(token, key, &validation).map_err(|err| {
            tracing::debug!(error = %err, "token verification failed");
            Error::InvalidToken
        })?;

        Ok(data.claims.sub)
    }
}

/// The narrow capability the authorization interceptor depends on.
///
/// Expressed as a trait rather than the concrete [`Authenticator`] so the
/// interceptor can be exercised against a fake with controllable outcomes.
pub trait AccessVerifier: Send + Sync {
    /// Verifies an access token and returns the subject it was issued to.
    fn verify_access(&self, token: &str) -> Result<i64>;
}

impl AccessVerifier for Authenticator {
    fn verify_access(&self, token: &str) -> Result<i64> {
        Authenticator::verify_access(self, token)
    }
}
