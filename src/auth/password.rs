//! Password hashing built on bcrypt.
//!
//! The cost parameter is fixed at the library default; it is not exposed
//! through configuration. The CPU cost is the point: it slows offline
//! brute-force attempts against leaked hashes.

use crate::error::{Error, Result};

/// Hashes a plaintext password with a fresh random salt.
///
/// # Errors
/// Returns [`Error::Hashing`] if the underlying RNG or algorithm fails.
pub fn hash(plain: &str) -> Result<String> {
    bcrypt::hash(plain, bcrypt::DEFAULT_COST).map_err(Error::Hashing)
}

/// Verifies a candidate password against a stored hash.
///
/// Comparison happens inside bcrypt in constant time; the stored hash is
/// never compared by equality.
///
/// # Errors
/// Returns [`Error::CredentialMismatch`] when the candidate does not match
/// and [`Error::Hashing`] when the stored hash is malformed.
pub fn verify(hashed: &str, candidate: &str) -> Result<()> {
    if bcrypt::verify(candidate, hashed).map_err(Error::Hashing)? {
        Ok(())
    } else {
        Err(Error::CredentialMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_succeeds() {
        let hashed = hash("correct horse battery staple").unwrap();
        assert!(verify(&hashed, "correct horse battery staple").is_ok());
    }

    #[test]
    fn wrong_candidate_is_a_mismatch() {
        let hashed = hash("first password").unwrap();
        assert!(matches!(
            verify(&hashed, "second password"),
            Err(Error::CredentialMismatch)
        ));
    }

    #[test]
    fn hash_is_salted() {
        let first = hash("same input").unwrap();
        let second = hash("same input").unwrap();
        assert_ne!(first, second, "two hashes of one password must differ");
    }

    #[test]
    fn hash_does_not_contain_plaintext() {
        let hashed = hash("visible-secret").unwrap();
        assert!(!hashed.contains("visible-secret"));
    }

    #[test]
    fn malformed_hash_is_a_hashing_error() {
        assert!(matches!(
            verify("not-a-bcrypt-hash", "anything"),
            Err(Error::Hashing(_))
        ));
    }
}
