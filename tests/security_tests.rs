//! Adversarial tests against the credential primitives: forged, expired,
//! tampered, and algorithm-confused tokens, plus password hash properties.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use usergate::auth::password;
use usergate::auth::token::Claims;
use usergate::auth::{Authenticator, TokenConfig};
use usergate::Error;

fn authenticator() -> Authenticator {
    Authenticator::new(TokenConfig {
        access_secret: b"security-access-secret".to_vec(),
        refresh_secret: b"security-refresh-secret".to_vec(),
        access_ttl: Duration::from_secs(60),
        refresh_ttl: Duration::from_secs(3600),
    })
}

#[test]
fn token_kinds_are_not_interchangeable() {
    let auth = authenticator();

    let access = auth.issue_access(7).expect("Issuing should succeed");
    let refresh = auth.issue_refresh(7).expect("Issuing should succeed");

    assert!(
        auth.verify_refresh(&access).is_err(),
        "Access token must fail the refresh verifier"
    );
    assert!(
        auth.verify_access(&refresh).is_err(),
        "Refresh token must fail the access verifier"
    );
}

#[test]
fn expired_token_is_rejected_despite_valid_signature() {
    let auth = authenticator();

    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: 7,
        iat: now - 120,
        exp: now - 1,
    };
    let expired = jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(b"security-access-secret"),
    )
    .expect("Signing should succeed");

    assert!(
        matches!(auth.verify_access(&expired), Err(Error::InvalidToken)),
        "Expired token must be rejected with no leeway"
    );
}

#[test]
fn tampered_signature_is_rejected() {
    let auth = authenticator();
    let token = auth.issue_access(7).expect("Issuing should succeed");

    let dot = token.rfind('.').expect("Token has a signature part");
    let mut bytes = token.clone().into_bytes();
    let i = dot + 5;
    bytes[i] = if bytes[i] == b'x' { b'y' } else { b'x' };
    let tampered = String::from_utf8(bytes).expect("Token stays ascii");

    assert_ne!(token, tampered);
    assert!(
        matches!(auth.verify_access(&tampered), Err(Error::InvalidToken)),
        "A flipped signature byte must be rejected"
    );
}

#[test]
fn token_signed_under_a_different_key_is_rejected() {
    let auth = authenticator();
    let forger = Authenticator::new(TokenConfig {
        access_secret: b"attacker-controlled-secret".to_vec(),
        refresh_secret: b"attacker-controlled-secret".to_vec(),
        access_ttl: Duration::from_secs(60),
        refresh_ttl: Duration::from_secs(3600),
    });

    let forged = forger.issue_access(7).expect("Issuing should succeed");

    assert!(matches!(
        auth.verify_access(&forged),
        Err(Error::InvalidToken)
    ));
}

#[test]
fn declared_algorithm_cannot_downgrade_verification() {
    let auth = authenticator();

    let claims = URL_SAFE_NO_PAD.encode(br#"{"sub":7,"iat":0,"exp":9999999999}"#);

    // A header declaring an asymmetric algorithm must be rejected before any
    // signature checking happens.
    let rsa_header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let rsa_token = format!("{rsa_header}.{claims}.AAAA");
    assert!(matches!(
        auth.verify_access(&rsa_token),
        Err(Error::InvalidToken)
    ));

    // Same for the unsigned "none" algorithm, with and without a signature
    // segment present.
    let none_header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    for none_token in [
        format!("{none_header}.{claims}."),
        format!("{none_header}.{claims}.AAAA"),
    ] {
        assert!(matches!(
            auth.verify_access(&none_token),
            Err(Error::InvalidToken)
        ));
    }
}

#[test]
fn password_verification_roundtrip() {
    let hashed = password::hash("correct horse battery staple").expect("Hashing should succeed");

    assert!(password::verify(&hashed, "correct horse battery staple").is_ok());
    assert!(matches!(
        password::verify(&hashed, "incorrect horse"),
        Err(Error::CredentialMismatch)
    ));
}

#[test]
fn password_hashes_are_opaque_and_salted() {
    let first = password::hash("shared password").expect("Hashing should succeed");
    let second = password::hash("shared password").expect("Hashing should succeed");

    assert_ne!(first, second, "Salting must make repeated hashes differ");
    assert!(!first.contains("shared password"));
}
