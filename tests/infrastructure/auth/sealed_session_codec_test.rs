use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Duration;

use scribe_gateway::application::ports::{SessionTokenCodec, SessionTokenError};
use scribe_gateway::domain::{Credential, Principal, Role};
use scribe_gateway::infrastructure::auth::SealedSessionCodec;

fn principal() -> Principal {
    Principal::new("alice", Role::Admin, Credential::new("backend-token-123"))
}

#[test]
fn given_sealed_principal_when_opening_then_identity_and_credential_round_trip() {
    let codec = SealedSessionCodec::new("secret", Duration::minutes(5)).unwrap();

    let sealed = codec.seal(&principal()).unwrap();
    let opened = codec.open(&sealed.token).unwrap();

    assert_eq!(opened, principal());
    assert!(sealed.expires_at > chrono::Utc::now());
}

#[test]
fn given_sealed_token_when_inspecting_then_credential_is_not_visible() {
    let codec = SealedSessionCodec::new("secret", Duration::minutes(5)).unwrap();

    let sealed = codec.seal(&principal()).unwrap();

    assert!(sealed.token.starts_with("v1."));
    assert!(!sealed.token.contains("backend-token-123"));
    let ciphertext = sealed.token.rsplit('.').next().unwrap();
    let raw = URL_SAFE_NO_PAD.decode(ciphertext).unwrap();
    assert!(!String::from_utf8_lossy(&raw).contains("backend-token-123"));
}

#[test]
fn given_flipped_ciphertext_byte_when_opening_then_tampered() {
    let codec = SealedSessionCodec::new("secret", Duration::minutes(5)).unwrap();
    let sealed = codec.seal(&principal()).unwrap();
    let mut parts: Vec<String> = sealed.token.split('.').map(str::to_string).collect();
    let mut raw = URL_SAFE_NO_PAD.decode(&parts[2]).unwrap();
    raw[0] ^= 0x01;
    parts[2] = URL_SAFE_NO_PAD.encode(raw);

    let outcome = codec.open(&parts.join("."));

    assert!(matches!(outcome, Err(SessionTokenError::Tampered)));
}

#[test]
fn given_token_from_other_secret_when_opening_then_tampered() {
    let issuer = SealedSessionCodec::new("secret-a", Duration::minutes(5)).unwrap();
    let verifier = SealedSessionCodec::new("secret-b", Duration::minutes(5)).unwrap();

    let sealed = issuer.seal(&principal()).unwrap();

    assert!(matches!(
        verifier.open(&sealed.token),
        Err(SessionTokenError::Tampered)
    ));
}

#[test]
fn given_elapsed_lifetime_when_opening_then_expired() {
    let codec = SealedSessionCodec::new("secret", Duration::seconds(-1)).unwrap();

    let sealed = codec.seal(&principal()).unwrap();

    assert!(matches!(
        codec.open(&sealed.token),
        Err(SessionTokenError::Expired)
    ));
}

#[test]
fn given_garbage_when_opening_then_malformed() {
    let codec = SealedSessionCodec::new("secret", Duration::minutes(5)).unwrap();

    for token in ["", "abc", "v1.only-two", "v2.AAAA.BBBB", "v1.!!!.BBBB", "v1.a.b.c"] {
        assert!(
            matches!(codec.open(token), Err(SessionTokenError::Malformed(_))),
            "token {:?} was not rejected as malformed",
            token
        );
    }
}

#[test]
fn given_blank_secret_when_building_codec_then_rejected() {
    assert!(SealedSessionCodec::new("   ", Duration::minutes(5)).is_err());
}
