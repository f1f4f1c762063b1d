use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{ChaCha20Poly1305, KeyInit, Nonce};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::application::ports::{SealedSession, SessionTokenCodec, SessionTokenError};
use crate::domain::{Credential, Principal, Role};

const TOKEN_VERSION: &str = "v1";
const NONCE_LEN: usize = 12;

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    name: String,
    admin: bool,
    credential: String,
    iat: i64,
    exp: i64,
}

/// Session tokens sealed with ChaCha20-Poly1305.
///
/// The backend credential travels inside the token, so the token is
/// encrypted, not just signed. Format: `v1.<nonce>.<ciphertext>`, both
/// base64url without padding.
pub struct SealedSessionCodec {
    key: [u8; 32],
    ttl: Duration,
}

impl SealedSessionCodec {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, SessionTokenError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(SessionTokenError::Sealing(
                "session secret must not be empty".to_string(),
            ));
        }

        let key: [u8; 32] = Sha256::digest(secret.as_bytes()).into();
        Ok(Self { key, ttl })
    }

    fn cipher(&self) -> Result<ChaCha20Poly1305, SessionTokenError> {
        ChaCha20Poly1305::new_from_slice(&self.key).map_err(|e| {
            SessionTokenError::Sealing(format!("failed to initialize session cipher: {}", e))
        })
    }
}

impl SessionTokenCodec for SealedSessionCodec {
    fn seal(&self, principal: &Principal) -> Result<SealedSession, SessionTokenError> {
        let issued_at = Utc::now();
        let expires_at = issued_at + self.ttl;
        let claims = SessionClaims {
            sub: principal.id.clone(),
            name: principal.display_name.clone(),
            admin: principal.is_admin(),
            credential: principal.credential.expose().to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let plaintext = serde_json::to_vec(&claims)
            .map_err(|e| SessionTokenError::Sealing(format!("failed to encode claims: {}", e)))?;

        let nonce_source = Uuid::new_v4();
        let nonce_bytes = &nonce_source.as_bytes()[..NONCE_LEN];
        let ciphertext = self
            .cipher()?
            .encrypt(Nonce::from_slice(nonce_bytes), plaintext.as_slice())
            .map_err(|e| SessionTokenError::Sealing(format!("failed to seal session: {}", e)))?;

        let token = format!(
            "{}.{}.{}",
            TOKEN_VERSION,
            URL_SAFE_NO_PAD.encode(nonce_bytes),
            URL_SAFE_NO_PAD.encode(ciphertext)
        );
        Ok(SealedSession { token, expires_at })
    }

    fn open(&self, token: &str) -> Result<Principal, SessionTokenError> {
        let mut parts = token.split('.');
        let (Some(version), Some(nonce_b64), Some(ciphertext_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(SessionTokenError::Malformed(
                "expected three dot-separated segments".to_string(),
            ));
        };
        if version != TOKEN_VERSION {
            return Err(SessionTokenError::Malformed(format!(
                "unsupported token version {}",
                version
            )));
        }

        let nonce = URL_SAFE_NO_PAD
            .decode(nonce_b64)
            .map_err(|e| SessionTokenError::Malformed(format!("nonce: {}", e)))?;
        if nonce.len() != NONCE_LEN {
            return Err(SessionTokenError::Malformed("nonce length is invalid".to_string()));
        }
        let ciphertext = URL_SAFE_NO_PAD
            .decode(ciphertext_b64)
            .map_err(|e| SessionTokenError::Malformed(format!("ciphertext: {}", e)))?;

        let plaintext = self
            .cipher()?
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
            .map_err(|_| SessionTokenError::Tampered)?;
        let claims: SessionClaims = serde_json::from_slice(&plaintext)
            .map_err(|e| SessionTokenError::Malformed(format!("claims: {}", e)))?;

        if Utc::now().timestamp() >= claims.exp {
            return Err(SessionTokenError::Expired);
        }

        Ok(Principal {
            id: claims.sub,
            display_name: claims.name,
            role: Role::from_admin_flag(claims.admin),
            credential: Credential::new(claims.credential),
        })
    }
}
