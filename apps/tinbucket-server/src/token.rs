//! Opaque admin session tokens.
//!
//! A token is `base64url(payload) + "." + hex(SHA-256(payload || secret))`
//! where the payload is a JSON object with `sub`, `iat`, `exp` (24 hours),
//! and a random `nonce`. Verification recomputes the signature and checks
//! the expiry.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Token validity window.
const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// The signed token payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPayload {
    /// The subject (admin username).
    pub sub: String,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiry, Unix seconds.
    pub exp: i64,
    /// Random value making every token unique.
    pub nonce: String,
}

/// Errors produced by token verification.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The token is not `payload.signature`.
    #[error("malformed token")]
    Malformed,
    /// The signature does not match.
    #[error("invalid token signature")]
    BadSignature,
    /// The token has expired.
    #[error("token expired")]
    Expired,
}

/// Mint a token for `subject`, valid for 24 hours.
#[must_use]
pub fn mint(subject: &str, secret: &str) -> String {
    let now = Utc::now().timestamp();
    let mut nonce_bytes = [0u8; 12];
    rand::rng().fill(&mut nonce_bytes);

    let payload = TokenPayload {
        sub: subject.to_owned(),
        iat: now,
        exp: now + TOKEN_TTL_SECS,
        nonce: hex::encode(nonce_bytes),
    };

    // TokenPayload serialization cannot fail: plain strings and integers.
    let payload_json = serde_json::to_vec(&payload).expect("token payload serializes");
    let signature = sign(&payload_json, secret);

    format!("{}.{signature}", URL_SAFE_NO_PAD.encode(&payload_json))
}

/// Verify a token's signature and expiry, returning the payload.
///
/// # Errors
///
/// Returns a [`TokenError`] describing the failure.
pub fn verify(token: &str, secret: &str) -> Result<TokenPayload, TokenError> {
    let (payload_b64, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;

    let payload_json = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| TokenError::Malformed)?;

    let expected = sign(&payload_json, secret);
    if !bool::from(signature.as_bytes().ct_eq(expected.as_bytes())) {
        return Err(TokenError::BadSignature);
    }

    let payload: TokenPayload =
        serde_json::from_slice(&payload_json).map_err(|_| TokenError::Malformed)?;

    if Utc::now().timestamp() > payload.exp {
        return Err(TokenError::Expired);
    }

    Ok(payload)
}

/// Compute `hex(SHA-256(payload || secret))`.
fn sign(payload: &[u8], secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
