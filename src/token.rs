//! Bearer token expiry inspection.
//!
//! The client never verifies token signatures - that is the backend's
//! responsibility. We only decode the payload to read the `exp` claim and
//! decide whether a stored credential is still worth attaching to a request.
//! Anything that fails to decode is treated as expired (fail closed).

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Claims decoded from a bearer token.
///
/// Only the expiry claim is interpreted; everything else is carried as
/// opaque payload and never stored.
#[derive(Debug, Clone, Deserialize)]
pub struct BearerClaims {
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Remaining claims, passed through undecoded
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Errors that can occur while decoding a token payload.
#[derive(Debug)]
pub enum TokenError {
    /// The token is not a decodable JWT or is missing the `exp` claim
    Decoding(jsonwebtoken::errors::Error),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Decoding(e) => write!(f, "Failed to decode token: {}", e),
        }
    }
}

impl std::error::Error for TokenError {}

/// Decode a token's payload without verifying its signature.
pub fn decode_unverified(token: &str) -> Result<BearerClaims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    // Expiry is compared by the caller against an injected `now`.
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let token_data =
        jsonwebtoken::decode::<BearerClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(TokenError::Decoding)?;

    Ok(token_data.claims)
}

/// Whether a token is expired at `now_epoch_secs`.
///
/// A token that cannot be decoded counts as expired. A token whose `exp`
/// equals `now` is already expired.
pub fn is_expired(token: &str, now_epoch_secs: u64) -> bool {
    match decode_unverified(token) {
        Ok(claims) => claims.exp <= now_epoch_secs,
        Err(_) => true,
    }
}

/// Current Unix time in seconds.
pub fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
