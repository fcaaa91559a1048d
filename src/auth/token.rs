use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claim set carried by a session token. `sub` is the username; validity is
/// determined entirely by the signature and `exp`, with no server-side state.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,

    #[error("expired token")]
    Expired,

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Issues and verifies signed session tokens.
///
/// The signing secret is loaded once at startup; rotating it invalidates
/// every outstanding token.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Build and sign a claim set for `subject`, expiring after the
    /// configured ttl.
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning the subject username.
    ///
    /// No database lookup happens here; whether the subject still exists is
    /// the caller's concern.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let token_data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })?;

        Ok(token_data.claims.sub)
    }
}
