//! HS256 JWT issuing and verification

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::errors::AuthError;

/// HMAC-SHA256 keys need at least 256 bits
pub const MIN_SECRET_BYTES: usize = 32;

/// Claims carried by access tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies signed access tokens
pub struct JwtTokenProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_ms: i64,
    validation: Validation,
}

impl JwtTokenProvider {
    pub fn new(secret: &str, expiration_ms: i64) -> Result<Self, AuthError> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(AuthError::WeakSecret {
                min_bytes: MIN_SECRET_BYTES,
            });
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_ms,
            validation,
        })
    }

    /// Sign a token for `user_id` valid for the configured lifetime
    pub fn create_token(&self, user_id: i64, email: &str) -> Result<String, AuthError> {
        let now_ms = Utc::now().timestamp_millis();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now_ms / 1000,
            exp: (now_ms + self.expiration_ms).div_euclid(1000),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Verify signature and expiry, returning the claims
    pub fn parse_claims(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "JWT validation failed");
                AuthError::InvalidToken
            })
    }

    pub fn validate_token(&self, token: &str) -> bool {
        self.parse_claims(token).is_ok()
    }

    pub fn get_user_id(&self, token: &str) -> Result<i64, AuthError> {
        self.parse_claims(token)?
            .sub
            .parse::<i64>()
            .map_err(|_| AuthError::InvalidToken)
    }

    pub fn get_email(&self, token: &str) -> Result<String, AuthError> {
        Ok(self.parse_claims(token)?.email)
    }
}
