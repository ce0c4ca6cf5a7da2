//! Signed, expiring tokens naming a user.

use std::time::Duration;

use chrono::Utc;
use common::Username;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;

/// Issues and validates tokens whose subject is a username.
pub trait TokenManager: Send + Sync {
    /// Issues a token for `subject` that expires after `lifetime`.
    fn issue(&self, subject: &Username, lifetime: Duration) -> Result<String, TokenError>;

    /// Returns the subject of a valid, unexpired token.
    fn validate(&self, token: &str) -> Result<Username, TokenError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// HS256 JWT token manager.
#[derive(Clone)]
pub struct JwtTokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenManager {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl TokenManager for JwtTokenManager {
    fn issue(&self, subject: &Username, lifetime: Duration) -> Result<String, TokenError> {
        let lifetime =
            i64::try_from(lifetime.as_secs()).map_err(|e| TokenError::Encoding(e.to_string()))?;
        let claims = Claims {
            sub: subject.to_string(),
            exp: Utc::now().timestamp().saturating_add(lifetime),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    fn validate(&self, token: &str) -> Result<Username, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;
        Ok(Username::from(data.claims.sub))
    }
}
