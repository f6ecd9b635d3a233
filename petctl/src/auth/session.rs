//! JWT token creation and verification.
//!
//! A [`TokenCodec`] is built once at startup from the process-wide secret and shared through
//! [`crate::AppState`]. Tokens are HS256-signed and carry an [`Identity`] plus `iat`/`exp`.
//! Expiry is checked with zero leeway.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{api::models::users::Role, errors::Error as AppError, types::UserId};

/// Who is making a request, as established by a verified token.
///
/// Reflects the user's role at the time the token was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub identity: Identity,
    pub iat: i64, // Issued at
    pub exp: i64, // Expiration time
}

/// Why a token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token signature does not match")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign a token for `identity` that expires `ttl` from now.
    pub fn issue(&self, identity: &Identity, ttl: Duration) -> Result<String, AppError> {
        self.issue_at(identity, Utc::now(), ttl)
    }

    /// Sign a token as if issued at `issued_at`. Deterministic for a given payload and time.
    pub fn issue_at(&self, identity: &Identity, issued_at: DateTime<Utc>, ttl: Duration) -> Result<String, AppError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| AppError::Internal {
            operation: format!("convert token ttl: {e}"),
        })?;
        let claims = Claims {
            identity: identity.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(|e| AppError::Internal {
            operation: format!("create JWT: {e}"),
        })
    }

    /// Check signature and expiry, returning the embedded identity unchanged.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let token_data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            // Everything else means we could not make sense of the token
            _ => TokenError::Malformed,
        })?;

        Ok(token_data.claims.identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const HOUR: Duration = Duration::from_secs(3600);

    fn create_test_identity(role: Role) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_issue_and_verify_token() {
        let codec = TokenCodec::new("test-secret-key-for-jwt");
        let identity = create_test_identity(Role::Admin);

        let token = codec.issue(&identity, HOUR).unwrap();
        assert!(!token.is_empty());

        let verified = codec.verify(&token).unwrap();
        assert_eq!(verified, identity);
    }

    #[test]
    fn test_payload_uses_wire_field_names() {
        let identity = create_test_identity(Role::SuperAdmin);
        let claims = Claims {
            identity: identity.clone(),
            iat: 1,
            exp: 2,
        };

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["userId"], identity.user_id.to_string());
        assert_eq!(json["email"], "test@example.com");
        assert_eq!(json["role"], "SuperAdmin");
        assert_eq!(json["iat"], 1);
        assert_eq!(json["exp"], 2);
    }

    #[test]
    fn test_issue_is_deterministic() {
        let codec = TokenCodec::new("secret");
        let identity = create_test_identity(Role::User);
        let now = Utc::now();

        assert_eq!(
            codec.issue_at(&identity, now, HOUR).unwrap(),
            codec.issue_at(&identity, now, HOUR).unwrap()
        );
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let identity = create_test_identity(Role::User);
        let token = TokenCodec::new("one-secret").issue(&identity, HOUR).unwrap();

        let result = TokenCodec::new("different-secret").verify(&token);
        assert_eq!(result.unwrap_err(), TokenError::InvalidSignature);
    }

    #[test]
    fn test_verify_expired_token() {
        let codec = TokenCodec::new("secret");
        let identity = create_test_identity(Role::User);

        // Issued two hours ago with a one hour lifetime
        let issued_at = Utc::now() - chrono::Duration::hours(2);
        let token = codec.issue_at(&identity, issued_at, HOUR).unwrap();

        assert_eq!(codec.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_expired_token_with_wrong_secret() {
        // Signature is checked before expiry
        let identity = create_test_identity(Role::User);
        let issued_at = Utc::now() - chrono::Duration::hours(2);
        let token = TokenCodec::new("one").issue_at(&identity, issued_at, HOUR).unwrap();

        assert_eq!(TokenCodec::new("two").verify(&token).unwrap_err(), TokenError::InvalidSignature);
    }

    #[test]
    fn test_verify_malformed_token() {
        let codec = TokenCodec::new("secret");

        for token in ["not.a.token", "invalid", "", "too.many.parts.in.this.token", "garbage"] {
            assert_eq!(
                codec.verify(token).unwrap_err(),
                TokenError::Malformed,
                "Expected Malformed error for token: {token}"
            );
        }
    }
}
