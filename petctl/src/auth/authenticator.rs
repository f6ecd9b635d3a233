//! Credential checks: password login and bearer-token authentication.

use std::{sync::Arc, time::Duration};

use tracing::{debug, instrument};

use crate::{
    auth::{
        password::{self, Argon2Params},
        session::{Identity, TokenCodec},
    },
    db::{UserStore, models::users::UserDBResponse},
    errors::{Error, Result},
    types::abbrev_uuid,
};

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

const BEARER_PREFIX: &str = "Bearer ";

/// A successful login: the signed token and the user it was issued for.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: UserDBResponse,
}

#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserStore>,
    codec: TokenCodec,
    token_ttl: Duration,
    password_params: Argon2Params,
    /// Verified against when the email is unknown, so both login failures cost one Argon2 run
    dummy_hash: String,
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserStore>, codec: TokenCodec, token_ttl: Duration, password_params: Argon2Params) -> Result<Self> {
        let dummy_hash = password::hash_string_with_params("petctl-unknown-account", Some(password_params))?;

        Ok(Self {
            users,
            codec,
            token_ttl,
            password_params,
            dummy_hash,
        })
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Check an email/password pair and issue a session token.
    ///
    /// An unknown email and a wrong password fail identically.
    #[instrument(skip_all, err)]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let invalid = || Error::Unauthenticated {
            message: Some(INVALID_CREDENTIALS_MESSAGE.to_string()),
        };

        let Some(user) = self.users.find_by_email(email).await? else {
            let _ = password::verify_blocking(password.to_string(), self.dummy_hash.clone()).await?;
            debug!("Login for unknown email");
            return Err(invalid());
        };

        // A stored hash we cannot parse is a server fault, not a bad password
        if !password::verify_blocking(password.to_string(), user.password_hash.clone()).await? {
            debug!(user_id = %abbrev_uuid(&user.id), "Login with wrong password");
            return Err(invalid());
        }

        let identity = Identity {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
        };
        let token = self.codec.issue(&identity, self.token_ttl)?;
        debug!(user_id = %abbrev_uuid(&user.id), "Issued session token");

        Ok(LoginOutcome { token, user })
    }

    /// Resolve an `Authorization` header value to the caller's identity.
    pub fn authenticate_request(&self, header: Option<&str>) -> Result<Identity> {
        let token = header
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(Error::MissingCredential)?;

        self.codec.verify(token).map_err(|e| {
            // Which check failed is logged, never returned
            debug!(reason = %e, "Bearer token rejected");
            Error::Unauthenticated { message: None }
        })
    }

    /// Hash a password with the configured Argon2 parameters.
    pub async fn hash_password(&self, password: &str) -> Result<String> {
        password::hash_blocking(password.to_string(), self.password_params).await
    }
}
