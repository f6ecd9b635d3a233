use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    api::{
        extract::JsonBody,
        models::{
            auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
            users::{Role, UserSummary},
        },
    },
    config::PasswordConfig,
    db::{errors::DbError, models::users::UserCreateDBRequest},
    errors::Error,
};

pub const USER_EXISTS_MESSAGE: &str = "User already exists.";

/// Check a new account's name, email and password against the configured rules.
pub(crate) fn validate_new_account(name: &str, email: &str, password: &str, rules: &PasswordConfig) -> Result<(), Error> {
    if name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Name is required".to_string(),
        });
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
        _ => {
            return Err(Error::BadRequest {
                message: "A valid email address is required".to_string(),
            });
        }
    }

    let length = password.chars().count();
    if length < rules.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", rules.min_length),
        });
    }
    if length > rules.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", rules.max_length),
        });
    }

    Ok(())
}

/// Create an account, reporting a taken email as a client error.
pub(crate) async fn create_account(state: &AppState, name: String, email: String, password: &str, role: Role) -> Result<UserSummary, Error> {
    if state.users.find_by_email(&email).await?.is_some() {
        return Err(Error::BadRequest {
            message: USER_EXISTS_MESSAGE.to_string(),
        });
    }

    let password_hash = state.authenticator.hash_password(password).await?;
    let request = UserCreateDBRequest {
        name,
        email,
        password_hash,
        role,
    };

    // The lookup above races with concurrent registrations; the unique constraint settles it
    match state.users.create(&request).await {
        Ok(user) => Ok(user.into()),
        Err(DbError::UniqueViolation { .. }) => Err(Error::BadRequest {
            message: USER_EXISTS_MESSAGE.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Register a new user account
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), Error> {
    if !state.config.auth.native.allow_registration {
        return Err(Error::Forbidden {
            message: Some("User registration is disabled".to_string()),
        });
    }

    validate_new_account(&request.name, &request.email, &request.password, &state.config.auth.native.password)?;

    let user = create_account(
        &state,
        request.name,
        request.email,
        &request.password,
        state.config.auth.default_user_role,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully!".to_string(),
            user,
        }),
    ))
}

/// Login with email and password
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, JsonBody(request): JsonBody<LoginRequest>) -> Result<Json<LoginResponse>, Error> {
    let outcome = state.authenticator.login(&request.email, &request.password).await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token: outcome.token,
        user: outcome.user.into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::ErrorBody,
        test_utils::{TEST_PASSWORD, create_test_app, create_test_app_with_config, create_test_config, create_test_user_with_email},
    };
    use serde_json::{Value, json};

    #[test_log::test(tokio::test)]
    async fn test_login_scenario() {
        let (server, state) = create_test_app();
        create_test_user_with_email(&state, Role::User, "a@b.com").await;

        let response = server
            .post("/login")
            .json(&json!({"email": "a@b.com", "password": TEST_PASSWORD}))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["message"], "Login successful");
        assert!(!body["token"].as_str().unwrap().is_empty());
        assert_eq!(body["user"]["email"], "a@b.com");
        assert!(body["user"].get("password").is_none());
        assert!(body["user"].get("password_hash").is_none());
        assert!(body["user"].get("role").is_none());

        let identity = state.authenticator.codec().verify(body["token"].as_str().unwrap()).unwrap();
        assert_eq!(identity.email, "a@b.com");
        assert_eq!(identity.role, Role::User);
    }

    #[tokio::test]
    async fn test_login_failures_look_the_same() {
        let (server, state) = create_test_app();
        create_test_user_with_email(&state, Role::User, "a@b.com").await;

        let wrong_password = server
            .post("/login")
            .json(&json!({"email": "a@b.com", "password": "not-the-password"}))
            .await;
        let unknown_user = server
            .post("/login")
            .json(&json!({"email": "nobody@b.com", "password": TEST_PASSWORD}))
            .await;

        wrong_password.assert_status_unauthorized();
        unknown_user.assert_status_unauthorized();
        assert_eq!(wrong_password.json::<ErrorBody>().message, "Invalid email or password");
        assert_eq!(unknown_user.json::<ErrorBody>().message, "Invalid email or password");
    }

    #[tokio::test]
    async fn test_login_malformed_body() {
        let (server, _) = create_test_app();

        let response = server.post("/login").json(&json!({"email": "a@b.com"})).await;
        response.assert_status_bad_request();
        assert!(!response.json::<ErrorBody>().message.is_empty());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (server, _) = create_test_app();

        let response = server
            .post("/register")
            .json(&json!({"name": "Ada", "email": "ada@example.com", "password": "secret123"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: RegisterResponse = response.json();
        assert_eq!(body.message, "User registered successfully!");
        assert_eq!(body.user.email, "ada@example.com");

        let response = server
            .post("/login")
            .json(&json!({"email": "ada@example.com", "password": "secret123"}))
            .await;
        response.assert_status_ok();
        let body: LoginResponse = response.json();
        assert_eq!(body.user.name, "Ada");
    }

    #[tokio::test]
    async fn test_register_assigns_default_role() {
        let (server, state) = create_test_app();

        server
            .post("/register")
            .json(&json!({"name": "Ada", "email": "ada@example.com", "password": "secret123"}))
            .await
            .assert_status(StatusCode::CREATED);

        let stored = state.users.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(stored.role, Role::User);
        assert_ne!(stored.password_hash, "secret123");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (server, state) = create_test_app();
        create_test_user_with_email(&state, Role::User, "taken@example.com").await;

        let response = server
            .post("/register")
            .json(&json!({"name": "Ada", "email": "taken@example.com", "password": "secret123"}))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<ErrorBody>().message, "User already exists.");
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (server, _) = create_test_app();

        let cases = [
            json!({"name": "Ada", "email": "ada@example.com", "password": "short"}),
            json!({"name": "Ada", "email": "not-an-email", "password": "secret123"}),
            json!({"name": "  ", "email": "ada@example.com", "password": "secret123"}),
        ];
        for case in cases {
            server.post("/register").json(&case).await.assert_status_bad_request();
        }
    }

    #[tokio::test]
    async fn test_register_disabled() {
        let mut config = create_test_config();
        config.auth.native.allow_registration = false;
        let (server, _) = create_test_app_with_config(config);

        let response = server
            .post("/register")
            .json(&json!({"name": "Ada", "email": "ada@example.com", "password": "secret123"}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_native_auth_disabled_unmounts_routes() {
        let mut config = create_test_config();
        config.auth.native.enabled = false;
        let (server, _) = create_test_app_with_config(config);

        let response = server
            .post("/login")
            .json(&json!({"email": "a@b.com", "password": "secret123"}))
            .await;
        response.assert_status_not_found();
    }
}
