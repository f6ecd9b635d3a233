//! Shared builders for unit and router tests.
//!
//! Everything here runs against [`InMemoryStore`] and cheap Argon2 parameters, so no database is
//! needed and password hashing stays fast.

use std::sync::Arc;

use axum_test::TestServer;
use uuid::Uuid;

use crate::{
    AppState,
    api::models::users::Role,
    auth::{
        password::{self, Argon2Params},
        session::Identity,
    },
    config::{Config, DatabaseConfig, PasswordConfig},
    db::{
        InMemoryStore, PetStore, UserStore,
        models::{
            pets::{PetCreateDBRequest, PetDBResponse},
            users::{UserCreateDBRequest, UserDBResponse},
        },
    },
};

pub const TEST_PASSWORD: &str = "password123";

pub fn create_test_config() -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig::Memory,
        admin_email: "admin@test.com".to_string(),
        admin_password: None,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        ..Default::default()
    };
    config.auth.native.password = PasswordConfig {
        argon2_memory_kib: 64,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        ..Default::default()
    };
    config
}

/// Application state over a fresh in-memory store.
pub fn create_test_state() -> AppState {
    create_test_state_with_config(create_test_config())
}

pub fn create_test_state_with_config(config: Config) -> AppState {
    let store = Arc::new(InMemoryStore::new());
    AppState::from_stores(config, store.clone(), store).expect("Failed to build test state")
}

/// Router over a fresh in-memory store, wrapped in a [`TestServer`].
pub fn create_test_app() -> (TestServer, AppState) {
    create_test_app_with_config(create_test_config())
}

pub fn create_test_app_with_config(config: Config) -> (TestServer, AppState) {
    let state = create_test_state_with_config(config);
    let router = crate::build_router(state.clone()).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");
    (server, state)
}

/// Create a user with [`TEST_PASSWORD`] and a unique email.
pub async fn create_test_user(state: &AppState, role: Role) -> UserDBResponse {
    let email = format!("testuser_{}@example.com", Uuid::new_v4().simple());
    create_test_user_with_email(state, role, &email).await
}

pub async fn create_test_user_with_email(state: &AppState, role: Role, email: &str) -> UserDBResponse {
    let params = Argon2Params::from(&state.config.auth.native.password);
    let password_hash = password::hash_string_with_params(TEST_PASSWORD, Some(params)).expect("Failed to hash password");

    UserStore::create(
        state.users.as_ref(),
        &UserCreateDBRequest {
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash,
            role,
        },
    )
    .await
    .expect("Failed to create test user")
}

pub async fn create_test_pet(state: &AppState, owner: &UserDBResponse, name: &str, pet_type: &str, age: i32) -> PetDBResponse {
    PetStore::create(
        state.pets.as_ref(),
        &PetCreateDBRequest {
            name: name.to_string(),
            age,
            pet_type: pet_type.to_string(),
            breed: None,
            color: None,
            image_url: None,
            owner_id: owner.id,
        },
    )
    .await
    .expect("Failed to create test pet")
}

/// A valid session token for `user`.
pub fn token_for(state: &AppState, user: &UserDBResponse) -> String {
    let identity = Identity {
        user_id: user.id,
        email: user.email.clone(),
        role: user.role,
    };
    state
        .authenticator
        .codec()
        .issue(&identity, state.config.auth.security.jwt_expiry)
        .expect("Failed to issue test token")
}
