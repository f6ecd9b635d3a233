//! # petctl: pets and users over a JWT-authenticated REST API
//!
//! `petctl` serves a small REST API for managing users and their pets. Callers log in with an
//! email and password and receive a signed bearer token carrying their user ID, email and role.
//! Every other route checks that token and then checks the role against a static permission
//! table before the handler runs.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum). Persistence sits behind the
//! [`db::UserStore`] and [`db::PetStore`] traits, implemented for PostgreSQL (the default) and for
//! process memory (`database.type: memory`, also used by the test suite).
//!
//! A request flows through:
//!
//! 1. tracing and CORS layers
//! 2. authentication: the bearer token is verified by [`auth::authenticator::Authenticator`]
//! 3. authorization: [`auth::permissions::PermissionTable::authorize`] maps the caller's role to the
//!    route's permission, via the [`auth::permissions::RequiresPermission`] extractor or a
//!    [`auth::middleware::PermissionGuard`] route layer
//! 4. the handler, which talks to the stores held in [`AppState`]
//!
//! Failures at any step render as `{ "message": ... }` through [`errors::Error`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use petctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = petctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     petctl::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::from_fn_with_state,
    routing::get,
};
use bon::Builder;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};

use crate::{
    api::{
        handlers::{auth as auth_handlers, pets, users},
        models::users::Role,
    },
    auth::{
        authenticator::Authenticator,
        middleware::{PermissionGuard, authenticate, require_permission},
        password::{self, Argon2Params},
        permissions::PermissionTable,
        session::TokenCodec,
    },
    config::{CorsOrigin, DatabaseConfig, PoolSettings},
    db::{
        InMemoryStore, PetStore, PostgresStore, UserStore,
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::Error,
};
pub use config::Config;
pub use types::{PetId, UserId};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .users(store.clone())
///     .pets(store)
///     .config(config)
///     .permissions(Arc::new(PermissionTable::builtin()))
///     .authenticator(authenticator)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub pets: Arc<dyn PetStore>,
    pub config: Config,
    pub permissions: Arc<PermissionTable>,
    pub authenticator: Authenticator,
}

impl AppState {
    /// Wire up the token codec, permission table and authenticator around the given stores.
    pub fn from_stores(config: Config, users: Arc<dyn UserStore>, pets: Arc<dyn PetStore>) -> anyhow::Result<Self> {
        let secret = config
            .secret_key
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| anyhow::anyhow!("secret_key is required to sign session tokens"))?;

        let authenticator = Authenticator::new(
            users.clone(),
            TokenCodec::new(secret),
            config.auth.security.jwt_expiry,
            Argon2Params::from(&config.auth.native.password),
        )?;

        Ok(Self::builder()
            .users(users)
            .pets(pets)
            .permissions(Arc::new(PermissionTable::builtin()))
            .authenticator(authenticator)
            .config(config)
            .build())
    }
}

/// Get the petctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial SuperAdmin if it doesn't exist, or refresh its password if it does.
///
/// Without a password there is nothing to log in with, so a missing account is not created.
/// Returns the admin's ID when the account exists afterwards.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(
    email: &str,
    password: Option<&str>,
    users: &dyn UserStore,
    params: Argon2Params,
) -> anyhow::Result<Option<UserId>> {
    let password_hash = match password {
        Some(pwd) => Some(password::hash_blocking(pwd.to_string(), params).await?),
        None => None,
    };

    if let Some(existing) = users.find_by_email(email).await? {
        if let Some(password_hash) = password_hash {
            let update = UserUpdateDBRequest {
                name: None,
                role: None,
                password_hash: Some(password_hash),
            };
            users.update(existing.id, &update).await?;
            debug!("Refreshed initial admin password");
        }
        return Ok(Some(existing.id));
    }

    let Some(password_hash) = password_hash else {
        warn!("No admin_password configured; skipping creation of the initial admin user");
        return Ok(None);
    };

    let created = users
        .create(&UserCreateDBRequest {
            name: "Admin".to_string(),
            email: email.to_string(),
            password_hash,
            role: Role::SuperAdmin,
        })
        .await?;
    info!(email, "Created initial admin user");
    Ok(Some(created.id))
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.security.cors;

    let allow_origin = if cors_config.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Origins never carry a path; Url always renders one
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(cors_config.allow_credentials);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

async fn route_not_found() -> Error {
    Error::NotFound {
        message: "Route not found".to_string(),
    }
}

/// Build the main application router with all endpoints and middleware.
///
/// `/login` and `/register` are only mounted when native authentication is enabled.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let pet_routes = Router::new()
        .route("/pet", get(pets::list_pets).post(pets::create_pet))
        .route("/pet/{id}", get(pets::get_pet).put(pets::update_pet).delete(pets::delete_pet));

    let owner_guard = PermissionGuard::named("GET_PETS")?;
    let owner_routes = Router::new()
        .route("/pet/owner/{id}", get(pets::get_owner_pets))
        .route_layer(from_fn_with_state(owner_guard.with_state(state.clone()), require_permission));

    let user_routes = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/{id}", get(users::get_user));

    let me_routes = Router::new()
        .route("/me", get(users::get_me))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(pet_routes)
        .merge(owner_routes)
        .merge(user_routes)
        .merge(me_routes);

    if state.config.auth.native.enabled {
        router = router
            .route("/login", axum::routing::post(auth_handlers::login))
            .route("/register", axum::routing::post(auth_handlers::register));
    } else {
        info!("Native authentication disabled; /login and /register are not mounted");
    }

    let cors = create_cors_layer(&state.config)?;
    let router = router.fallback(route_not_found).with_state(state).layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_request(DefaultOnRequest::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(cors),
    );

    Ok(router)
}

async fn connect_postgres(url: &str, settings: &PoolSettings) -> anyhow::Result<PgPool> {
    let mut options = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs));

    // 0 means never
    if settings.idle_timeout_secs > 0 {
        options = options.idle_timeout(Duration::from_secs(settings.idle_timeout_secs));
    }
    if settings.max_lifetime_secs > 0 {
        options = options.max_lifetime(Duration::from_secs(settings.max_lifetime_secs));
    }

    Ok(options.connect(url).await?)
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects the store, runs migrations and ensures the
///    initial admin exists
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests finish, the pool is
///    closed and telemetry is flushed
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting petctl with configuration: {:#?}", config);

        let (users, pets, pool): (Arc<dyn UserStore>, Arc<dyn PetStore>, Option<PgPool>) = match &config.database {
            DatabaseConfig::Postgres { url, pool } => {
                info!("Using PostgreSQL store");
                let pool = connect_postgres(url, pool).await?;
                migrator().run(&pool).await?;
                let store = Arc::new(PostgresStore::new(pool.clone()));
                (store.clone() as Arc<dyn UserStore>, store as Arc<dyn PetStore>, Some(pool))
            }
            DatabaseConfig::Memory => {
                warn!("Using in-memory store; data will be lost on shutdown");
                let store = Arc::new(InMemoryStore::new());
                (store.clone() as Arc<dyn UserStore>, store as Arc<dyn PetStore>, None)
            }
        };

        create_initial_admin_user(
            &config.admin_email,
            config.admin_password.as_deref(),
            users.as_ref(),
            Argon2Params::from(&config.auth.native.password),
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {e}"))?;

        let state = AppState::from_stores(config.clone(), users, pets)?;
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "petctl listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
