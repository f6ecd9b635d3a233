//! Route-level authentication and permission middleware.
//!
//! [`authenticate`] attaches the caller's [`Identity`] to the request, rejecting requests without
//! a valid bearer token. [`PermissionGuard`] is the guard factory: it resolves a permission name
//! once, when the router is built, and produces state for [`require_permission`].
//!
//! ```ignore
//! let guard = PermissionGuard::named("GET_USERS")?;
//! let router = Router::new()
//!     .route("/users", get(list_users))
//!     .route_layer(middleware::from_fn_with_state(guard.with_state(state.clone()), require_permission));
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument};

use crate::{
    AppState,
    auth::{current_user::authenticate_parts, permissions::Denial, session::Identity},
    errors::Error,
    types::{Permission, UnknownPermission, abbrev_uuid},
};

/// Reject requests without a valid bearer token; otherwise attach the [`Identity`] and continue.
#[instrument(skip_all)]
pub async fn authenticate(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, Error> {
    let (mut parts, body) = request.into_parts();
    authenticate_parts(&mut parts, &state)?;
    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// A single permission requirement, resolved from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionGuard {
    permission: Permission,
}

impl PermissionGuard {
    pub fn new(permission: Permission) -> Self {
        Self { permission }
    }

    /// Resolve a permission name such as `"GET_USERS"`.
    pub fn named(name: &str) -> Result<Self, UnknownPermission> {
        name.parse().map(Self::new)
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// Pair this guard with the application state, for `middleware::from_fn_with_state`.
    pub fn with_state(self, state: AppState) -> GuardedRoute {
        GuardedRoute { state, guard: self }
    }

    /// Run the full check for one request: table membership, then authentication, then role.
    pub fn check(&self, parts: &mut axum::http::request::Parts, state: &AppState) -> Result<Identity, Error> {
        if !state.permissions.has(self.permission) {
            return Err(Denial::UnknownPermission(self.permission).into());
        }

        let identity = authenticate_parts(parts, state)?;
        state.permissions.authorize(Some(&identity), self.permission).into_result()?;
        Ok(identity)
    }
}

/// Middleware state produced by [`PermissionGuard::with_state`].
#[derive(Clone)]
pub struct GuardedRoute {
    state: AppState,
    guard: PermissionGuard,
}

/// Reject the request unless the caller holds the guarded permission.
#[instrument(skip_all, fields(permission = %route.guard.permission))]
pub async fn require_permission(State(route): State<GuardedRoute>, request: Request, next: Next) -> Result<Response, Error> {
    let (mut parts, body) = request.into_parts();
    let identity = route.guard.check(&mut parts, &route.state)?;
    debug!(user_id = %abbrev_uuid(&identity.user_id), "Permission granted");
    Ok(next.run(Request::from_parts(parts, body)).await)
}
