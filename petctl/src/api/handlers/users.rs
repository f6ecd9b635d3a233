use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use crate::{
    AppState,
    api::{
        extract::{JsonBody, PathParam, QueryParams},
        handlers::auth::{create_account, validate_new_account},
        models::users::{ListUsersQuery, UserCreate, UserEnvelope, UserListResponse, UserResponse},
    },
    auth::{
        permissions::{RequiresPermission, permission},
        session::Identity,
    },
    db::models::users::UserFilter,
    errors::Error,
    types::UserId,
};

/// The caller's own account
#[tracing::instrument(skip_all)]
pub async fn get_me(State(state): State<AppState>, identity: Identity) -> Result<Json<UserEnvelope>, Error> {
    // The token can outlive the account
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| Error::Unauthenticated { message: None })?;

    Ok(Json(UserEnvelope {
        message: "User fetched successfully!".to_string(),
        user: user.into(),
    }))
}

#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    _: RequiresPermission<permission::GetUsers>,
    QueryParams(query): QueryParams<ListUsersQuery>,
) -> Result<Json<UserListResponse>, Error> {
    let skip = query.pagination.skip();
    let limit = query.pagination.limit();

    let users = state.users.list(&UserFilter::new(skip, limit)).await?;
    let total = state.users.count().await?;

    Ok(Json(UserListResponse {
        message: "Users fetched successfully!".to_string(),
        users: users.into_iter().map(UserResponse::from).collect(),
        total,
        skip,
        limit,
    }))
}

#[tracing::instrument(skip_all)]
pub async fn get_user(
    State(state): State<AppState>,
    _: RequiresPermission<permission::GetUsers>,
    PathParam(user_id): PathParam<UserId>,
) -> Result<Json<UserEnvelope>, Error> {
    let user = state.users.find_by_id(user_id).await?.ok_or_else(|| Error::NotFound {
        message: "User not found".to_string(),
    })?;

    Ok(Json(UserEnvelope {
        message: "User fetched successfully!".to_string(),
        user: user.into(),
    }))
}

/// Create an account on someone's behalf, optionally with an elevated role
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    caller: RequiresPermission<permission::CreateUser>,
    JsonBody(request): JsonBody<UserCreate>,
) -> Result<(StatusCode, Json<UserEnvelope>), Error> {
    validate_new_account(&request.name, &request.email, &request.password, &state.config.auth.native.password)?;

    let role = request.role.unwrap_or(state.config.auth.default_user_role);
    let summary = create_account(&state, request.name, request.email, &request.password, role).await?;
    let user = state.users.find_by_id(summary.id).await?.ok_or_else(|| Error::Internal {
        operation: "read back created user".to_string(),
    })?;
    tracing::info!(created = %summary.id, by = %caller.user_id, ?role, "User created");

    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            message: "User created successfully!".to_string(),
            user: user.into(),
        }),
    ))
}
