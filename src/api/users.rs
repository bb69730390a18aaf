//! User management endpoints (administrators)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::user::{CreateUser, UpdateUser, User},
    AppState,
};

use super::{can, ApiJson, Authorized};

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "List of users", body = Vec<User>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    _: Authorized<can::ReadUsers>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.services.users.list_users().await))
}

/// Get user details by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("session_cookie" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    _: Authorized<can::ReadUsers>,
    Path(id): Path<i32>,
) -> AppResult<Json<User>> {
    let found = state.services.users.get_by_id(id).await?;
    Ok(Json(found))
}

/// Create a user with any role
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("session_cookie" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username already taken")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    _: Authorized<can::WriteUsers>,
    ApiJson(new_user): ApiJson<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let created = state.services.users.create_user(new_user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("session_cookie" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    _: Authorized<can::WriteUsers>,
    Path(id): Path<i32>,
    ApiJson(changes): ApiJson<UpdateUser>,
) -> AppResult<Json<User>> {
    let updated = state.services.users.update_user(id, changes).await?;
    Ok(Json(updated))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("session_cookie" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    _: Authorized<can::WriteUsers>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
