//! Session authentication endpoints

use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::{headers::Cookie, TypedHeader};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    config::AuthConfig,
    error::AppResult,
    models::user::{CreateUser, User},
    AppState,
};

use super::{ApiJson, AuthenticatedUser};

/// Login request
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn session_cookie(config: &AuthConfig, token: &str) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.session_cookie,
        token,
        config.session_ttl().num_seconds()
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

fn expired_cookie(config: &AuthConfig) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", config.session_cookie)
}

/// Create an account and log it in
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body = CreateUser,
    responses(
        (status = 201, description = "Account created, session cookie set", body = User),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Role cannot be self-assigned"),
        (status = 409, description = "Username already taken")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(user): ApiJson<CreateUser>,
) -> AppResult<impl IntoResponse> {
    let (token, user) = state.services.auth.register(user).await?;
    let cookie = session_cookie(&state.config.auth, &token);

    Ok((StatusCode::CREATED, [(SET_COOKIE, cookie)], Json(user)))
}

/// Open a session
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, session cookie set", body = User),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let (token, user) = state
        .services
        .auth
        .login(&request.username, &request.password)
        .await?;
    let cookie = session_cookie(&state.config.auth, &token);

    Ok(([(SET_COOKIE, cookie)], Json(user)))
}

/// Close the current session
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    responses(
        (status = 204, description = "Logged out")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    cookies: Option<TypedHeader<Cookie>>,
) -> impl IntoResponse {
    if let Some(TypedHeader(cookies)) = cookies {
        if let Some(token) = cookies.get(&state.config.auth.session_cookie) {
            state.services.auth.logout(token).await;
        }
    }

    (StatusCode::NO_CONTENT, [(SET_COOKIE, expired_cookie(&state.config.auth))])
}

/// Current user
#[utoipa::path(
    get,
    path = "/user",
    tag = "auth",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Logged-in user", body = User),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}
