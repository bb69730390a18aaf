//! API handlers for the lending REST endpoints

pub mod auth;
pub mod books;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod stats;
pub mod users;

use std::marker::PhantomData;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::request::Parts,
    routing::{get, post},
    Json, RequestPartsExt, Router,
};
use axum_extra::{headers::Cookie, TypedHeader};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::AppError,
    models::{role::Action, user::User},
    AppState,
};

/// Extractor for the user owning the request's session cookie
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(cookies) = parts
            .extract::<TypedHeader<Cookie>>()
            .await
            .map_err(|_| AppError::Authentication("Not logged in".to_string()))?;

        let token = cookies
            .get(&state.config.auth.session_cookie)
            .ok_or_else(|| AppError::Authentication("Not logged in".to_string()))?;

        let user = state.services.auth.authenticate(token).await?;
        Ok(AuthenticatedUser(user))
    }
}

/// Permission checked while extracting the caller
pub trait Permission {
    const ACTION: Action;
}

macro_rules! permissions {
    ($($name:ident),* $(,)?) => {
        $(
            pub struct $name;

            impl Permission for $name {
                const ACTION: Action = Action::$name;
            }
        )*
    };
}

/// Marker types for [`Authorized`], named after the [`Action`] they check
pub mod can {
    use super::{Action, Permission};

    permissions!(
        ReadBooks,
        WriteBooks,
        DeleteBooks,
        ReadUsers,
        WriteUsers,
        Borrow,
        ManageLoans,
        ReadStats,
    );
}

/// Authenticated caller whose role grants `P`.
///
/// Parts extractors run before the body is read, so a caller without the
/// permission gets 403 whatever the payload looks like.
pub struct Authorized<P>(pub User, PhantomData<P>);

#[async_trait]
impl<P> FromRequestParts<AppState> for Authorized<P>
where
    P: Permission + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;
        user.require(P::ACTION)?;
        Ok(Authorized(user, PhantomData))
    }
}

/// JSON body extractor that reports malformed payloads as validation errors
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Authentication
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/user", get(auth::me))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        // Loans
        .route("/loans", get(loans::list_loans).post(loans::create_loan))
        .route("/loans/:id", get(loans::get_loan).put(loans::update_loan))
        .route("/loans/:id/return", post(loans::return_loan))
        // Statistics
        .route("/stats", get(stats::get_stats))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
