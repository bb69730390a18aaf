//! Loan management endpoints

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::loan::{CreateLoan, Loan, ReturnLoan, UpdateLoan},
    AppState,
};

use super::{can, ApiJson, AuthenticatedUser, Authorized};

/// List loans. Admins and teachers see every loan, other roles only their own.
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Loans visible to the caller", body = Vec<Loan>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_loans(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> AppResult<Json<Vec<Loan>>> {
    Ok(Json(state.services.loans.list_loans(&user).await))
}

/// Get a loan by ID
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("session_cookie" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan details", body = Loan),
        (status = 403, description = "Loan belongs to another user"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.get_loan(&user, id).await?;
    Ok(Json(loan))
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("session_cookie" = [])),
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 400, description = "Unknown book or user, no copy available, or bad dates"),
        (status = 403, description = "Cannot lend to another user")
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    Authorized(user, _): Authorized<can::Borrow>,
    ApiJson(loan): ApiJson<CreateLoan>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    let created = state.services.loans.create_loan(&user, loan).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a loan; setting `returnDate` returns the copy
#[utoipa::path(
    put,
    path = "/loans/{id}",
    tag = "loans",
    security(("session_cookie" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    request_body = UpdateLoan,
    responses(
        (status = 200, description = "Loan updated", body = Loan),
        (status = 400, description = "Invalid dates"),
        (status = 403, description = "Admin or teacher role required"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn update_loan(
    State(state): State<AppState>,
    _: Authorized<can::ManageLoans>,
    Path(id): Path<i32>,
    ApiJson(update): ApiJson<UpdateLoan>,
) -> AppResult<Json<Loan>> {
    let updated = state.services.loans.update_loan(id, update).await?;
    Ok(Json(updated))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("session_cookie" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    request_body(content = ReturnLoan, description = "Optional; the return date defaults to now"),
    responses(
        (status = 200, description = "Book returned", body = Loan),
        (status = 403, description = "Loan belongs to another user"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    body: Bytes,
) -> AppResult<Json<Loan>> {
    // Only an absent body means "now"; anything else has to parse
    let return_date = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        serde_json::from_slice::<ReturnLoan>(&body)
            .map_err(|e| AppError::Validation(format!("Invalid JSON body: {}", e)))?
            .return_date
    };

    let loan = state.services.loans.return_loan(&user, id, return_date).await?;
    Ok(Json(loan))
}
