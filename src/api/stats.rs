//! Dashboard statistics endpoint

use axum::{extract::State, Json};

use crate::{error::AppResult, services::stats::StatsResponse, AppState};

use super::{can, Authorized};

/// Catalog and loan counters for the dashboard
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Counters visible to the caller", body = StatsResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_stats(
    State(state): State<AppState>,
    Authorized(user, _): Authorized<can::ReadStats>,
) -> AppResult<Json<StatsResponse>> {
    Ok(Json(state.services.stats.get_stats(&user).await))
}
