use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::IntoResponse,
};

use peakstreak_types::api::LimitQuery;

use crate::error::ApiError;
use crate::state::AppState;

const MAX_LIMIT: u32 = 100;

fn clamp(query: LimitQuery) -> u32 {
    query.limit.clamp(1, MAX_LIMIT)
}

/// GET /api/leaderboard?limit=
pub async fn leaderboard(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let entries = state.service.leaderboard(&state.ctx(), clamp(query)).await?;
    Ok(Json(entries))
}

/// GET /api/explore?limit=
pub async fn explore(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let entries = state.service.explore(&state.ctx(), clamp(query)).await?;
    Ok(Json(entries))
}
