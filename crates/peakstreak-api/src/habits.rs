use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use peakstreak_types::api::{Claims, CreateHabitRequest, LogHabitRequest, UpdateHabitRequest};

use crate::error::ApiError;
use crate::state::AppState;
use crate::validate;

/// POST /api/habits
pub async fn create_habit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateHabitRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    validate::habit_name(&req.name)?;
    validate::color_hue(req.color_hue)?;

    let habit = state
        .service
        .create_habit(&state.ctx(), req.name.trim(), req.color_hue, req.is_boolean, claims.sub)
        .await?;

    Ok((StatusCode::CREATED, Json(habit)))
}

/// GET /api/habits/{habit_id}: the habit with its recent logs, owner only.
pub async fn get_habit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    habit_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(habit_id) = habit_id?;
    let details = state
        .service
        .get_habit_details(&state.ctx(), habit_id, claims.sub)
        .await?;
    Ok(Json(details))
}

/// PUT /api/habits/{habit_id}
pub async fn update_habit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    habit_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateHabitRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(habit_id) = habit_id?;
    let Json(req) = payload?;
    validate::habit_name(&req.name)?;
    validate::color_hue(req.color_hue)?;

    let habit = state
        .service
        .update_habit(&state.ctx(), habit_id, req.name.trim(), req.color_hue, claims.sub)
        .await?;
    Ok(Json(habit))
}

/// DELETE /api/habits/{habit_id}
pub async fn delete_habit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    habit_id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(habit_id) = habit_id?;
    state.service.delete_habit(&state.ctx(), habit_id, claims.sub).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/habits/{habit_id}/logs: sets the value for one day.
pub async fn log_habit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    habit_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<LogHabitRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(habit_id) = habit_id?;
    let Json(req) = payload?;
    let date = validate::log_date(&req.date)?;
    validate::log_value(req.value)?;

    let log = state
        .service
        .log_habit(&state.ctx(), habit_id, date, req.value, claims.sub)
        .await?;
    Ok(Json(log))
}
