use axum::{
    Extension, Json,
    body::Bytes,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};

use peakstreak_types::api::{AvatarResponse, Claims, SearchQuery};

use crate::error::ApiError;
use crate::middleware::Viewer;
use crate::state::AppState;

/// GET /api/users/{username}: profile page data. Works anonymously.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(Viewer(viewer)): Extension<Viewer>,
    username: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(username) = username?;
    let profile = state
        .service
        .get_profile_data(&state.ctx(), &username, viewer)
        .await?;
    Ok(Json(profile))
}

/// GET /api/users/{username}/followers
pub async fn get_followers(
    State(state): State<AppState>,
    username: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(username) = username?;
    let users = state.service.get_followers(&state.ctx(), &username).await?;
    Ok(Json(users))
}

/// GET /api/users/{username}/following
pub async fn get_following(
    State(state): State<AppState>,
    username: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(username) = username?;
    let users = state.service.get_following(&state.ctx(), &username).await?;
    Ok(Json(users))
}

/// GET /api/users/search?q=
pub async fn search_users(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let users = state.service.search_users(&state.ctx(), &query.q).await?;
    Ok(Json(users))
}

/// POST /api/users/{username}/follow
pub async fn follow_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    username: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(username) = username?;
    state.service.follow_user(&state.ctx(), claims.sub, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/users/{username}/follow
pub async fn unfollow_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    username: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(username) = username?;
    state.service.unfollow_user(&state.ctx(), claims.sub, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/me/avatar: raw PNG or JPEG bytes.
pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    bytes: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::bad_request("empty upload"));
    }

    let avatar_url = state.service.update_avatar(&state.ctx(), claims.sub, &bytes).await?;
    Ok(Json(AvatarResponse { avatar_url }))
}
