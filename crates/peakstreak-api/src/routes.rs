use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};
use serde_json::{Value, json};

use crate::middleware::{optional_auth, require_auth};
use crate::state::AppState;
use crate::{auth, feeds, habits, users};

/// Room above the avatar size limit so oversized uploads reach the service
/// and get its error message instead of a bare 413.
const AVATAR_BODY_LIMIT: usize = 4 * 1024 * 1024;

/// All `/api` routes. Static file serving and the outer layers (CORS,
/// tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/users/search", get(users::search_users))
        .route("/api/users/{username}/followers", get(users::get_followers))
        .route("/api/users/{username}/following", get(users::get_following))
        .route("/api/leaderboard", get(feeds::leaderboard))
        .route("/api/explore", get(feeds::explore));

    let profile_routes = Router::new()
        .route("/api/users/{username}", get(users::get_profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_auth));

    let protected_routes = Router::new()
        .route("/api/habits", post(habits::create_habit))
        .route(
            "/api/habits/{habit_id}",
            get(habits::get_habit)
                .put(habits::update_habit)
                .delete(habits::delete_habit),
        )
        .route("/api/habits/{habit_id}/logs", post(habits::log_habit))
        .route(
            "/api/users/{username}/follow",
            post(users::follow_user).delete(users::unfollow_user),
        )
        .route(
            "/api/me/avatar",
            put(users::update_avatar).layer(DefaultBodyLimit::max(AVATAR_BODY_LIMIT)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(profile_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
