use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use peakstreak_types::api::Claims;

use crate::auth::verify_token;
use crate::error::ApiError;
use crate::state::AppState;

/// The caller on routes that work with or without a login.
#[derive(Debug, Clone, Copy)]
pub struct Viewer(pub Option<Uuid>);

fn bearer_claims(headers: &HeaderMap, secret: &str) -> Option<Claims> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?
        .strip_prefix("Bearer ")?;
    verify_token(secret, token).ok()
}

/// Extract and validate JWT from Authorization header.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let claims = bearer_claims(req.headers(), &state.jwt_secret).ok_or(ApiError::Unauthorized)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Attaches a [`Viewer`]; a missing or invalid token just means anonymous.
pub async fn optional_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let viewer = bearer_claims(req.headers(), &state.jwt_secret).map(|c| c.sub);
    req.extensions_mut().insert(Viewer(viewer));
    next.run(req).await
}
