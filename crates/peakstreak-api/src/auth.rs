use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use peakstreak_types::api::{Claims, LoginRequest, LoginResponse, SignUpRequest};

use crate::error::ApiError;
use crate::state::AppState;
use crate::validate;

pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    validate::username(&req.username)?;
    validate::email(&req.email)?;
    validate::password(&req.password)?;

    let user = state
        .service
        .create_user(&state.ctx(), &req.username, &req.email, &req.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    if req.identifier.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("identifier and password are required"));
    }

    let user = state
        .service
        .login_user(&state.ctx(), &req.identifier, &req.password)
        .await?;

    let token = create_token(&state.jwt_secret, state.jwt_expires_hours, user.id, &user.username)
        .map_err(ApiError::Token)?;

    Ok(Json(LoginResponse { token, user }))
}

pub fn create_token(
    secret: &str,
    expires_hours: i64,
    user_id: Uuid,
    username: &str,
) -> jsonwebtoken::errors::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(expires_hours)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(secret: &str, token: &str) -> jsonwebtoken::errors::Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}
