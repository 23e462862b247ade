/*
 * Responsibility
 * - /api/user/login: password 検証 → token 発行
 * - /api/user/register: validation → hash → store
 * - /api/user/me: AuthCtx をそのまま返す (認証済みのみ)
 */
use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;

use crate::api::dto::users::{
    LoginRequest, LoginResponse, MeResponse, RegisterRequest, UserResponse,
};
use crate::api::extractors::AuthCtxExtractor;
use crate::error::AppError;
use crate::repos::store::NewUser;
use crate::services::auth::password;
use crate::state::AppState;

pub const DEFAULT_ROLE: &str = "USER";

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let username = req.username.trim();

    // Unknown user and wrong password look identical to the caller.
    let principal = match state.auth.load_principal(username).await {
        Ok(principal) => principal,
        Err(_) => {
            let err = password::verify_unknown_user(&req.password);
            tracing::info!(username, error = %err, "login failed: unknown user");
            state.stats.login_failed();
            return Err(AppError::Unauthorized);
        }
    };

    if let Err(err) = password::verify_password(&req.password, &principal.password_hash) {
        tracing::info!(username, error = %err, "login failed");
        state.stats.login_failed();
        return Err(AppError::Unauthorized);
    }

    let issued = state
        .auth
        .codec()
        .issue(&principal.username)
        .map_err(|_| AppError::Internal)?;

    tracing::info!(username, user_id = principal.user_id, "login succeeded");
    state.stats.login_succeeded();

    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: "Bearer",
        expires_in: state.auth.codec().ttl_seconds(),
        user_id: principal.user_id,
        username: principal.username,
        nickname: principal.nickname,
        email: principal.email,
        login_time: Utc::now(),
    }))
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    req.validate().map_err(AppError::invalid_request)?;

    let password_hash = password::hash_password(&req.password).map_err(|e| {
        tracing::error!(error = %e, "password hashing failed");
        AppError::Internal
    })?;

    let row = state
        .users
        .create(NewUser {
            username: req.username.trim().to_string(),
            password_hash,
            nickname: req.nickname,
            email: req.email,
            roles: vec![DEFAULT_ROLE.to_string()],
        })
        .await?;

    tracing::info!(username = %row.username, user_id = row.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            user_id: row.id,
            username: row.username,
            nickname: row.nickname,
            email: row.email,
            roles: row.roles,
            created_at: row.created_at,
        }),
    ))
}

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: ctx.user_id,
        username: ctx.username,
        roles: ctx.roles,
    })
}
