/*
 * Responsibility
 * - URL 構造を定義 (/api/user/..., /actuator/...)
 * - 認証/認可は app.rs で router 全体に layer として掛ける (ここでは掛けない)
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::handlers::{
    actuator::{health, info, metrics},
    users::{login, me, register},
};
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/me", get(me))
}

pub fn actuator_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .route("/metrics", get(metrics))
}
