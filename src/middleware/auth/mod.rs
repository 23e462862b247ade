//! 認証 (filter) → 認可 (access policy) の 2 段構成
//!
//! 実行順は layer の積み方で決まる: 外側の filter が先に AuthCtx を作り、
//! 内側の access がそれを見て判定する。

pub mod access;
pub mod filter;

use axum::{Router, middleware};

use crate::state::AppState;

/// Apply the auth filter and the access policy to every route (and the fallback)
/// already registered on `router`.
///
/// 例：
/// ```ignore
/// let router = Router::new().nest("/api/user", api::user_routes());
/// let router = middleware::auth::apply(router, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            access::enforce_access,
        ))
        .layer(middleware::from_fn_with_state(state, filter::auth_filter))
}
