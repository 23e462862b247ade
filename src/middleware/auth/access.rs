//! AccessPolicy の適用 (auth filter の内側で実行)
//!
//! AuthCtx の有無とロールだけを見て Allow / Deny を決める。
//! Deny は AppError (401 / 403) としてそのままクライアントへ返す。

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::policy::Decision;
use crate::state::AppState;

pub async fn enforce_access(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let decision = state.policy.authorize(
        req.uri().path(),
        req.method(),
        req.extensions().get::<AuthCtx>(),
    );

    match decision {
        Decision::Allow => Ok(next.run(req).await),
        Decision::Deny(reason) => {
            tracing::info!(
                method = %req.method(),
                path = %req.uri().path(),
                reason = ?reason,
                "request denied by access policy"
            );
            state.stats.request_denied();
            Err(reason.into())
        }
    }
}
