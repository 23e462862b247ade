//! Bearer token → AuthCtx (request extensions)
//!
//! Fail-open: the filter never rejects. Whatever happens here, the request is
//! forwarded exactly once; the access layer (`access.rs`) decides whether a
//! request without `AuthCtx` may proceed.
//!
//! NoToken ──────────────────────────────┐
//! TokenPresent ─ parse ─┬─ Validated ─ load + re-check ─┬─ AuthCtx set ─┤→ next
//!                       └─ Rejected (logged) ───────────┴───────────────┘

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Request, header},
    middleware::Next,
    response::Response,
};

use crate::api::extractors::AuthCtx;
use crate::services::auth::AuthService;
use crate::services::auth::principal::PrincipalError;
use crate::services::auth::token_codec::TokenError;
use crate::state::AppState;

/// Path suffixes that skip token processing regardless of routing prefix.
pub const BYPASS_SUFFIXES: [&str; 2] = ["/login", "/register"];

#[derive(Debug)]
pub enum RejectReason {
    Token(TokenError),
    Principal(PrincipalError),
    /// Principal resolved but the token no longer validates.
    Revalidation,
}

#[derive(Debug)]
pub enum FilterOutcome {
    Bypassed,
    AlreadyAuthenticated,
    NoToken,
    Rejected(RejectReason),
    Authenticated(AuthCtx),
}

pub fn is_bypassed(method: &Method, path: &str) -> bool {
    *method == Method::OPTIONS || BYPASS_SUFFIXES.iter().any(|s| path.ends_with(s))
}

/// `Authorization: Bearer <token>` → `<token>`. Anything else counts as no token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Run the filter state machine for one request.
pub async fn authenticate(
    auth: &AuthService,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
    already_authenticated: bool,
) -> FilterOutcome {
    if is_bypassed(method, path) {
        return FilterOutcome::Bypassed;
    }
    if already_authenticated {
        return FilterOutcome::AlreadyAuthenticated;
    }

    let Some(token) = bearer_token(headers) else {
        return FilterOutcome::NoToken;
    };

    let username = match auth.codec().parse_subject(token) {
        Ok(username) => username,
        Err(err) => return FilterOutcome::Rejected(RejectReason::Token(err)),
    };

    let principal = match auth.load_principal(&username).await {
        Ok(principal) => principal,
        Err(err) => return FilterOutcome::Rejected(RejectReason::Principal(err)),
    };

    // The lookup may have taken a while; the token must still be good now.
    if !auth.codec().validate(token) {
        return FilterOutcome::Rejected(RejectReason::Revalidation);
    }

    FilterOutcome::Authenticated(AuthCtx::from(&principal))
}

pub async fn auth_filter(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let already = req.extensions().get::<AuthCtx>().is_some();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let outcome = authenticate(&state.auth, &method, &path, req.headers(), already).await;

    match outcome {
        FilterOutcome::Authenticated(ctx) => {
            tracing::debug!(username = %ctx.username, "principal established");
            state.stats.principal_established();
            // middleware → policy / extractor への受け渡し
            req.extensions_mut().insert(ctx);
        }
        FilterOutcome::Rejected(reason) => {
            tracing::warn!(
                %path,
                reason = ?reason,
                "bearer token rejected; continuing unauthenticated"
            );
            state.stats.token_rejected();
        }
        FilterOutcome::Bypassed | FilterOutcome::AlreadyAuthenticated | FilterOutcome::NoToken => {}
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use chrono::Utc;

    use crate::repos::memory::InMemoryUserStore;
    use crate::repos::store::{NewUser, UserStore};
    use crate::services::auth::principal::{Principal, PrincipalLoader, StorePrincipalLoader};
    use crate::services::auth::token_codec::TokenCodec;

    async fn service() -> AuthService {
        let store = Arc::new(InMemoryUserStore::new());
        store
            .create(NewUser {
                username: "alice".into(),
                password_hash: "unused".into(),
                nickname: None,
                email: None,
                roles: vec!["USER".into()],
            })
            .await
            .unwrap();

        AuthService::new(
            TokenCodec::new(b"test-secret-key-for-testing-only-0123", "test", 3600, 0),
            Arc::new(StorePrincipalLoader::new(store)),
            Duration::from_secs(1),
        )
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn bypass_is_a_suffix_match() {
        assert!(is_bypassed(&Method::POST, "/api/user/login"));
        assert!(is_bypassed(&Method::GET, "/login"));
        assert!(is_bypassed(&Method::POST, "/any/prefix/register"));
        assert!(is_bypassed(&Method::OPTIONS, "/api/user/me"));
        assert!(!is_bypassed(&Method::GET, "/api/user/login/x"));
        assert!(!is_bypassed(&Method::GET, "/api/user/me"));
    }

    #[test]
    fn only_bearer_scheme_yields_token() {
        assert_eq!(bearer_token(&bearer("abc")), Some("abc"));

        let mut basic = HeaderMap::new();
        basic.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&basic), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn valid_token_establishes_context() {
        let auth = service().await;
        let token = auth.codec().issue("alice").unwrap().token;

        let outcome =
            authenticate(&auth, &Method::GET, "/api/user/me", &bearer(&token), false).await;

        match outcome {
            FilterOutcome::Authenticated(ctx) => {
                assert_eq!(ctx.username, "alice");
                assert_eq!(ctx.user_id, 1);
                assert_eq!(ctx.roles, vec!["USER"]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn bypassed_paths_skip_token_processing() {
        let auth = service().await;
        let token = auth.codec().issue("alice").unwrap().token;

        let outcome =
            authenticate(&auth, &Method::POST, "/api/user/login", &bearer(&token), false).await;
        assert!(matches!(outcome, FilterOutcome::Bypassed));
    }

    #[tokio::test]
    async fn missing_header_is_no_token() {
        let auth = service().await;
        let outcome =
            authenticate(&auth, &Method::GET, "/api/user/me", &HeaderMap::new(), false).await;
        assert!(matches!(outcome, FilterOutcome::NoToken));
    }

    #[tokio::test]
    async fn expired_token_is_rejected_not_established() {
        let auth = service().await;
        let token = auth
            .codec()
            .issue_at("alice", Utc::now() - chrono::Duration::hours(3))
            .unwrap()
            .token;

        let outcome =
            authenticate(&auth, &Method::GET, "/api/user/me", &bearer(&token), false).await;
        assert!(matches!(
            outcome,
            FilterOutcome::Rejected(RejectReason::Token(TokenError::Expired))
        ));
    }

    #[tokio::test]
    async fn unknown_principal_is_rejected() {
        let auth = service().await;
        let token = auth.codec().issue("ghost").unwrap().token;

        let outcome =
            authenticate(&auth, &Method::GET, "/api/user/me", &bearer(&token), false).await;
        assert!(matches!(
            outcome,
            FilterOutcome::Rejected(RejectReason::Principal(PrincipalError::NotFound))
        ));
    }

    #[tokio::test]
    async fn existing_context_is_left_alone() {
        let auth = service().await;
        let outcome = authenticate(&auth, &Method::GET, "/api/user/me", &bearer("x"), true).await;
        assert!(matches!(outcome, FilterOutcome::AlreadyAuthenticated));
    }

    /// Resolves every user, but only after `delay`.
    struct SlowLoader {
        delay: Duration,
    }

    #[async_trait]
    impl PrincipalLoader for SlowLoader {
        async fn load(&self, username: &str) -> Result<Principal, PrincipalError> {
            tokio::time::sleep(self.delay).await;
            Ok(Principal {
                user_id: 1,
                username: username.to_string(),
                roles: vec!["USER".into()],
                password_hash: "unused".into(),
                nickname: None,
                email: None,
            })
        }
    }

    #[tokio::test]
    async fn token_expiring_during_lookup_is_rejected() {
        let auth = AuthService::new(
            TokenCodec::new(b"test-secret-key-for-testing-only-0123", "test", 1, 0),
            Arc::new(SlowLoader {
                delay: Duration::from_millis(2_100),
            }),
            Duration::from_secs(5),
        );
        let token = auth.codec().issue("alice").unwrap().token;

        let outcome =
            authenticate(&auth, &Method::GET, "/api/user/me", &bearer(&token), false).await;
        assert!(matches!(
            outcome,
            FilterOutcome::Rejected(RejectReason::Revalidation)
        ));
    }
}
