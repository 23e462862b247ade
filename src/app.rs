/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (auth filter / access policy / HTTP / CORS)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::handlers::fallback::not_found;
use crate::config::{BootstrapAdmin, Config};
use crate::middleware;
use crate::repos::{
    error::RepoError,
    memory::InMemoryUserStore,
    store::{NewUser, UserStore},
    user_repo::PgUserStore,
};
use crate::services::auth::{build_auth_service, password, policy::AccessPolicy};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,qa_user_service=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // In development, fail fast: crash the whole process so we notice immediately.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("failed to load configuration")?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting qa-user-service in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build process-level services and inject them into the shared application state.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let users: Arc<dyn UserStore> = match &config.database_url {
        Some(url) => Arc::new(
            PgUserStore::connect(url, config.principal_lookup_timeout)
                .await
                .context("failed to connect to the user database")?,
        ),
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory user store");
            Arc::new(InMemoryUserStore::new())
        }
    };

    if let Some(admin) = &config.bootstrap_admin {
        ensure_admin(users.as_ref(), admin).await?;
    }

    let auth = build_auth_service(config, users.clone());

    Ok(AppState::new(auth, users, AccessPolicy::standard()))
}

async fn ensure_admin(users: &dyn UserStore, admin: &BootstrapAdmin) -> Result<()> {
    if users.find_by_username(&admin.username).await?.is_some() {
        tracing::info!(username = %admin.username, "bootstrap admin already present");
        return Ok(());
    }

    let password_hash = password::hash_password(&admin.password)?;
    let created = users
        .create(NewUser {
            username: admin.username.clone(),
            password_hash,
            nickname: None,
            email: None,
            roles: vec!["ADMIN".to_string(), "USER".to_string()],
        })
        .await;

    match created {
        Ok(row) => {
            tracing::info!(username = %row.username, user_id = row.id, "bootstrap admin created");
            Ok(())
        }
        // Another instance won the race.
        Err(RepoError::Conflict) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Assemble the full router.
///
/// Layer order, outermost first: CORS → HTTP (request id, limits, timeout,
/// trace) → auth filter → access policy → handlers. The auth layers see the
/// full request path, so suffix rules work regardless of nesting.
pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .nest("/api/user", api::user_routes())
        .nest("/actuator", api::actuator_routes())
        .fallback(not_found);

    let router = middleware::auth::apply(router, state.clone()).with_state(state);
    let router = middleware::http::apply(router, config);
    middleware::cors::apply(router, config)
}
