//! Principal = 認証済み主体 (username + roles + credential hash)
//!
//! `PrincipalLoader` はユーザーストアへの唯一の入口。auth 層はこの trait だけを見る。

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::repos::store::{UserRecord, UserStore};

#[derive(Debug, Error)]
pub enum PrincipalError {
    #[error("principal not found")]
    NotFound,
    #[error("principal store failure: {0}")]
    Store(String),
}

/// Resolved identity plus authorities, immutable for one request.
#[derive(Clone)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub roles: Vec<String>,
    pub password_hash: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the credential hash
        f.debug_struct("Principal")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

impl Principal {
    /// `ADMIN` and Spring-style `ROLE_ADMIN` grants both satisfy `has_role("ADMIN")`.
    pub fn has_role(&self, role: &str) -> bool {
        role_granted(&self.roles, role)
    }
}

impl From<UserRecord> for Principal {
    fn from(row: UserRecord) -> Self {
        Self {
            user_id: row.id,
            username: row.username,
            roles: row.roles,
            password_hash: row.password_hash,
            nickname: row.nickname,
            email: row.email,
        }
    }
}

pub(crate) fn role_granted(granted: &[String], role: &str) -> bool {
    granted.iter().any(|g| {
        g.eq_ignore_ascii_case(role)
            || (g.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("ROLE_"))
                && g[5..].eq_ignore_ascii_case(role))
    })
}

#[async_trait]
pub trait PrincipalLoader: Send + Sync {
    async fn load(&self, username: &str) -> Result<Principal, PrincipalError>;
}

/// Adapts any `UserStore` into a `PrincipalLoader`.
#[derive(Clone)]
pub struct StorePrincipalLoader {
    store: Arc<dyn UserStore>,
}

impl StorePrincipalLoader {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PrincipalLoader for StorePrincipalLoader {
    async fn load(&self, username: &str) -> Result<Principal, PrincipalError> {
        self.store
            .find_by_username(username)
            .await
            .map_err(|e| PrincipalError::Store(e.to_string()))?
            .map(Principal::from)
            .ok_or(PrincipalError::NotFound)
    }
}
