/*
 * Responsibility
 * - Handler / policy から見える「認証済みコンテキスト」の型
 * - auth filter が検証して request extensions に格納する (リクエスト単位, 共有しない)
 */

use crate::services::auth::principal::Principal;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - credential hash は持たない (Principal から必要な情報だけ写す)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub user_id: i64,
    pub username: String,
    pub roles: Vec<String>,
}

impl AuthCtx {
    pub fn new(user_id: i64, username: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            roles,
        }
    }
}

impl From<&Principal> for AuthCtx {
    fn from(p: &Principal) -> Self {
        Self::new(p.user_id, p.username.clone(), p.roles.clone())
    }
}
