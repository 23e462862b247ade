/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - auth: AuthService, users: UserStore, policy: AccessPolicy, stats など
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 * - リクエスト単位の認証情報は持たない (request extensions 側)
 */
use std::sync::Arc;
use std::time::Instant;

use crate::repos::store::UserStore;
use crate::services::auth::{AuthService, policy::AccessPolicy, stats::AuthStats};

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<dyn UserStore>,
    pub policy: Arc<AccessPolicy>,
    pub stats: Arc<AuthStats>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(auth: Arc<AuthService>, users: Arc<dyn UserStore>, policy: AccessPolicy) -> Self {
        Self {
            auth,
            users,
            policy: Arc::new(policy),
            stats: Arc::new(AuthStats::default()),
            started_at: Instant::now(),
        }
    }
}
