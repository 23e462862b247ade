/*
 * Responsibility
 * - UserStore の in-memory 実装 (DATABASE_URL 未設定の開発環境 / テスト用)
 */
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::repos::error::RepoError;
use crate::repos::store::{NewUser, UserRecord, UserStore};

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    by_username: HashMap<String, UserRecord>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.inner.read().await.by_username.get(username).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, RepoError> {
        let mut inner = self.inner.write().await;
        if inner.by_username.contains_key(&user.username) {
            return Err(RepoError::Conflict);
        }

        inner.next_id += 1;
        let record = UserRecord {
            id: inner.next_id,
            username: user.username,
            password_hash: user.password_hash,
            nickname: user.nickname,
            email: user.email,
            roles: user.roles,
            created_at: Utc::now(),
        };
        inner
            .by_username
            .insert(record.username.clone(), record.clone());

        Ok(record)
    }
}
