/*
 * Responsibility
 * - users テーブル向け SQLx 操作 (UserStore の Postgres 実装)
 * - PgPool を受け取り lookup / insert を提供
 * - 一意制約違反は RepoError::Conflict に変換
 */
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::repos::error::RepoError;
use crate::repos::store::{NewUser, UserRecord, UserStore};

#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, acquire_timeout: Duration) -> Result<Self, RepoError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        let row = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, password_hash, nickname, email, roles, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, RepoError> {
        let row = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (username, password_hash, nickname, email, roles)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, password_hash, nickname, email, roles, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.nickname.as_deref())
        .bind(user.email.as_deref())
        .bind(&user.roles)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }
}
