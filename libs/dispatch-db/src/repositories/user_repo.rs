use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::UserStore;
use crate::error::{StoreError, StoreResult};
use crate::models::user::User;

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &PgRow) -> StoreResult<User> {
        Ok(User {
            id: row.try_get::<Uuid, _>("id")?,
            telegram_id: row.try_get::<i64, _>("telegram_id")?,
        })
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn user_get(&self, telegram_id: i64) -> StoreResult<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (telegram_id) VALUES ($1)
            ON CONFLICT (telegram_id) DO UPDATE SET telegram_id = EXCLUDED.telegram_id
            RETURNING id, telegram_id
            "#,
        )
        .bind(telegram_id)
        .fetch_one(&self.pool)
        .await?;
        Self::row_to_user(&row)
    }

    async fn user_get_by_id(&self, user_id: Uuid) -> StoreResult<User> {
        let row = sqlx::query("SELECT id, telegram_id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;
        Self::row_to_user(&row)
    }
}
