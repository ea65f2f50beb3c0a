use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::OrderStore;
use crate::error::{StoreError, StoreResult};
use crate::models::order::{Order, OrderDraft, OrderField};

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_order(row: &PgRow) -> StoreResult<Order> {
        Ok(Order {
            id: row.try_get::<i64, _>("id")?,
            user_id: row.try_get::<Option<Uuid>, _>("user_id")?,
            telegram_id: row.try_get::<Option<i64>, _>("telegram_id")?,
            source: row.try_get::<Option<String>, _>("source")?,
            time: row.try_get::<Option<String>, _>("time")?,
            destination: row.try_get::<Option<String>, _>("destination")?,
            phone: row.try_get::<Option<String>, _>("phone")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }

    // Each statement only matches when `field` is the next absent one.
    fn set_field_sql(field: OrderField) -> &'static str {
        match field {
            OrderField::Source => {
                r#"
                UPDATE orders SET source = $2
                WHERE id = $1 AND source IS NULL
                RETURNING id, user_id, telegram_id, source, time, destination, phone, created_at
                "#
            }
            OrderField::Time => {
                r#"
                UPDATE orders SET time = $2
                WHERE id = $1 AND source IS NOT NULL AND time IS NULL
                RETURNING id, user_id, telegram_id, source, time, destination, phone, created_at
                "#
            }
            OrderField::Destination => {
                r#"
                UPDATE orders SET destination = $2
                WHERE id = $1 AND time IS NOT NULL AND destination IS NULL
                RETURNING id, user_id, telegram_id, source, time, destination, phone, created_at
                "#
            }
            OrderField::Phone => {
                r#"
                UPDATE orders SET phone = $2
                WHERE id = $1 AND destination IS NOT NULL AND phone IS NULL
                RETURNING id, user_id, telegram_id, source, time, destination, phone, created_at
                "#
            }
        }
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn order_create(&self, user_id: Uuid, telegram_id: i64) -> StoreResult<Order> {
        let row = sqlx::query(
            r#"
            INSERT INTO orders (user_id, telegram_id) VALUES ($1, $2)
            RETURNING id, user_id, telegram_id, source, time, destination, phone, created_at
            "#,
        )
        .bind(user_id)
        .bind(telegram_id)
        .fetch_one(&self.pool)
        .await?;
        Self::row_to_order(&row)
    }

    async fn order_create_from_intake(&self, draft: &OrderDraft) -> StoreResult<Order> {
        let row = sqlx::query(
            r#"
            INSERT INTO orders (source, destination, time, phone) VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, telegram_id, source, time, destination, phone, created_at
            "#,
        )
        .bind(&draft.source)
        .bind(&draft.destination)
        .bind(&draft.time)
        .bind(&draft.phone)
        .fetch_one(&self.pool)
        .await?;
        Self::row_to_order(&row)
    }

    async fn order_get(&self, user_id: Uuid) -> StoreResult<Order> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, telegram_id, source, time, destination, phone, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        Self::row_to_order(&row)
    }

    async fn order_get_by_id(&self, order_id: i64) -> StoreResult<Order> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, telegram_id, source, time, destination, phone, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        Self::row_to_order(&row)
    }

    async fn order_set_field(
        &self,
        order_id: i64,
        field: OrderField,
        value: &str,
    ) -> StoreResult<Order> {
        let updated = sqlx::query(Self::set_field_sql(field))
            .bind(order_id)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = updated {
            return Self::row_to_order(&row);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE id = $1)")
            .bind(order_id)
            .fetch_one(&self.pool)
            .await?;
        if exists {
            Err(StoreError::OutOfOrder { order_id, field })
        } else {
            Err(StoreError::NotFound)
        }
    }
}
