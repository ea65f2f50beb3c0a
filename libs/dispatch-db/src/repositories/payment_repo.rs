use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::PaymentStore;
use crate::error::{StoreError, StoreResult};
use crate::models::payment::{Payment, PaymentStatus};

#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_payment(row: &PgRow) -> StoreResult<Payment> {
        let status: String = row.try_get("status")?;
        Ok(Payment {
            id: row.try_get::<Uuid, _>("id")?,
            order_id: row.try_get::<i64, _>("order_id")?,
            status: status.parse::<PaymentStatus>().map_err(StoreError::Decode)?,
            confirmation_url: row.try_get::<String, _>("confirmation_url")?,
        })
    }
}

#[async_trait]
impl PaymentStore for PaymentRepository {
    async fn payment_create(&self, payment: &Payment) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, order_id, status, confirmation_url)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(payment.id)
        .bind(payment.order_id)
        .bind(payment.status.as_str())
        .bind(&payment.confirmation_url)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(format!("payment {}", payment.id))
            }
            e => StoreError::Database(e),
        })?;
        Ok(())
    }

    async fn payment_set_status(&self, payment_id: Uuid, status: PaymentStatus) -> StoreResult<()> {
        let result = sqlx::query("UPDATE payments SET status = $2 WHERE id = $1")
            .bind(payment_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() != 1 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn payment_get(&self, payment_id: Uuid) -> StoreResult<Payment> {
        let row = sqlx::query(
            "SELECT id, order_id, status, confirmation_url FROM payments WHERE id = $1",
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        Self::row_to_payment(&row)
    }

    async fn payments_for_check(&self) -> StoreResult<Vec<Payment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, status, confirmation_url
            FROM payments
            WHERE status = $1
            ORDER BY created_at
            "#,
        )
        .bind(PaymentStatus::Pending.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_payment).collect()
    }
}
