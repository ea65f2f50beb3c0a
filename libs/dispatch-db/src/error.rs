use thiserror::Error;

use crate::models::order::OrderField;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("order {order_id}: field `{field}` is already set or an earlier field is missing")]
    OutOfOrder { order_id: i64, field: OrderField },
    #[error("already exists: {0}")]
    Conflict(String),
    #[error("malformed row: {0}")]
    Decode(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
