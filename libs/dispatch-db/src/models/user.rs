use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Binding between a Telegram account and the internal identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub telegram_id: i64,
}
