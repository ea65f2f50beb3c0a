use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::order::{Order, OrderDraft, OrderField};
use crate::models::payment::{Payment, PaymentStatus};
use crate::models::user::User;

pub mod memory;
pub mod order_repo;
pub mod payment_repo;
pub mod user_repo;

pub use memory::MemoryStore;
pub use order_repo::OrderRepository;
pub use payment_repo::PaymentRepository;
pub use user_repo::UserRepository;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Upserts on first contact, returns the existing row afterwards.
    async fn user_get(&self, telegram_id: i64) -> StoreResult<User>;
    async fn user_get_by_id(&self, user_id: Uuid) -> StoreResult<User>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn order_create(&self, user_id: Uuid, telegram_id: i64) -> StoreResult<Order>;
    async fn order_create_from_intake(&self, draft: &OrderDraft) -> StoreResult<Order>;
    /// Most recent order of the user.
    async fn order_get(&self, user_id: Uuid) -> StoreResult<Order>;
    async fn order_get_by_id(&self, order_id: i64) -> StoreResult<Order>;
    /// Sets `field` only when it is the next absent one.
    async fn order_set_field(
        &self,
        order_id: i64,
        field: OrderField,
        value: &str,
    ) -> StoreResult<Order>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn payment_create(&self, payment: &Payment) -> StoreResult<()>;
    async fn payment_set_status(&self, payment_id: Uuid, status: PaymentStatus) -> StoreResult<()>;
    async fn payment_get(&self, payment_id: Uuid) -> StoreResult<Payment>;
    async fn payments_for_check(&self) -> StoreResult<Vec<Payment>>;
}
