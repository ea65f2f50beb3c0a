//! In-process store with the same semantics as the PostgreSQL repositories.
//!
//! Used by the test suites of this workspace.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{OrderStore, PaymentStore, UserStore};
use crate::error::{StoreError, StoreResult};
use crate::models::order::{Order, OrderDraft, OrderField};
use crate::models::payment::{Payment, PaymentStatus};
use crate::models::user::User;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    orders: BTreeMap<i64, Order>,
    payments: Vec<Payment>,
    next_order_id: i64,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.tables.lock().await.orders.values().cloned().collect()
    }

    pub async fn payments(&self) -> Vec<Payment> {
        self.tables.lock().await.payments.clone()
    }
}

impl Tables {
    fn insert_order(&mut self, order: impl FnOnce(i64) -> Order) -> Order {
        self.next_order_id += 1;
        let order = order(self.next_order_id);
        self.orders.insert(order.id, order.clone());
        order
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn user_get(&self, telegram_id: i64) -> StoreResult<User> {
        let mut tables = self.tables.lock().await;
        if let Some(user) = tables.users.iter().find(|u| u.telegram_id == telegram_id) {
            return Ok(user.clone());
        }
        let user = User {
            id: Uuid::new_v4(),
            telegram_id,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn user_get_by_id(&self, user_id: Uuid) -> StoreResult<User> {
        let tables = self.tables.lock().await;
        tables
            .users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn order_create(&self, user_id: Uuid, telegram_id: i64) -> StoreResult<Order> {
        let mut tables = self.tables.lock().await;
        Ok(tables.insert_order(|id| Order {
            id,
            user_id: Some(user_id),
            telegram_id: Some(telegram_id),
            source: None,
            time: None,
            destination: None,
            phone: None,
            created_at: Utc::now(),
        }))
    }

    async fn order_create_from_intake(&self, draft: &OrderDraft) -> StoreResult<Order> {
        let mut tables = self.tables.lock().await;
        Ok(tables.insert_order(|id| Order {
            id,
            user_id: None,
            telegram_id: None,
            source: Some(draft.source.clone()),
            time: Some(draft.time.clone()),
            destination: Some(draft.destination.clone()),
            phone: Some(draft.phone.clone()),
            created_at: Utc::now(),
        }))
    }

    async fn order_get(&self, user_id: Uuid) -> StoreResult<Order> {
        let tables = self.tables.lock().await;
        tables
            .orders
            .values()
            .filter(|o| o.user_id == Some(user_id))
            .max_by_key(|o| (o.created_at, o.id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn order_get_by_id(&self, order_id: i64) -> StoreResult<Order> {
        let tables = self.tables.lock().await;
        tables
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn order_set_field(
        &self,
        order_id: i64,
        field: OrderField,
        value: &str,
    ) -> StoreResult<Order> {
        let mut tables = self.tables.lock().await;
        let order = tables
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::NotFound)?;

        if order.fill_state().next_field() != Some(field) {
            return Err(StoreError::OutOfOrder { order_id, field });
        }
        let slot = match field {
            OrderField::Source => &mut order.source,
            OrderField::Time => &mut order.time,
            OrderField::Destination => &mut order.destination,
            OrderField::Phone => &mut order.phone,
        };
        *slot = Some(value.to_string());
        Ok(order.clone())
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn payment_create(&self, payment: &Payment) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        if tables.payments.iter().any(|p| p.id == payment.id) {
            return Err(StoreError::Conflict(format!("payment {}", payment.id)));
        }
        tables.payments.push(payment.clone());
        Ok(())
    }

    async fn payment_set_status(&self, payment_id: Uuid, status: PaymentStatus) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        let payment = tables
            .payments
            .iter_mut()
            .find(|p| p.id == payment_id)
            .ok_or(StoreError::NotFound)?;
        payment.status = status;
        Ok(())
    }

    async fn payment_get(&self, payment_id: Uuid) -> StoreResult<Payment> {
        let tables = self.tables.lock().await;
        tables
            .payments
            .iter()
            .find(|p| p.id == payment_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn payments_for_check(&self) -> StoreResult<Vec<Payment>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Pending)
            .cloned()
            .collect())
    }
}
