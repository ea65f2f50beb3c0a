use std::sync::Arc;

use dispatch_db::repositories::{OrderRepository, PaymentRepository, UserRepository};
use dispatch_db::sqlx::PgPool;
use dispatch_db::{OrderStore, PaymentStore, UserStore};

/// Handles to the three stores. Nothing is cached here; every call goes to
/// the backing store.
#[derive(Clone)]
pub struct StoreService {
    pub users: Arc<dyn UserStore>,
    pub orders: Arc<dyn OrderStore>,
    pub payments: Arc<dyn PaymentStore>,
}

impl StoreService {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            orders: Arc::new(OrderRepository::new(pool.clone())),
            payments: Arc::new(PaymentRepository::new(pool)),
        }
    }

    #[cfg(test)]
    pub fn memory(store: dispatch_db::repositories::MemoryStore) -> Self {
        Self {
            users: Arc::new(store.clone()),
            orders: Arc::new(store.clone()),
            payments: Arc::new(store),
        }
    }
}
