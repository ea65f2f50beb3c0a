use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use dispatch_db::models::payment::{Payment, PaymentStatus};
use dispatch_db::repositories::MemoryStore;
use dispatch_db::PaymentStore;
use tokio::sync::Mutex;

use crate::bot::messenger::{Messenger, OutgoingMessage, Surface};
use crate::config::BotConfig;
use crate::services::pay_service::{GatewayError, PaymentProcessor};
use crate::services::store_service::StoreService;
use crate::AppState;

pub const DRIVERS_CHAT: i64 = -1001520856813;
pub const APPLICATIONS_CHAT: i64 = -1001735047005;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Message {
        surface: Surface,
        chat_id: i64,
        message: OutgoingMessage,
    },
    Edit {
        surface: Surface,
        chat_id: i64,
        message_id: i32,
        text: String,
    },
}

#[derive(Clone, Default)]
pub struct RecordingMessenger {
    sent: Arc<Mutex<Vec<Sent>>>,
}

impl RecordingMessenger {
    pub async fn sent(&self) -> Vec<Sent> {
        self.sent.lock().await.clone()
    }

    pub async fn messages_to(&self, surface: Surface, chat_id: i64) -> Vec<OutgoingMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                Sent::Message {
                    surface: to,
                    chat_id: chat,
                    message,
                } if *to == surface && *chat == chat_id => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, surface: Surface, chat_id: i64, message: OutgoingMessage) -> Result<()> {
        self.sent.lock().await.push(Sent::Message {
            surface,
            chat_id,
            message,
        });
        Ok(())
    }

    async fn edit_text(
        &self,
        surface: Surface,
        chat_id: i64,
        message_id: i32,
        text: &str,
    ) -> Result<()> {
        self.sent.lock().await.push(Sent::Edit {
            surface,
            chat_id,
            message_id,
            text: text.to_string(),
        });
        Ok(())
    }
}

/// Stands in for the gateway. Created payments are written to the same
/// memory store the handlers use.
#[derive(Clone)]
pub struct FakeProcessor {
    store: MemoryStore,
    fail_create: bool,
    remote: Arc<Mutex<HashMap<uuid::Uuid, PaymentStatus>>>,
}

impl FakeProcessor {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            fail_create: false,
            remote: Arc::default(),
        }
    }

    pub fn failing(store: MemoryStore) -> Self {
        Self {
            fail_create: true,
            ..Self::new(store)
        }
    }

    pub async fn set_remote_status(&self, id: uuid::Uuid, status: PaymentStatus) {
        self.remote.lock().await.insert(id, status);
    }
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    async fn create_payment(&self, order_id: i64) -> Result<String, GatewayError> {
        if self.fail_create {
            return Err(GatewayError::UnexpectedStatus {
                status: 401,
                body: "invalid_credentials".into(),
            });
        }
        let payment = Payment {
            id: uuid::Uuid::new_v4(),
            order_id,
            status: PaymentStatus::Pending,
            confirmation_url: format!("https://pay.example/confirm/{}", order_id),
        };
        self.store.payment_create(&payment).await?;
        Ok(payment.confirmation_url)
    }

    async fn check_payment(&self, mut payment: Payment) -> Result<Payment, GatewayError> {
        let status = self
            .remote
            .lock()
            .await
            .get(&payment.id)
            .copied()
            .unwrap_or(payment.status);
        self.store.payment_set_status(payment.id, status).await?;
        payment.status = status;
        Ok(payment)
    }
}

pub fn test_config() -> BotConfig {
    let vars: HashMap<&str, String> = HashMap::from([
        ("CUSTOMER_BOT_TOKEN", "customer:token".to_string()),
        ("DRIVER_BOT_TOKEN", "driver:token".to_string()),
        ("DATABASE_URL", "postgres://localhost/dispatch".to_string()),
        ("DRIVERS_CHAT_ID", DRIVERS_CHAT.to_string()),
        ("DRIVER_APPLICATIONS_CHAT_ID", APPLICATIONS_CHAT.to_string()),
        ("GATEWAY_SHOP_ID", "974352".to_string()),
        ("GATEWAY_SECRET_KEY", "test_secret".to_string()),
    ]);
    BotConfig::from_lookup(|k| vars.get(k).cloned()).unwrap()
}

pub struct Harness {
    pub state: AppState,
    pub store: MemoryStore,
    pub messenger: RecordingMessenger,
    pub processor: FakeProcessor,
}

pub fn harness() -> Harness {
    let store = MemoryStore::new();
    build(store.clone(), FakeProcessor::new(store))
}

pub fn harness_with_failing_gateway() -> Harness {
    let store = MemoryStore::new();
    build(store.clone(), FakeProcessor::failing(store))
}

fn build(store: MemoryStore, processor: FakeProcessor) -> Harness {
    let messenger = RecordingMessenger::default();
    let state = AppState {
        config: Arc::new(test_config()),
        stores: StoreService::memory(store.clone()),
        pay_service: Arc::new(processor.clone()),
        messenger: Arc::new(messenger.clone()),
    };
    Harness {
        state,
        store,
        messenger,
        processor,
    }
}
