use std::sync::Arc;

use crate::bot::messenger::Messenger;
use crate::config::BotConfig;
use crate::services::pay_service::PaymentProcessor;
use crate::services::store_service::StoreService;

/// Dependencies handed to every task at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BotConfig>,
    pub stores: StoreService,
    pub pay_service: Arc<dyn PaymentProcessor>,
    pub messenger: Arc<dyn Messenger>,
}

impl AppState {
    pub fn order_code_prefix(&self) -> &str {
        &self.config.order_code_prefix
    }
}
