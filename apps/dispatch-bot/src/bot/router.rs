use anyhow::Result;
use tracing::debug;

use crate::bot::handlers::callback::{
    arrived_handler, claim_handler, create_order_handler, finished_handler, CallbackOrigin,
};
use crate::bot::handlers::command::{start_handler, Command};
use crate::bot::handlers::message::{contact_handler, text_handler};
use crate::bot::messenger::Surface;
use crate::models::callback::CallbackAction;
use crate::AppState;

/// Transport-neutral view of a Telegram update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Message {
        user_id: i64,
        chat_id: i64,
        text: Option<String>,
        contact_phone: Option<String>,
    },
    Callback {
        user_id: i64,
        data: String,
        origin: Option<CallbackOrigin>,
    },
}

#[derive(Clone)]
pub struct Router {
    state: AppState,
    surface: Surface,
}

impl Router {
    pub fn new(state: AppState, surface: Surface) -> Self {
        Self { state, surface }
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub async fn route(&self, inbound: Inbound) -> Result<()> {
        match inbound {
            Inbound::Message {
                user_id,
                chat_id,
                text,
                contact_phone,
            } => {
                if self.surface != Surface::Customer {
                    debug!(user_id, "Driver bot ignores messages");
                    return Ok(());
                }
                if let Some(phone) = contact_phone {
                    return contact_handler(&self.state, user_id, chat_id, &phone).await;
                }
                let Some(text) = text else {
                    debug!(user_id, "Ignoring message without text");
                    return Ok(());
                };
                match Command::parse(&text) {
                    Some(Command::Start) => start_handler(&self.state, user_id, chat_id).await,
                    None => text_handler(&self.state, user_id, chat_id, &text).await,
                }
            }
            Inbound::Callback {
                user_id,
                data,
                origin,
            } => {
                let action = CallbackAction::parse(&data)?;
                match (self.surface, action) {
                    (Surface::Customer, CallbackAction::CreateOrder) => {
                        create_order_handler(&self.state, user_id).await
                    }
                    (Surface::Driver, CallbackAction::Claim(order_id)) => {
                        claim_handler(&self.state, user_id, order_id, origin.as_ref()).await
                    }
                    (Surface::Driver, CallbackAction::Arrived(order_id)) => {
                        arrived_handler(&self.state, user_id, order_id).await
                    }
                    (Surface::Driver, CallbackAction::Finished(order_id)) => {
                        finished_handler(&self.state, user_id, order_id).await
                    }
                    (surface, action) => {
                        debug!(?surface, %action, "Callback not served on this bot");
                        Ok(())
                    }
                }
            }
        }
    }
}
