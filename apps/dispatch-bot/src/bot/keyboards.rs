use crate::bot::messenger::{InlineButton, Markup};
use crate::models::callback::CallbackAction;

fn single_button(text: &str, action: CallbackAction) -> Markup {
    Markup::Inline(vec![vec![InlineButton {
        text: text.to_string(),
        payload: action.to_payload(),
    }]])
}

pub fn create_order_keyboard() -> Markup {
    single_button("🚕 Create order", CallbackAction::CreateOrder)
}

pub fn claim_keyboard(order_id: i64) -> Markup {
    single_button("✅ Take order", CallbackAction::Claim(order_id))
}

pub fn arrived_keyboard(order_id: i64) -> Markup {
    single_button("📍 I have arrived", CallbackAction::Arrived(order_id))
}

pub fn finished_keyboard(order_id: i64) -> Markup {
    single_button("🏁 Finish ride", CallbackAction::Finished(order_id))
}

pub fn contact_keyboard() -> Markup {
    Markup::RequestContact("📱 Share phone number".to_string())
}
