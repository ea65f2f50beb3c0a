use anyhow::{Context, Result};
use dispatch_db::models::order::{Order, OrderField};
use tracing::{debug, info};

use crate::bot::keyboards::{claim_keyboard, contact_keyboard};
use crate::bot::messenger::{Markup, OutgoingMessage, Surface};
use crate::AppState;

const NO_ORDER: &str = "You have no order yet. Send /start to create one.";
const ASK_TIME: &str = "🕒 What time should the driver pick you up?";
const ASK_DESTINATION: &str = "🏁 Where are you going?";
const ASK_PHONE: &str = "📱 Please share your phone number so the driver can reach you.";
const SEARCHING: &str = "⏳ Your order is being processed, we will find you a driver shortly...";

/// Stores `text` into the next missing field of the user's most recent order
/// and prompts for the one after it.
pub async fn text_handler(
    state: &AppState,
    telegram_id: i64,
    chat_id: i64,
    text: &str,
) -> Result<()> {
    let user = state
        .stores
        .users
        .user_get(telegram_id)
        .await
        .context("user_get")?;

    let order = match state.stores.orders.order_get(user.id).await {
        Ok(order) => order,
        Err(e) if e.is_not_found() => {
            return state
                .messenger
                .send(Surface::Customer, chat_id, OutgoingMessage::text(NO_ORDER))
                .await
                .context("send no-order notice");
        }
        Err(e) => return Err(e).context("order_get"),
    };

    let Some(field) = order.fill_state().next_field() else {
        debug!(order_id = order.id, "Order already complete, ignoring text");
        return Ok(());
    };

    let order = state
        .stores
        .orders
        .order_set_field(order.id, field, text)
        .await
        .with_context(|| format!("order_set_field({})", field))?;
    debug!(order_id = order.id, %field, "Order field stored");

    let reply = match field {
        OrderField::Source => OutgoingMessage::text(ASK_TIME),
        OrderField::Time => OutgoingMessage::text(ASK_DESTINATION),
        OrderField::Destination => OutgoingMessage::text(ASK_PHONE).with_markup(contact_keyboard()),
        OrderField::Phone => {
            state
                .messenger
                .send(
                    Surface::Customer,
                    chat_id,
                    OutgoingMessage::text(SEARCHING).with_markup(Markup::RemoveKeyboard),
                )
                .await
                .context("send searching notice")?;
            return broadcast_order(state, &order).await;
        }
    };

    state
        .messenger
        .send(Surface::Customer, chat_id, reply)
        .await
        .context("send next prompt")
}

/// A shared contact only fills the phone. In any other state it is dropped so
/// the number never lands in an address field.
pub async fn contact_handler(
    state: &AppState,
    telegram_id: i64,
    chat_id: i64,
    phone: &str,
) -> Result<()> {
    let user = state
        .stores
        .users
        .user_get(telegram_id)
        .await
        .context("user_get")?;
    let awaiting_phone = match state.stores.orders.order_get(user.id).await {
        Ok(order) => order.fill_state().next_field() == Some(OrderField::Phone),
        Err(e) if e.is_not_found() => false,
        Err(e) => return Err(e).context("order_get"),
    };
    if !awaiting_phone {
        debug!(user_id = %user.id, "Contact shared outside the phone step, ignoring");
        return Ok(());
    }
    text_handler(state, telegram_id, chat_id, phone).await
}

/// Posts a completed order to the driver channel with a claim button.
pub async fn broadcast_order(state: &AppState, order: &Order) -> Result<()> {
    state
        .messenger
        .send(
            Surface::Driver,
            state.config.drivers_chat_id,
            OutgoingMessage::text(order.to_driver_chat(state.order_code_prefix()))
                .with_markup(claim_keyboard(order.id)),
        )
        .await
        .context("broadcast order to drivers")?;
    info!(order_id = order.id, "Order broadcast to drivers");
    Ok(())
}
