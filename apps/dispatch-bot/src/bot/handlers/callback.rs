use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::bot::keyboards::{arrived_keyboard, finished_keyboard};
use crate::bot::messenger::{OutgoingMessage, Surface};
use crate::AppState;

/// Message a callback button was attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOrigin {
    pub chat_id: i64,
    pub message_id: i32,
    pub text: String,
}

pub async fn create_order_handler(state: &AppState, telegram_id: i64) -> Result<()> {
    let user = state
        .stores
        .users
        .user_get(telegram_id)
        .await
        .context("user_get")?;
    let order = state
        .stores
        .orders
        .order_create(user.id, user.telegram_id)
        .await
        .context("order_create")?;
    info!(order_id = order.id, user_id = %user.id, "Order created");

    state
        .messenger
        .send(
            Surface::Customer,
            user.telegram_id,
            OutgoingMessage::text("📍 Where should we pick you up? The driver will come to this address."),
        )
        .await
        .context("send pickup prompt")
}

/// A driver takes a broadcast order.
pub async fn claim_handler(
    state: &AppState,
    driver_id: i64,
    order_id: i64,
    origin: Option<&CallbackOrigin>,
) -> Result<()> {
    let order = state
        .stores
        .orders
        .order_get_by_id(order_id)
        .await
        .with_context(|| format!("order_get_by_id({})", order_id))?;

    match origin {
        Some(origin) => state
            .messenger
            .edit_text(
                Surface::Driver,
                origin.chat_id,
                origin.message_id,
                &format!("{}\nAlready taken ({})", origin.text, driver_id),
            )
            .await
            .context("mark broadcast as taken")?,
        None => warn!(order_id, "Claim without an accessible broadcast message"),
    }

    if let Some(chat) = order.customer_chat() {
        state
            .messenger
            .send(
                Surface::Customer,
                chat,
                OutgoingMessage::text("🚕 A driver has been found. They will contact you soon."),
            )
            .await
            .context("notify customer about driver")?;
    }

    state
        .messenger
        .send(
            Surface::Driver,
            driver_id,
            OutgoingMessage::text(order.to_private(state.order_code_prefix()))
                .with_markup(arrived_keyboard(order.id)),
        )
        .await
        .context("send order details to driver")?;
    info!(order_id, driver_id, "Order claimed");
    Ok(())
}

pub async fn arrived_handler(state: &AppState, driver_id: i64, order_id: i64) -> Result<()> {
    let order = state
        .stores
        .orders
        .order_get_by_id(order_id)
        .await
        .with_context(|| format!("order_get_by_id({})", order_id))?;

    if let Some(chat) = order.customer_chat() {
        state
            .messenger
            .send(
                Surface::Customer,
                chat,
                OutgoingMessage::text(format!(
                    "📍 The driver is waiting for you at: {}",
                    order.source.as_deref().unwrap_or("-")
                )),
            )
            .await
            .context("notify customer about arrival")?;
    }

    state
        .messenger
        .send(
            Surface::Driver,
            driver_id,
            OutgoingMessage::text("Ride in progress").with_markup(finished_keyboard(order.id)),
        )
        .await
        .context("send finish button to driver")?;
    info!(order_id, driver_id, "Driver arrived");
    Ok(())
}

pub async fn finished_handler(state: &AppState, driver_id: i64, order_id: i64) -> Result<()> {
    let order = state
        .stores
        .orders
        .order_get_by_id(order_id)
        .await
        .with_context(|| format!("order_get_by_id({})", order_id))?;

    if let Some(chat) = order.customer_chat() {
        let mut text = "🏁 Your ride is complete. Thank you for riding with us!".to_string();
        match state.pay_service.create_payment(order.id).await {
            Ok(url) => text.push_str(&format!("\n\n💳 Pay for the ride: {}", url)),
            Err(e) => error!(order_id, "Failed to create payment: {}", e),
        }
        state
            .messenger
            .send(Surface::Customer, chat, OutgoingMessage::text(text))
            .await
            .context("notify customer about completion")?;
    }

    state
        .messenger
        .send(
            Surface::Driver,
            driver_id,
            OutgoingMessage::text(format!(
                "Order {} is closed. Thank you!",
                order.code(state.order_code_prefix())
            )),
        )
        .await
        .context("send closure to driver")?;
    info!(order_id, driver_id, "Ride finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::messenger::Markup;
    use crate::testing::{harness, harness_with_failing_gateway, Harness, Sent, DRIVERS_CHAT};
    use dispatch_db::models::order::{OrderDraft, OrderField};
    use dispatch_db::{OrderStore, UserStore};

    const CUSTOMER: i64 = 42;
    const DRIVER: i64 = 777;

    async fn complete_order(h: &Harness) -> i64 {
        let user = h.store.user_get(CUSTOMER).await.unwrap();
        let order = h.store.order_create(user.id, CUSTOMER).await.unwrap();
        for (field, value) in [
            (OrderField::Source, "Lenina 1"),
            (OrderField::Time, "18:30"),
            (OrderField::Destination, "Airport"),
            (OrderField::Phone, "+79990001122"),
        ] {
            h.store.order_set_field(order.id, field, value).await.unwrap();
        }
        order.id
    }

    fn button_payload(message: &crate::bot::messenger::OutgoingMessage) -> String {
        match &message.markup {
            Some(Markup::Inline(rows)) => rows[0][0].payload.clone(),
            other => panic!("expected inline markup, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn create_order_starts_empty_order() {
        let h = harness();
        create_order_handler(&h.state, CUSTOMER).await.unwrap();

        let orders = h.store.orders().await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].telegram_id, Some(CUSTOMER));
        assert!(orders[0].source.is_none());

        let sent = h.messenger.messages_to(Surface::Customer, CUSTOMER).await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].text.contains("pick you up"));
    }

    #[tokio::test]
    async fn claim_marks_broadcast_and_briefs_driver() {
        let h = harness();
        let order_id = complete_order(&h).await;
        let origin = CallbackOrigin {
            chat_id: DRIVERS_CHAT,
            message_id: 55,
            text: "ID: MOSCOW-0001".into(),
        };

        claim_handler(&h.state, DRIVER, order_id, Some(&origin))
            .await
            .unwrap();

        let sent = h.messenger.sent().await;
        assert_eq!(
            sent[0],
            Sent::Edit {
                surface: Surface::Driver,
                chat_id: DRIVERS_CHAT,
                message_id: 55,
                text: "ID: MOSCOW-0001\nAlready taken (777)".into(),
            }
        );

        let customer = h.messenger.messages_to(Surface::Customer, CUSTOMER).await;
        assert_eq!(customer.len(), 1);
        assert!(customer[0].text.contains("driver has been found"));

        let driver = h.messenger.messages_to(Surface::Driver, DRIVER).await;
        assert_eq!(driver.len(), 1);
        assert!(driver[0].text.contains("Phone: +79990001122"));
        assert_eq!(button_payload(&driver[0]), format!("arrived:{}", order_id));
    }

    #[tokio::test]
    async fn claim_of_unknown_order_fails_without_messages() {
        let h = harness();
        assert!(claim_handler(&h.state, DRIVER, 99, None).await.is_err());
        assert!(h.messenger.sent().await.is_empty());
    }

    #[tokio::test]
    async fn arrival_sends_pickup_address() {
        let h = harness();
        let order_id = complete_order(&h).await;

        arrived_handler(&h.state, DRIVER, order_id).await.unwrap();

        let customer = h.messenger.messages_to(Surface::Customer, CUSTOMER).await;
        assert!(customer[0].text.ends_with("Lenina 1"));
        let driver = h.messenger.messages_to(Surface::Driver, DRIVER).await;
        assert_eq!(button_payload(&driver[0]), format!("finished:{}", order_id));
    }

    #[tokio::test]
    async fn finish_sends_payment_link() {
        let h = harness();
        let order_id = complete_order(&h).await;

        finished_handler(&h.state, DRIVER, order_id).await.unwrap();

        let payments = h.store.payments().await;
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].order_id, order_id);

        let customer = h.messenger.messages_to(Surface::Customer, CUSTOMER).await;
        assert_eq!(customer.len(), 1);
        assert!(customer[0].text.contains(&payments[0].confirmation_url));

        let driver = h.messenger.messages_to(Surface::Driver, DRIVER).await;
        assert!(driver[0].text.contains("MOSCOW-0001 is closed"));
    }

    #[tokio::test]
    async fn finish_without_gateway_still_closes_ride() {
        let h = harness_with_failing_gateway();
        let order_id = complete_order(&h).await;

        finished_handler(&h.state, DRIVER, order_id).await.unwrap();

        assert!(h.store.payments().await.is_empty());
        let customer = h.messenger.messages_to(Surface::Customer, CUSTOMER).await;
        assert_eq!(customer.len(), 1);
        assert!(!customer[0].text.contains("https://"));
    }

    #[tokio::test]
    async fn intake_orders_skip_customer_notices() {
        let h = harness();
        let order = h
            .store
            .order_create_from_intake(&OrderDraft {
                source: "Station".into(),
                destination: "Hotel".into(),
                time: "now".into(),
                phone: "+7000".into(),
            })
            .await
            .unwrap();

        claim_handler(&h.state, DRIVER, order.id, None).await.unwrap();
        arrived_handler(&h.state, DRIVER, order.id).await.unwrap();
        finished_handler(&h.state, DRIVER, order.id).await.unwrap();

        assert!(h
            .messenger
            .sent()
            .await
            .iter()
            .all(|s| matches!(s, Sent::Message { surface: Surface::Driver, .. })));
        assert!(h.store.payments().await.is_empty());
    }
}
