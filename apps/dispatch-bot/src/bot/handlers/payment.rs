use anyhow::{Context, Result};
use dispatch_db::models::payment::{Payment, PaymentStatus};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::bot::messenger::{OutgoingMessage, Surface};
use crate::AppState;

/// Drains the poller queue until it closes.
pub async fn check_payments(state: AppState, mut queue: mpsc::Receiver<Payment>) {
    info!("Payment checker started");
    while let Some(payment) = queue.recv().await {
        if let Err(e) = check_payment(&state, payment).await {
            error!("Payment check failed: {:#}", e);
        }
    }
    info!("Payment checker stopped");
}

#[instrument(skip_all, fields(payment_id = %payment.id, order_id = payment.order_id))]
pub async fn check_payment(state: &AppState, payment: Payment) -> Result<()> {
    // The poller may queue the same payment several times before it is checked.
    let stored = state
        .stores
        .payments
        .payment_get(payment.id)
        .await
        .context("payment_get")?;
    if stored.status != PaymentStatus::Pending {
        debug!(status = %stored.status, "Payment already settled, skipping");
        return Ok(());
    }

    let payment = state
        .pay_service
        .check_payment(payment)
        .await
        .context("check_payment")?;

    match payment.status {
        PaymentStatus::Succeeded => notify_paid(state, &payment).await,
        PaymentStatus::Pending => {
            debug!("Payment still pending");
            Ok(())
        }
        status => {
            info!(%status, "Payment left the pending state");
            Ok(())
        }
    }
}

async fn notify_paid(state: &AppState, payment: &Payment) -> Result<()> {
    let order = state
        .stores
        .orders
        .order_get_by_id(payment.order_id)
        .await
        .context("order_get_by_id")?;

    let Some(chat) = order.customer_chat() else {
        warn!("Paid order has no customer chat");
        return Ok(());
    };

    state
        .messenger
        .send(
            Surface::Customer,
            chat,
            OutgoingMessage::text(format!(
                "✅ Order {} has been paid. Thank you!",
                order.code(state.order_code_prefix())
            )),
        )
        .await
        .context("send payment confirmation")?;
    info!("Payment succeeded");
    Ok(())
}
