use std::time::Duration;

use teloxide::{
    dptree,
    prelude::*,
    types::{Update, UpdateKind},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::bot::handlers::callback::CallbackOrigin;
use crate::bot::router::{Inbound, Router};

pub mod handlers;
pub mod keyboards;
pub mod messenger;
pub mod router;

/// Checks the token against Telegram before anything is started.
pub async fn identity_check(bot: &Bot, name: &str) -> anyhow::Result<()> {
    let me = bot.get_me().await?;
    info!(
        "{} bot connected as: @{}",
        name,
        me.username.clone().unwrap_or_else(|| "unknown".into())
    );
    Ok(())
}

/// Long-polls one bot until `shutdown` fires. Updates are handled one at a
/// time, in arrival order.
pub async fn run_listener(bot: Bot, router: Router, shutdown: CancellationToken) {
    let surface = router.surface();
    info!(?surface, "Starting bot dispatcher...");

    let mut dispatcher = Dispatcher::builder(bot, dptree::entry().endpoint(handle_update))
        .dependencies(dptree::deps![router])
        .distribution_function(|_| Some(()))
        .build();

    let token = dispatcher.shutdown_token();
    let watcher = tokio::spawn(async move {
        shutdown.cancelled().await;
        // The dispatcher refuses to stop before it has started polling.
        loop {
            match token.shutdown() {
                Ok(stopped) => {
                    stopped.await;
                    break;
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }
    });

    dispatcher.dispatch().await;
    watcher.abort();
    info!(?surface, "Bot dispatcher stopped");
}

async fn handle_update(bot: Bot, update: Update, router: Router) -> ResponseResult<()> {
    if let UpdateKind::CallbackQuery(q) = &update.kind {
        // Stops the client-side spinner whether or not routing succeeds.
        if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
            warn!("Failed to answer callback query: {}", e);
        }
    }

    let Some(inbound) = inbound_from_update(&update) else {
        return Ok(());
    };
    if let Err(e) = router.route(inbound).await {
        error!(surface = ?router.surface(), "Update handling failed: {:#}", e);
    }
    Ok(())
}

pub fn inbound_from_update(update: &Update) -> Option<Inbound> {
    match &update.kind {
        UpdateKind::Message(msg) => {
            let user = msg.from.as_ref()?;
            Some(Inbound::Message {
                user_id: user.id.0 as i64,
                chat_id: msg.chat.id.0,
                text: msg.text().map(str::to_string),
                contact_phone: msg.contact().map(|c| c.phone_number.clone()),
            })
        }
        UpdateKind::CallbackQuery(q) => Some(Inbound::Callback {
            user_id: q.from.id.0 as i64,
            data: q.data.clone()?,
            origin: q.regular_message().map(|m| CallbackOrigin {
                chat_id: m.chat.id.0,
                message_id: m.id.0,
                text: m.text().unwrap_or_default().to_string(),
            }),
        }),
        _ => None,
    }
}
