use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod bot;
mod config;
mod intake;
pub mod models;
mod services;
mod state;
#[cfg(test)]
mod testing;

use crate::bot::messenger::{Surface, TelegramMessenger};
use crate::bot::router::Router;
use crate::config::BotConfig;
use crate::services::pay_service::PayService;
use crate::services::payment_poller::PaymentPoller;
use crate::services::store_service::StoreService;
use crate::state::AppState;

const DEFAULT_LOG_FILTER: &str = "dispatch_bot=info,dispatch_db=info,teloxide=warn,sqlx=warn";

fn init_tracing(log_path: Option<&str>) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let stdout = tracing_subscriber::fmt::layer().with_writer(io::stdout);

    match log_path {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file = path.file_name().unwrap_or(path.as_os_str());
            let file_appender = tracing_appender::rolling::never(dir, file);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stdout).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let config = BotConfig::load()?;
    let _guard = init_tracing(config.log_path.as_deref());

    std::panic::set_hook(Box::new(|info| {
        error!("CRITICAL BOT PANIC: {:?}", info);
    }));

    info!("Starting dispatch bot...");
    info!("Config loaded from {}", config.loaded_from);

    let pool = dispatch_db::db::init_db(&config.database_url).await?;
    let stores = StoreService::postgres(pool);

    let customer_bot = Bot::new(&config.customer_bot_token);
    let driver_bot = Bot::new(&config.driver_bot_token);
    bot::identity_check(&customer_bot, "Customer")
        .await
        .context("customer bot failed to connect to Telegram")?;
    bot::identity_check(&driver_bot, "Driver")
        .await
        .context("driver bot failed to connect to Telegram")?;

    let pay_service = PayService::new(
        reqwest::Client::new(),
        stores.payments.clone(),
        config.gateway.clone(),
    );

    let state = AppState {
        config: Arc::new(config),
        stores,
        pay_service: Arc::new(pay_service),
        messenger: Arc::new(TelegramMessenger::new(
            customer_bot.clone(),
            driver_bot.clone(),
        )),
    };

    let shutdown = CancellationToken::new();
    let mut tasks = Vec::new();

    tasks.push(tokio::spawn(bot::run_listener(
        customer_bot,
        Router::new(state.clone(), Surface::Customer),
        shutdown.clone(),
    )));
    tasks.push(tokio::spawn(bot::run_listener(
        driver_bot,
        Router::new(state.clone(), Surface::Driver),
        shutdown.clone(),
    )));

    let (poller, queue) = PaymentPoller::new(
        state.stores.payments.clone(),
        state.config.poll_interval(),
        shutdown.clone(),
    )
    .spawn();
    tasks.push(poller);
    tasks.push(tokio::spawn(bot::handlers::payment::check_payments(
        state.clone(),
        queue,
    )));

    if let Some(addr) = state.config.intake_listen_addr {
        let intake_state = state.clone();
        let intake_shutdown = shutdown.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = intake::serve(intake_state, addr, intake_shutdown.clone()).await {
                error!("Intake server failed: {:#}", e);
                intake_shutdown.cancel();
            }
        }));
    }

    tokio::select! {
        _ = shutdown_signal() => {}
        _ = shutdown.cancelled() => {}
    }
    info!("Shutting down...");
    shutdown.cancel();

    for task in tasks {
        if let Err(e) = task.await {
            error!("Task ended abnormally: {}", e);
        }
    }

    info!("Bot gracefully stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
