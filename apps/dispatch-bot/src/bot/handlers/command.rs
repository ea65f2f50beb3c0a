use anyhow::{Context, Result};
use tracing::info;

use crate::bot::keyboards::create_order_keyboard;
use crate::bot::messenger::{OutgoingMessage, Surface};
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
}

impl Command {
    /// Recognises a leading `/name` token, with or without a `@botname` suffix.
    pub fn parse(text: &str) -> Option<Self> {
        let token = text.split_whitespace().next()?.strip_prefix('/')?;
        let name = token.split('@').next().unwrap_or(token);
        match name.to_lowercase().as_str() {
            "start" => Some(Command::Start),
            _ => None,
        }
    }
}

pub async fn start_handler(state: &AppState, telegram_id: i64, chat_id: i64) -> Result<()> {
    let user = state
        .stores
        .users
        .user_get(telegram_id)
        .await
        .context("user_get")?;
    info!(user_id = %user.id, "User executed /start");

    state
        .messenger
        .send(
            Surface::Customer,
            chat_id,
            OutgoingMessage::text("👋 Hello! We are happy to take your order.")
                .with_markup(create_order_keyboard()),
        )
        .await
        .context("send greeting")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start_variants() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/start ref123"), Some(Command::Start));
        assert_eq!(Command::parse("/start@DispatchBot"), Some(Command::Start));
        assert_eq!(Command::parse("/help"), None);
        assert_eq!(Command::parse("start"), None);
        assert_eq!(Command::parse(""), None);
    }
}
