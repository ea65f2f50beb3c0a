use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
    KeyboardRemove, MessageId, ReplyMarkup,
};

/// Which of the two bots a message travels through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    Customer,
    Driver,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    Inline(Vec<Vec<InlineButton>>),
    /// Reply keyboard with a single "share my contact" button.
    RequestContact(String),
    RemoveKeyboard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: String,
    pub markup: Option<Markup>,
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: None,
        }
    }

    pub fn with_markup(mut self, markup: Markup) -> Self {
        self.markup = Some(markup);
        self
    }
}

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, surface: Surface, chat_id: i64, message: OutgoingMessage) -> Result<()>;

    async fn edit_text(
        &self,
        surface: Surface,
        chat_id: i64,
        message_id: i32,
        text: &str,
    ) -> Result<()>;
}

#[derive(Clone)]
pub struct TelegramMessenger {
    customer: Bot,
    driver: Bot,
}

impl TelegramMessenger {
    pub fn new(customer: Bot, driver: Bot) -> Self {
        Self { customer, driver }
    }

    fn bot(&self, surface: Surface) -> &Bot {
        match surface {
            Surface::Customer => &self.customer,
            Surface::Driver => &self.driver,
        }
    }
}

fn to_reply_markup(markup: Markup) -> ReplyMarkup {
    match markup {
        Markup::Inline(rows) => ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(
            rows.into_iter().map(|row| {
                row.into_iter()
                    .map(|b| InlineKeyboardButton::callback(b.text, b.payload))
                    .collect::<Vec<_>>()
            }),
        )),
        Markup::RequestContact(label) => ReplyMarkup::Keyboard(
            KeyboardMarkup::new(vec![vec![
                KeyboardButton::new(label).request(ButtonRequest::Contact),
            ]])
            .resize_keyboard(),
        ),
        Markup::RemoveKeyboard => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(&self, surface: Surface, chat_id: i64, message: OutgoingMessage) -> Result<()> {
        let request = self.bot(surface).send_message(ChatId(chat_id), message.text);
        match message.markup {
            Some(markup) => request.reply_markup(to_reply_markup(markup)).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn edit_text(
        &self,
        surface: Surface,
        chat_id: i64,
        message_id: i32,
        text: &str,
    ) -> Result<()> {
        self.bot(surface)
            .edit_message_text(ChatId(chat_id), MessageId(message_id), text)
            .await?;
        Ok(())
    }
}
