//! Outbound side of the chat platform.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::{
    payloads::SendMessageSetters,
    prelude::*,
    requests::Request,
    types::{ChatId, InlineKeyboardMarkup, MessageId, ParseMode},
};

use crate::TransportError;

/// What the bot needs from the chat platform. Text is HTML.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        html: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TransportError>;

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), TransportError>;
}

/// [`ChatTransport`] over the Telegram Bot API.
///
/// Every call is bounded by `timeout`, both at the HTTP client and around
/// the request future.
#[derive(Clone)]
pub struct TeloxideTransport {
    bot: teloxide::Bot,
    timeout: Duration,
}

impl TeloxideTransport {
    pub fn new(token: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            bot: teloxide::Bot::with_client(token, client),
            timeout,
        })
    }

    pub(crate) fn bot(&self) -> &teloxide::Bot {
        &self.bot
    }
}

#[async_trait]
impl ChatTransport for TeloxideTransport {
    async fn send_message(
        &self,
        chat_id: i64,
        html: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TransportError> {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), html)
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(keyboard);
        }

        tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))??;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), TransportError> {
        let request = self
            .bot
            .delete_message(ChatId(chat_id), MessageId(message_id));

        tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))??;
        Ok(())
    }
}
