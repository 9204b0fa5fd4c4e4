//! Webhook registration with the Bot API, used by the admin tool.

use teloxide::{payloads::SetWebhookSetters, prelude::*};

use crate::{TeloxideTransport, TransportError};

/// What the Bot API reports about the bot and its webhook.
#[derive(Clone, Debug)]
pub struct BotStatus {
    pub id: u64,
    pub username: String,
    pub webhook_url: Option<String>,
    pub pending_updates: u32,
    pub last_error: Option<String>,
}

/// Points the bot's webhook at `url`. With a `secret`, Telegram sends it
/// back in the `X-Telegram-Bot-Api-Secret-Token` header of every delivery.
pub async fn register_webhook(
    transport: &TeloxideTransport,
    url: &str,
    secret: Option<&str>,
) -> Result<(), TransportError> {
    let url = reqwest::Url::parse(url).map_err(|err| TransportError::InvalidUrl(err.to_string()))?;
    let mut request = transport.bot().set_webhook(url.clone());
    if let Some(secret) = secret {
        request = request.secret_token(secret.to_string());
    }
    request.await?;
    tracing::info!("webhook set to {url}");
    Ok(())
}

pub async fn bot_status(transport: &TeloxideTransport) -> Result<BotStatus, TransportError> {
    let me = transport.bot().get_me().await?;
    let info = transport.bot().get_webhook_info().await?;
    Ok(BotStatus {
        id: me.id.0,
        username: me.username().to_string(),
        webhook_url: info.url.map(|url| url.to_string()),
        pending_updates: info.pending_update_count,
        last_error: info.last_error_message,
    })
}
