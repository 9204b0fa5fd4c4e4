use std::time::Duration;

use engine::EngineError;
use thiserror::Error;

/// Failures talking to the chat platform.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Request(#[from] teloxide::RequestError),
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// Failures while handling one delivery.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("bot is not configured: {0}")]
    Config(String),
}
