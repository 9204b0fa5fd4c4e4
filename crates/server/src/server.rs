use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
};

use std::sync::Arc;

use crate::webhook;
use telegram_bot::ExpenseBot;

static SECRET_HEADER: axum::http::HeaderName =
    axum::http::HeaderName::from_static("x-telegram-bot-api-secret-token");

/// Where and how the webhook is served.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Path of the webhook route.
    pub path: String,
    /// Expected value of the secret token header. Requests are not checked
    /// when unset.
    pub secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            path: "/webhook".to_string(),
            secret: None,
        }
    }
}

#[derive(Clone)]
pub(crate) struct ServerState {
    pub bot: Arc<ExpenseBot>,
    pub secret: Option<Arc<str>>,
}

/// `TypedHeader` for the secret Telegram echoes back on every delivery.
#[derive(Debug)]
struct SecretHeader(String);

impl Header for SecretHeader {
    fn name() -> &'static axum::http::HeaderName {
        &SECRET_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };

        Ok(SecretHeader(value.to_string()))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        match axum::http::HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode secret token header"),
        }
    }
}

async fn verify_secret(
    secret_header: Option<TypedHeader<SecretHeader>>,
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(expected) = &state.secret {
        let matches = secret_header.is_some_and(|TypedHeader(SecretHeader(got))| {
            got.as_str() == &**expected
        });
        if !matches {
            tracing::warn!("rejected delivery with a missing or wrong secret token");
            return Err(StatusCode::UNAUTHORIZED);
        }
    }

    Ok(next.run(request).await)
}

pub fn router(bot: Arc<ExpenseBot>, config: &ServerConfig) -> Router {
    let state = ServerState {
        bot,
        secret: config.secret.as_deref().map(Arc::from),
    };

    Router::new()
        .route(&config.path, post(webhook::receive))
        .route_layer(middleware::from_fn_with_state(state.clone(), verify_secret))
        .route("/", get(webhook::index))
        .with_state(state)
}

pub async fn run(bot: ExpenseBot, config: ServerConfig) {
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(bot, config, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    bot: ExpenseBot,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}{}", addr, config.path);

    axum::serve(listener, router(Arc::new(bot), &config)).await
}

pub fn spawn_with_listener(
    bot: ExpenseBot,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(bot, config, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
