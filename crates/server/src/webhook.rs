use axum::{body::Bytes, extract::State, http::StatusCode, response::Html};

use crate::server::ServerState;

/// Telegram delivery. Always acknowledged: the bot deals with its own
/// failures, and a non-2xx answer would only make Telegram resend it.
pub(crate) async fn receive(State(state): State<ServerState>, body: Bytes) -> StatusCode {
    state.bot.handle_delivery(&body).await;
    StatusCode::OK
}

pub(crate) async fn index() -> Html<&'static str> {
    Html("<html><body><p>Expense bot is running.</p></body></html>")
}
