//! Telegram side of the expense bot.
//!
//! [`ExpenseBot::handle_delivery`] takes one raw webhook body and runs it to
//! completion: classify, log, authorize, move the conversation, reply.

use std::{sync::Arc, time::Duration};

use chrono::NaiveDate;
use chrono_tz::Tz;
use engine::{
    COMMIT_WINDOW, ConvContext, Effect, Engine, Event, EventLog, ExpenseBook, INFERENCE_WINDOW,
    LegacyStep, Mode, TransitionResult, UserDirectory, assemble, legacy_step, transition,
};

pub use error::{BotError, TransportError};
pub use transport::{ChatTransport, TeloxideTransport};
pub use webhook::{BotStatus, bot_status, register_webhook};

mod error;
mod handlers;
mod state;
mod transport;
mod ui;
mod webhook;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Deployment settings the bot needs at runtime.
#[derive(Clone, Debug)]
pub struct BotConfig {
    /// Chat that receives error dumps. Errors are only logged without it.
    pub admin_chat_id: Option<i64>,
    pub mode: Mode,
    pub timezone: Tz,
    /// Symbol printed before amounts.
    pub currency: String,
    /// `strftime` pattern for dates shown to users.
    pub date_format: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            admin_chat_id: None,
            mode: Mode::Explicit,
            timezone: chrono_tz::Europe::Rome,
            currency: "€".to_string(),
            date_format: "%d/%m/%Y".to_string(),
        }
    }
}

impl BotConfig {
    pub(crate) fn format_date(&self, date: NaiveDate) -> String {
        date.format(&self.date_format).to_string()
    }

    fn context(&self) -> ConvContext {
        ConvContext {
            timezone: self.timezone,
        }
    }
}

#[derive(Clone)]
pub struct ExpenseBot {
    config: BotConfig,
    log: Arc<dyn EventLog>,
    book: Arc<dyn ExpenseBook>,
    users: Arc<dyn UserDirectory>,
    transport: Arc<dyn ChatTransport>,
    conversations: state::ConversationStore,
    locks: state::ChatLocks,
}

impl ExpenseBot {
    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Handles one webhook body. Never fails: errors end up in the admin
    /// chat or, failing that, in the logs.
    pub async fn handle_delivery(&self, body: &[u8]) {
        let event = match engine::parse_delivery(body) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!("{err}");
                self.notify_admin(&String::from_utf8_lossy(body)).await;
                return;
            }
        };

        let chat_id = event.sender();
        let _turn = self.locks.acquire(chat_id).await;
        if let Err(err) = self.process(chat_id, &event).await {
            tracing::error!("delivery for chat {chat_id} failed: {err}");
            self.notify_admin(&format!("chat {chat_id}: {err}")).await;
        }
    }

    async fn process(&self, chat_id: i64, event: &Event) -> Result<(), BotError> {
        self.log.append(chat_id, event).await?;

        if !self.users.is_authorized(event.sender()).await? {
            tracing::warn!("unauthorized sender {}", event.sender());
            // Strangers must not grow the log.
            self.log.clear(chat_id).await?;
            self.transport
                .send_message(chat_id, ui::NOT_AUTHORIZED, None)
                .await?;
            return Ok(());
        }

        if let Event::ButtonCallback {
            source_message_id: Some(message_id),
            ..
        } = event
            && let Err(err) = self.transport.delete_message(chat_id, *message_id).await
        {
            tracing::warn!("could not delete message {message_id} in chat {chat_id}: {err}");
        }

        match self.config.mode {
            Mode::Explicit => self.step_explicit(chat_id, event).await,
            Mode::Legacy => self.step_legacy(chat_id, event).await,
        }
    }

    async fn step_explicit(&self, chat_id: i64, event: &Event) -> Result<(), BotError> {
        let state = self.conversations.get(chat_id).await;
        let TransitionResult { new_state, effects } =
            transition(&state, event, &self.config.context());
        tracing::debug!(
            "chat {chat_id}: {} -> {}",
            state.name(),
            new_state.name()
        );
        self.conversations.set(chat_id, new_state).await;

        if let Some(committed) = self.run_effects(chat_id, &effects).await? {
            let state = self
                .conversations
                .update(chat_id, |state| state.after_commit(committed))
                .await;
            tracing::debug!("chat {chat_id}: commit done, now {}", state.name());
        }
        Ok(())
    }

    async fn step_legacy(&self, chat_id: i64, event: &Event) -> Result<(), BotError> {
        let ctx = self.config.context();
        let window = self.log.tail(chat_id, INFERENCE_WINDOW).await?;
        tracing::debug!("chat {chat_id}: legacy step on {:?}", event);

        match legacy_step(&window, &ctx) {
            LegacyStep::Effects(effects) => {
                self.run_effects(chat_id, &effects).await?;
            }
            LegacyStep::Commit => {
                let record = match self.log.tail_exact(chat_id, COMMIT_WINDOW).await {
                    Ok(window) => assemble(&window, &ctx),
                    Err(err) => Err(err),
                };
                match record {
                    Ok(record) => {
                        self.run_effects(chat_id, &[Effect::Commit(record)]).await?;
                    }
                    Err(err) => {
                        tracing::warn!("chat {chat_id}: cannot assemble expense: {err}");
                        self.transport
                            .send_message(chat_id, &ui::render_error(&err.to_string()), None)
                            .await?;
                    }
                }
            }
        }
        Ok(())
    }

    async fn notify_admin(&self, detail: &str) {
        let Some(admin) = self.config.admin_chat_id else {
            return;
        };
        if let Err(err) = self
            .transport
            .send_message(admin, &ui::render_admin_dump(detail), None)
            .await
        {
            tracing::error!("could not reach admin chat: {err}");
        }
    }
}

#[derive(Default)]
pub struct BotBuilder {
    config: BotConfig,
    log: Option<Arc<dyn EventLog>>,
    book: Option<Arc<dyn ExpenseBook>>,
    users: Option<Arc<dyn UserDirectory>>,
    transport: Option<Arc<dyn ChatTransport>>,
}

impl BotBuilder {
    pub fn config(mut self, config: BotConfig) -> BotBuilder {
        self.config = config;
        self
    }

    /// Uses `engine` for the event log, the expenses and the allow-list.
    pub fn engine(mut self, engine: Engine) -> BotBuilder {
        let engine = Arc::new(engine);
        self.log = Some(engine.clone());
        self.book = Some(engine.clone());
        self.users = Some(engine);
        self
    }

    pub fn event_log(mut self, log: Arc<dyn EventLog>) -> BotBuilder {
        self.log = Some(log);
        self
    }

    pub fn expense_book(mut self, book: Arc<dyn ExpenseBook>) -> BotBuilder {
        self.book = Some(book);
        self
    }

    pub fn user_directory(mut self, users: Arc<dyn UserDirectory>) -> BotBuilder {
        self.users = Some(users);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn ChatTransport>) -> BotBuilder {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<ExpenseBot, BotError> {
        tracing::info!("Initializing telegram bot ({:?} mode)...", self.config.mode);
        let missing = |what: &str| BotError::Config(format!("missing {what}"));
        Ok(ExpenseBot {
            log: self.log.ok_or_else(|| missing("event log"))?,
            book: self.book.ok_or_else(|| missing("expense book"))?,
            users: self.users.ok_or_else(|| missing("user directory"))?,
            transport: self.transport.ok_or_else(|| missing("transport"))?,
            config: self.config,
            conversations: state::ConversationStore::default(),
            locks: state::ChatLocks::default(),
        })
    }
}
