//! Executes the effects produced by the conversation engines.

use chrono::{Datelike, Utc};
use engine::{Effect, ExpenseRecord, Month, category_names};
use teloxide::types::InlineKeyboardMarkup;

use crate::{BotError, ExpenseBot, ui};

const RECENT_LIMIT: u64 = 5;

impl ExpenseBot {
    async fn send(
        &self,
        chat_id: i64,
        (text, keyboard): (String, InlineKeyboardMarkup),
    ) -> Result<(), BotError> {
        self.transport
            .send_message(chat_id, &text, Some(keyboard))
            .await?;
        Ok(())
    }

    async fn say(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        self.transport.send_message(chat_id, text, None).await?;
        Ok(())
    }

    /// Runs `effects` in order. Returns the outcome of the commit, if one
    /// was requested.
    pub(crate) async fn run_effects(
        &self,
        chat_id: i64,
        effects: &[Effect],
    ) -> Result<Option<bool>, BotError> {
        let mut committed = None;
        for effect in effects {
            match effect {
                Effect::ShowMainMenu => self.send(chat_id, ui::render_main_menu()).await?,
                Effect::ShowTotals => self.show_totals(chat_id).await?,
                Effect::ShowLastExpenses => self.show_last_expenses(chat_id).await?,
                Effect::ShowDeleteCandidates => self.show_delete_candidates(chat_id).await?,
                Effect::DeleteExpense(request) => match self.book.delete_matching(request).await {
                    Ok(true) => {
                        tracing::info!("chat {chat_id}: expense {} deleted", request.row);
                        self.say(chat_id, ui::EXPENSE_DELETED).await?;
                    }
                    Ok(false) => {
                        tracing::debug!("chat {chat_id}: expense {} no longer matches", request.row)
                    }
                    Err(err) => {
                        tracing::warn!("chat {chat_id}: delete failed: {err}");
                        self.say(chat_id, &ui::render_error(&err.to_string()))
                            .await?;
                    }
                },
                Effect::PromptDate => {
                    self.send(chat_id, ui::render_date_prompt(Utc::now(), &self.config))
                        .await?
                }
                Effect::PromptCategory => {
                    let rows = self.book.categories().await?;
                    self.send(chat_id, ui::render_category_prompt(&category_names(&rows)))
                        .await?
                }
                Effect::PromptSubcategory { category } => {
                    let rows = self.book.categories().await?;
                    self.send(chat_id, ui::render_subcategory_prompt(&rows, category))
                        .await?
                }
                Effect::PromptDescription => self.say(chat_id, ui::ASK_DESCRIPTION).await?,
                Effect::PromptValue => self.say(chat_id, ui::ASK_VALUE).await?,
                Effect::PromptDetails => self.send(chat_id, ui::render_details_prompt()).await?,
                Effect::Notify(notice) => {
                    self.say(chat_id, &ui::render_notice(notice, &self.config))
                        .await?
                }
                Effect::Commit(record) => {
                    committed = Some(self.commit(chat_id, record).await?);
                }
                Effect::ClearLog => self.log.clear(chat_id).await?,
            }
        }
        Ok(committed)
    }

    /// Writes the record and recaps it. A failed write is reported to the
    /// user and leaves the log as it is.
    async fn commit(&self, chat_id: i64, record: &ExpenseRecord) -> Result<bool, BotError> {
        if let Err(err) = self.book.record_expense(record).await {
            tracing::warn!("chat {chat_id}: commit failed: {err}");
            self.say(chat_id, &ui::render_error(&err.to_string()))
                .await?;
            return Ok(false);
        }

        self.say(chat_id, ui::EXPENSE_ADDED).await?;
        self.show_totals(chat_id).await?;
        self.send(chat_id, ui::render_main_menu()).await?;
        self.log.clear(chat_id).await?;
        Ok(true)
    }

    fn current_month(&self) -> (i32, Month) {
        let today = ui::today(Utc::now(), &self.config);
        (today.year(), Month::of(today))
    }

    async fn show_totals(&self, chat_id: i64) -> Result<(), BotError> {
        let (year, month) = self.current_month();
        let summary = self.book.monthly_summary(year, month).await?;
        self.say(chat_id, &ui::render_totals(&summary, &self.config))
            .await
    }

    async fn show_last_expenses(&self, chat_id: i64) -> Result<(), BotError> {
        let (year, month) = self.current_month();
        let expenses = self
            .book
            .recent_expenses(year, month, RECENT_LIMIT)
            .await?;
        self.say(chat_id, &ui::render_last_expenses(&expenses, &self.config))
            .await
    }

    /// Offers the latest rows whatever month they were filed under, so an
    /// expense dated yesterday stays deletable on the 1st.
    async fn show_delete_candidates(&self, chat_id: i64) -> Result<(), BotError> {
        let expenses = self.book.latest_expenses(RECENT_LIMIT).await?;
        if expenses.is_empty() {
            let (text, _) = ui::render_delete_candidates(&expenses, &self.config);
            self.say(chat_id, &text).await?;
            return self.send(chat_id, ui::render_main_menu()).await;
        }
        self.send(
            chat_id,
            ui::render_delete_candidates(&expenses, &self.config),
        )
        .await
    }
}
