//! Storage seams used by the bot.
//!
//! [`Engine`](crate::Engine) implements all of them over sea-orm.

use async_trait::async_trait;

use crate::{
    CategoryRow, DeleteRequest, EngineError, Event, ExpenseRecord, Month, MonthlySummary,
    ResultEngine, StoredExpense,
};

/// Append-only log of inbound events, partitioned by chat.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Adds `event` at the end of the chat's log.
    async fn append(&self, chat_id: i64, event: &Event) -> ResultEngine<()>;

    /// Last `k` events in arrival order, fewer if the log is shorter.
    async fn tail(&self, chat_id: i64, k: usize) -> ResultEngine<Vec<Event>>;

    /// Last `k` events in arrival order. Fails with
    /// [`EngineError::InsufficientHistory`] if the log holds fewer.
    async fn tail_exact(&self, chat_id: i64, k: usize) -> ResultEngine<Vec<Event>> {
        let events = self.tail(chat_id, k).await?;
        if events.len() < k {
            return Err(EngineError::InsufficientHistory {
                needed: k,
                found: events.len(),
            });
        }
        Ok(events)
    }

    /// Truncates the chat's log.
    async fn clear(&self, chat_id: i64) -> ResultEngine<()>;

    async fn len(&self, chat_id: i64) -> ResultEngine<u64>;
}

/// Committed expenses and the category definitions they refer to.
#[async_trait]
pub trait ExpenseBook: Send + Sync {
    /// Category sheet rows, top to bottom.
    async fn categories(&self) -> ResultEngine<Vec<CategoryRow>>;

    async fn record_expense(&self, record: &ExpenseRecord) -> ResultEngine<StoredExpense>;

    async fn expense(&self, row: i64) -> ResultEngine<Option<StoredExpense>>;

    /// Most recent expenses of a month, newest first.
    async fn recent_expenses(
        &self,
        year: i32,
        month: Month,
        limit: u64,
    ) -> ResultEngine<Vec<StoredExpense>>;

    /// Most recent expenses of any date, newest row first.
    async fn latest_expenses(&self, limit: u64) -> ResultEngine<Vec<StoredExpense>>;

    /// Per category totals of a month.
    async fn monthly_summary(&self, year: i32, month: Month) -> ResultEngine<MonthlySummary>;

    /// Removes the row only if it still has the date and cost shown on the
    /// button. Returns whether a row was removed.
    async fn delete_matching(&self, request: &DeleteRequest) -> ResultEngine<bool>;
}

/// The allow-list of users that may talk to the bot.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn is_authorized(&self, telegram_id: i64) -> ResultEngine<bool>;
}
