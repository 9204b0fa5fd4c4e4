//! Domain of the expense bot: inbound events, the conversation state
//! machines and the sea-orm backed [`Engine`] store.

use sea_orm::DatabaseConnection;

pub use callback::{
    ADD_EXPENSE, CATEGORY_MARKER, CallbackAction, DATE_MARKER, DELETE_MARKER, DELETE_MENU,
    DETAILS_NOT_AVAILABLE, DateToken, DeleteRequest, LAST_EXPENSES, SUBCATEGORY_MARKER,
    TOTAL_EXPENSES,
};
pub use categories::{CategoryRow, category_names, subcategories_of};
pub use classify::{classify, parse_delivery};
pub use conversation::{
    COMMIT_WINDOW, ConvContext, ConversationState, Effect, INFERENCE_WINDOW, LegacyStep, Mode,
    Notice, TransitionResult, WindowState, assemble, capitalize, infer, legacy_step, transition,
};
pub use error::EngineError;
pub use event::Event;
pub use expenses::{CategoryTotal, ExpenseRecord, MonthlySummary, StoredExpense};
pub use money::MoneyCents;
pub use month::Month;
pub use store::{EventLog, ExpenseBook, UserDirectory};
pub use users::Model as AuthorizedUser;

mod callback;
mod categories;
mod classify;
mod conversation;
mod error;
mod event;
mod event_log;
mod expenses;
mod money;
mod month;
mod store;
mod users;

pub type ResultEngine<T> = Result<T, EngineError>;

/// Store of the bot, over a single database connection.
#[derive(Clone, Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`. Fails if the database does not answer.
    pub async fn build(self) -> ResultEngine<Engine> {
        self.database.ping().await?;
        Ok(Engine {
            database: self.database,
        })
    }
}
