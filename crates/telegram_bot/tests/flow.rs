use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use engine::{
    CategoryRow, DeleteRequest, Engine, EngineError, EventLog, ExpenseBook, ExpenseRecord, Mode,
    Month, MoneyCents, MonthlySummary, ResultEngine, StoredExpense,
};
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::json;
use teloxide::types::{InlineKeyboardButtonKind, InlineKeyboardMarkup};
use telegram_bot::{BotConfig, ChatTransport, ExpenseBot, TransportError};

const USER: i64 = 7;
const ADMIN: i64 = 1;

#[derive(Clone, Debug)]
enum Sent {
    Message {
        chat_id: i64,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    Deleted {
        message_id: i32,
    },
}

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingTransport {
    fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    fn texts(sent: &[Sent]) -> Vec<String> {
        sent.iter()
            .filter_map(|s| match s {
                Sent::Message { text, .. } => Some(text.clone()),
                Sent::Deleted { .. } => None,
            })
            .collect()
    }

    /// Callback payloads of the last keyboard sent.
    fn last_buttons(sent: &[Sent]) -> Vec<String> {
        sent.iter()
            .rev()
            .find_map(|s| match s {
                Sent::Message {
                    keyboard: Some(kb), ..
                } => Some(kb),
                _ => None,
            })
            .map(|kb| {
                kb.inline_keyboard
                    .iter()
                    .flatten()
                    .filter_map(|b| match &b.kind {
                        InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(
        &self,
        chat_id: i64,
        html: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(Sent::Message {
            chat_id,
            text: html.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn delete_message(&self, _chat_id: i64, message_id: i32) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(Sent::Deleted { message_id });
        Ok(())
    }
}

/// Delegates to the engine but refuses to store expenses.
struct ReadOnlyBook(Engine);

#[async_trait]
impl ExpenseBook for ReadOnlyBook {
    async fn categories(&self) -> ResultEngine<Vec<CategoryRow>> {
        self.0.categories().await
    }

    async fn record_expense(&self, _record: &ExpenseRecord) -> ResultEngine<StoredExpense> {
        Err(EngineError::KeyNotFound("expenses table".to_string()))
    }

    async fn expense(&self, row: i64) -> ResultEngine<Option<StoredExpense>> {
        self.0.expense(row).await
    }

    async fn recent_expenses(
        &self,
        year: i32,
        month: Month,
        limit: u64,
    ) -> ResultEngine<Vec<StoredExpense>> {
        self.0.recent_expenses(year, month, limit).await
    }

    async fn latest_expenses(&self, limit: u64) -> ResultEngine<Vec<StoredExpense>> {
        self.0.latest_expenses(limit).await
    }

    async fn monthly_summary(&self, year: i32, month: Month) -> ResultEngine<MonthlySummary> {
        self.0.monthly_summary(year, month).await
    }

    async fn delete_matching(&self, request: &DeleteRequest) -> ResultEngine<bool> {
        self.0.delete_matching(request).await
    }
}

struct Harness {
    bot: ExpenseBot,
    engine: Engine,
    transport: Arc<RecordingTransport>,
    next_message_id: Mutex<i32>,
}

impl Harness {
    async fn new(mode: Mode) -> Self {
        Self::with_book(mode, |_| None).await
    }

    async fn with_book(
        mode: Mode,
        book: impl FnOnce(&Engine) -> Option<Arc<dyn ExpenseBook>>,
    ) -> Self {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder().database(db).build().await.unwrap();

        engine.authorize_user(USER, None).await.unwrap();
        for (category, subcategory) in [("Food", "Groceries"), ("", "Restaurants"), ("Home", "Rent")]
        {
            engine.add_category_row(category, subcategory).await.unwrap();
        }

        let transport = Arc::new(RecordingTransport::default());
        let config = BotConfig {
            admin_chat_id: Some(ADMIN),
            mode,
            ..BotConfig::default()
        };
        let mut builder = ExpenseBot::builder()
            .config(config)
            .engine(engine.clone())
            .transport(transport.clone());
        if let Some(book) = book(&engine) {
            builder = builder.expense_book(book);
        }

        Self {
            bot: builder.build().unwrap(),
            engine,
            transport,
            next_message_id: Mutex::new(100),
        }
    }

    async fn press(&self, data: &str) -> Vec<Sent> {
        self.press_as(USER, data).await
    }

    async fn press_as(&self, from: i64, data: &str) -> Vec<Sent> {
        let message_id = {
            let mut id = self.next_message_id.lock().unwrap();
            *id += 1;
            *id
        };
        let body = json!({
            "update_id": message_id,
            "callback_query": {
                "id": "q",
                "from": { "id": from, "first_name": "Ada" },
                "data": data,
                "message": { "message_id": message_id }
            }
        });
        self.bot.handle_delivery(body.to_string().as_bytes()).await;
        self.transport.take()
    }

    async fn say_as(&self, from: i64, text: &str) -> Vec<Sent> {
        let body = json!({
            "update_id": 1,
            "message": {
                "message_id": 1,
                "chat": { "id": from },
                "from": { "id": from, "first_name": "Ada" },
                "text": text
            }
        });
        self.bot.handle_delivery(body.to_string().as_bytes()).await;
        self.transport.take()
    }

    async fn say(&self, text: &str) -> Vec<Sent> {
        self.say_as(USER, text).await
    }

    /// Walks the wizard up to the value prompt, pressing the buttons the bot
    /// actually sent.
    async fn start_expense(&self) {
        let sent = self.press("addNewExpenseStep1Date").await;
        let dates = RecordingTransport::last_buttons(&sent);
        assert_eq!(dates.len(), 3);

        let sent = self.press(&dates[0]).await;
        assert!(RecordingTransport::texts(&sent)[0].contains("Date:"));
        assert_eq!(
            RecordingTransport::last_buttons(&sent),
            vec!["categoryFood", "categoryHome"]
        );

        let sent = self.press("categoryFood").await;
        assert!(RecordingTransport::texts(&sent)[0].contains("Category: Food"));
        assert_eq!(
            RecordingTransport::last_buttons(&sent),
            vec!["subcatGroceries", "subcatRestaurants"]
        );

        let sent = self.press("subcatGroceries").await;
        let texts = RecordingTransport::texts(&sent);
        assert!(texts[0].contains("SubCategory: Groceries"));
        assert!(texts[1].contains("description"));

        let sent = self.say("Milk and bread").await;
        assert!(RecordingTransport::texts(&sent)[0].contains("value"));
    }

    async fn stored_this_month(&self) -> Vec<StoredExpense> {
        let today = today();
        self.engine
            .recent_expenses(today.year(), Month::of(today), 5)
            .await
            .unwrap()
    }
}

fn today() -> NaiveDate {
    Utc::now()
        .with_timezone(&chrono_tz::Europe::Rome)
        .date_naive()
}

async fn milk_and_bread(mode: Mode) {
    let h = Harness::new(mode).await;
    h.start_expense().await;

    let sent = h.say("12,50").await;
    assert_eq!(RecordingTransport::last_buttons(&sent), vec!["detailsNotAvailable"]);

    let sent = h.press("detailsNotAvailable").await;
    let texts = RecordingTransport::texts(&sent);
    assert_eq!(texts[0], "✔️ Expense added correctly!");
    assert!(texts[1].contains("<b>Food</b>:  € 12.50"));
    assert_eq!(
        RecordingTransport::last_buttons(&sent),
        vec![
            "totalExpenses",
            "last5Expenses",
            "addNewExpenseStep1Date",
            "deleteAnExpense"
        ]
    );

    let stored = h.stored_this_month().await;
    assert_eq!(stored.len(), 1);
    let record = &stored[0].record;
    assert_eq!(record.date, today());
    assert_eq!(record.category, "Food");
    assert_eq!(record.subcategory, "Groceries");
    assert_eq!(record.description, "Milk and bread");
    assert_eq!(record.value, MoneyCents::new(1_250));
    assert_eq!(record.details, None);

    assert_eq!(h.engine.len(USER).await.unwrap(), 0);
}

#[tokio::test]
async fn milk_and_bread_explicit() {
    milk_and_bread(Mode::Explicit).await;
}

#[tokio::test]
async fn milk_and_bread_legacy() {
    milk_and_bread(Mode::Legacy).await;
}

#[tokio::test]
async fn typed_details_are_stored_capitalized() {
    for mode in [Mode::Explicit, Mode::Legacy] {
        let h = Harness::new(mode).await;
        h.start_expense().await;
        h.say("3.5").await;
        h.say("from the corner shop").await;

        let stored = h.stored_this_month().await;
        assert_eq!(stored.len(), 1, "{mode:?}");
        assert_eq!(stored[0].record.value, MoneyCents::new(350));
        assert_eq!(
            stored[0].record.details.as_deref(),
            Some("From the corner shop")
        );
        assert_eq!(h.engine.len(USER).await.unwrap(), 0);
    }
}

#[tokio::test]
async fn invalid_value_is_rejected_in_place() {
    for mode in [Mode::Explicit, Mode::Legacy] {
        let h = Harness::new(mode).await;
        h.start_expense().await;
        let before = h.engine.len(USER).await.unwrap();

        let sent = h.say("twelve").await;
        let texts = RecordingTransport::texts(&sent);
        assert_eq!(texts.len(), 1, "{mode:?}");
        assert!(texts[0].contains("value inserted is not valid! (twelve)"));
        assert_eq!(h.engine.len(USER).await.unwrap(), before + 1);
        assert!(h.stored_this_month().await.is_empty());
    }
}

#[tokio::test]
async fn explicit_mode_accepts_the_value_after_a_rejection() {
    let h = Harness::new(Mode::Explicit).await;
    h.start_expense().await;
    h.say("twelve").await;

    let sent = h.say("12").await;
    assert_eq!(RecordingTransport::last_buttons(&sent), vec!["detailsNotAvailable"]);
    h.press("detailsNotAvailable").await;
    assert_eq!(h.stored_this_month().await[0].record.value, MoneyCents::new(1_200));
}

#[tokio::test]
async fn unknown_sender_is_turned_away() {
    let h = Harness::new(Mode::Explicit).await;
    let sent = h.say_as(8, "hello").await;

    let texts = RecordingTransport::texts(&sent);
    assert_eq!(texts, vec!["⛔ You're not authorized to interact with this bot!"]);
    assert_eq!(h.engine.len(8).await.unwrap(), 0);

    for stranger in 100..150 {
        h.say_as(stranger, "hello").await;
    }
    for stranger in 100..150 {
        assert_eq!(h.engine.len(stranger).await.unwrap(), 0);
    }
}

#[tokio::test]
async fn button_messages_are_removed() {
    let h = Harness::new(Mode::Explicit).await;
    let sent = h.press("totalExpenses").await;
    assert!(matches!(sent[0], Sent::Deleted { message_id: 101 }));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let h = Harness::new(Mode::Explicit).await;
    let record = ExpenseRecord::new(
        today(),
        "Food",
        "Groceries",
        "Milk",
        MoneyCents::new(350),
        None,
    );
    h.engine.record_expense(&record).await.unwrap();

    let sent = h.press("deleteAnExpense").await;
    let buttons = RecordingTransport::last_buttons(&sent);
    assert_eq!(buttons.len(), 1);

    let sent = h.press(&buttons[0]).await;
    let texts = RecordingTransport::texts(&sent);
    assert_eq!(texts[0], "✔️ Expense deleted correctly");
    assert!(h.stored_this_month().await.is_empty());

    // The same, now stale, button.
    let sent = h.press(&buttons[0]).await;
    let texts = RecordingTransport::texts(&sent);
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("What do you want to do?"));
    assert_eq!(h.engine.len(USER).await.unwrap(), 0);
}

#[tokio::test]
async fn unclassifiable_payload_goes_to_admin() {
    let h = Harness::new(Mode::Explicit).await;
    h.bot.handle_delivery(br#"{"edited_message": {}}"#).await;

    let sent = h.transport.take();
    assert_eq!(sent.len(), 1);
    let Sent::Message { chat_id, text, .. } = &sent[0] else {
        panic!("expected a message, got {sent:?}");
    };
    assert_eq!(*chat_id, ADMIN);
    assert!(text.starts_with("<pre>"));
    assert!(text.contains("edited_message"));
}

#[tokio::test]
async fn failed_commit_keeps_the_log_and_can_be_retried() {
    let h = Harness::with_book(Mode::Explicit, |engine| {
        Some(Arc::new(ReadOnlyBook(engine.clone())) as Arc<dyn ExpenseBook>)
    })
    .await;
    h.start_expense().await;
    h.say("12,50").await;

    let sent = h.say("details").await;
    let texts = RecordingTransport::texts(&sent);
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with("❌ An error occurred:"));
    let logged = h.engine.len(USER).await.unwrap();
    assert!(logged > 0);

    // Still waiting for the details: sending them again retries the write.
    let sent = h.say("details").await;
    assert!(RecordingTransport::texts(&sent)[0].starts_with("❌ An error occurred:"));
    assert_eq!(h.engine.len(USER).await.unwrap(), logged + 1);
}

#[tokio::test]
async fn stray_text_shows_the_menu() {
    let h = Harness::new(Mode::Legacy).await;
    let sent = h.say("hi").await;
    assert_eq!(
        RecordingTransport::last_buttons(&sent),
        vec![
            "totalExpenses",
            "last5Expenses",
            "addNewExpenseStep1Date",
            "deleteAnExpense"
        ]
    );
}

#[tokio::test]
async fn delete_offers_expenses_of_the_previous_month() {
    let h = Harness::new(Mode::Explicit).await;
    let last_month = today().with_day(1).unwrap().pred_opt().unwrap();
    let record = ExpenseRecord::new(
        last_month,
        "Home",
        "Rent",
        "Rent",
        MoneyCents::new(70_000),
        None,
    );
    let stored = h.engine.record_expense(&record).await.unwrap();

    let sent = h.press("deleteAnExpense").await;
    let buttons = RecordingTransport::last_buttons(&sent);
    assert_eq!(buttons.len(), 1);
    assert!(buttons[0].starts_with(&format!("deleteExpense{}_", stored.row)));

    let sent = h.press(&buttons[0]).await;
    assert_eq!(RecordingTransport::texts(&sent)[0], "✔️ Expense deleted correctly");
    assert_eq!(h.engine.expense(stored.row).await.unwrap(), None);
}

#[tokio::test]
async fn empty_book_has_nothing_to_delete() {
    let h = Harness::new(Mode::Explicit).await;
    let sent = h.press("deleteAnExpense").await;
    let texts = RecordingTransport::texts(&sent);
    assert!(texts[0].contains("No expenses to delete."));
    assert_eq!(RecordingTransport::last_buttons(&sent).len(), 4);
}

#[tokio::test]
async fn legacy_wizards_of_two_chats_do_not_mix() {
    const OTHER: i64 = 9;
    let h = Harness::new(Mode::Legacy).await;
    h.engine.authorize_user(OTHER, None).await.unwrap();

    let first = RecordingTransport::last_buttons(&h.press_as(USER, "addNewExpenseStep1Date").await);
    let second = RecordingTransport::last_buttons(&h.press_as(OTHER, "addNewExpenseStep1Date").await);
    h.press_as(USER, &first[0]).await;
    h.press_as(OTHER, &second[1]).await;
    h.press_as(USER, "categoryFood").await;
    h.press_as(OTHER, "categoryHome").await;
    h.press_as(USER, "subcatGroceries").await;
    h.press_as(OTHER, "subcatRent").await;
    h.say_as(USER, "Milk and bread").await;
    h.say_as(OTHER, "October rent").await;

    let sent = h.say_as(USER, "12,50").await;
    assert_eq!(RecordingTransport::last_buttons(&sent), vec!["detailsNotAvailable"]);
    let sent = h.say_as(OTHER, "700").await;
    assert_eq!(RecordingTransport::last_buttons(&sent), vec!["detailsNotAvailable"]);

    let sent = h.press_as(USER, "detailsNotAvailable").await;
    assert_eq!(RecordingTransport::texts(&sent)[0], "✔️ Expense added correctly!");
    let sent = h.say_as(OTHER, "bank transfer").await;
    assert_eq!(RecordingTransport::texts(&sent)[0], "✔️ Expense added correctly!");

    let mut stored = h.engine.latest_expenses(5).await.unwrap();
    stored.reverse();
    assert_eq!(stored.len(), 2);

    let food = &stored[0].record;
    assert_eq!(food.date, today());
    assert_eq!((food.category.as_str(), food.subcategory.as_str()), ("Food", "Groceries"));
    assert_eq!(food.description, "Milk and bread");
    assert_eq!(food.value, MoneyCents::new(1_250));
    assert_eq!(food.details, None);

    let rent = &stored[1].record;
    assert_eq!(rent.date, today().pred_opt().unwrap());
    assert_eq!((rent.category.as_str(), rent.subcategory.as_str()), ("Home", "Rent"));
    assert_eq!(rent.description, "October rent");
    assert_eq!(rent.value, MoneyCents::new(70_000));
    assert_eq!(rent.details.as_deref(), Some("Bank transfer"));

    assert_eq!(h.engine.len(USER).await.unwrap(), 0);
    assert_eq!(h.engine.len(OTHER).await.unwrap(), 0);
}
