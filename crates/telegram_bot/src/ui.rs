//! Texts and keyboards. Everything returned here is HTML; user supplied
//! text is escaped.

use chrono::{DateTime, NaiveDate, Utc};
use engine::{
    CallbackAction, DateToken, MonthlySummary, Notice, StoredExpense, subcategories_of,
};
use teloxide::{
    types::{InlineKeyboardButton, InlineKeyboardMarkup},
    utils::html::escape,
};

use crate::BotConfig;

pub(crate) const NOT_AUTHORIZED: &str = "⛔ You're not authorized to interact with this bot!";
pub(crate) const EXPENSE_ADDED: &str = "✔️ Expense added correctly!";
pub(crate) const EXPENSE_DELETED: &str = "✔️ Expense deleted correctly";
pub(crate) const ASK_DESCRIPTION: &str = "<b><u>📜 Write the expense description:</u></b>";
pub(crate) const ASK_VALUE: &str = "<b><u>💸 Write the expense value:</u></b>";

fn button(label: impl Into<String>, action: &CallbackAction) -> Vec<InlineKeyboardButton> {
    vec![InlineKeyboardButton::callback(label, action.encode())]
}

pub(crate) fn render_main_menu() -> (String, InlineKeyboardMarkup) {
    let kb = InlineKeyboardMarkup::new(vec![
        button("⏮️ Total Expenses", &CallbackAction::TotalExpenses),
        button("💸 Last 5 Expenses", &CallbackAction::LastExpenses),
        button("✍️ Add new expense", &CallbackAction::AddExpense),
        button("❌ Delete an expense", &CallbackAction::DeleteMenu),
    ]);
    ("What do you want to do?".to_string(), kb)
}

pub(crate) fn render_date_prompt(
    now: DateTime<Utc>,
    config: &BotConfig,
) -> (String, InlineKeyboardMarkup) {
    let rows = [("📅 Today", 0), ("📆 Yesterday", 1), ("🗓️ 2 Days Ago", 2)]
        .into_iter()
        .map(|(label, days)| {
            let token = DateToken::days_before(now, days);
            let shown = token
                .date_in(config.timezone)
                .map(|d| config.format_date(d))
                .unwrap_or_default();
            button(format!("{label} - {shown}"), &CallbackAction::Date(token))
        })
        .collect::<Vec<_>>();

    (
        "<b><u>🕰️ Choose the expense date:</u></b>".to_string(),
        InlineKeyboardMarkup::new(rows),
    )
}

pub(crate) fn render_category_prompt(categories: &[String]) -> (String, InlineKeyboardMarkup) {
    let rows = categories
        .iter()
        .map(|name| button(name.clone(), &CallbackAction::Category(name.clone())))
        .collect::<Vec<_>>();
    (
        "<b><u>📋 Choose the expense category:</u></b>".to_string(),
        InlineKeyboardMarkup::new(rows),
    )
}

pub(crate) fn render_subcategory_prompt(
    rows: &[engine::CategoryRow],
    category: &str,
) -> (String, InlineKeyboardMarkup) {
    let rows = subcategories_of(rows, category)
        .into_iter()
        .map(|name| button(name.clone(), &CallbackAction::Subcategory(name)))
        .collect::<Vec<_>>();
    (
        "<b><u>📋 Choose the expense SubCategory:</u></b>".to_string(),
        InlineKeyboardMarkup::new(rows),
    )
}

pub(crate) fn render_details_prompt() -> (String, InlineKeyboardMarkup) {
    (
        "<b><u>🕵 Write the expense details:</u></b>".to_string(),
        InlineKeyboardMarkup::new(vec![button("N/A", &CallbackAction::DetailsNotAvailable)]),
    )
}

pub(crate) fn render_notice(notice: &Notice, config: &BotConfig) -> String {
    match notice {
        Notice::DateChosen(date) => format!("<b>🕰️ Date: {}</b>", config.format_date(*date)),
        Notice::CategoryChosen(category) => format!("<b>📋 Category: {}</b>", escape(category)),
        Notice::SubcategoryChosen(subcategory) => {
            format!("<b>📋 SubCategory: {}</b>", escape(subcategory))
        }
        Notice::InvalidValue(text) => format!(
            "❌ An error occurred: value inserted is not valid! ({})",
            escape(text)
        ),
    }
}

pub(crate) fn render_error(detail: &str) -> String {
    format!("❌ An error occurred: {}", escape(detail))
}

pub(crate) fn render_totals(summary: &MonthlySummary, config: &BotConfig) -> String {
    let lines = summary
        .rows
        .iter()
        .map(|row| {
            format!(
                "\n<b>{}</b>:  {}",
                escape(&row.category),
                row.total.with_currency(&config.currency)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<b>Here are your total expenses this month ({}):</b> <span class=\"tg-spoiler\">\n{}\n\n--------------------\n<b><u>💵 TOTAL: {}</u></b></span>",
        summary.month,
        lines,
        summary.total.with_currency(&config.currency)
    )
}

pub(crate) fn render_last_expenses(expenses: &[StoredExpense], config: &BotConfig) -> String {
    if expenses.is_empty() {
        return "<b>No expenses recorded this month.</b>".to_string();
    }

    let entries = expenses
        .iter()
        .map(|e| {
            format!(
                "---------\n🗓️ Date: <b>{}</b>\n📋 Category: <b>{}</b>\n📋 Subcategory: <b>{}</b>\n🔎 Description: <b>{}</b>\n💸 Cost: <b>{}</b>",
                config.format_date(e.record.date),
                escape(&e.record.category),
                escape(&e.record.subcategory),
                escape(&e.record.description),
                e.record.value.with_currency(&config.currency)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "<b>Here are your last {} expenses:</b>\n\n{entries}",
        expenses.len()
    )
}

pub(crate) fn render_delete_candidates(
    expenses: &[StoredExpense],
    config: &BotConfig,
) -> (String, InlineKeyboardMarkup) {
    let rows = expenses
        .iter()
        .map(|e| {
            let label = format!(
                "🗑️ {}: {} - {} - {}",
                config.format_date(e.record.date),
                e.record.category,
                e.record.description,
                e.record.value.with_currency(&config.currency)
            );
            button(label, &CallbackAction::DeleteExpense(e.delete_request()))
        })
        .collect::<Vec<_>>();

    let text = if rows.is_empty() {
        "<b>No expenses to delete.</b>"
    } else {
        "<b><u>❌ Choose which expense to delete: </u></b>"
    };
    (text.to_string(), InlineKeyboardMarkup::new(rows))
}

/// Raw diagnostics for the admin chat.
pub(crate) fn render_admin_dump(detail: &str) -> String {
    format!("<pre>{}</pre>", escape(detail))
}

/// Today in the configured zone.
pub(crate) fn today(now: DateTime<Utc>, config: &BotConfig) -> NaiveDate {
    now.with_timezone(&config.timezone).date_naive()
}
