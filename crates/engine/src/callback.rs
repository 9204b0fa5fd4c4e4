//! Inline keyboard payloads.
//!
//! Every button the bot sends carries a short string naming the step that
//! produced it. The markers are kept identical to the ones already stored in
//! existing event logs.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::MoneyCents;

pub const TOTAL_EXPENSES: &str = "totalExpenses";
pub const LAST_EXPENSES: &str = "last5Expenses";
pub const ADD_EXPENSE: &str = "addNewExpenseStep1Date";
pub const DATE_MARKER: &str = "newExpDate";
pub const CATEGORY_MARKER: &str = "category";
pub const SUBCATEGORY_MARKER: &str = "subcat";
pub const DETAILS_NOT_AVAILABLE: &str = "detailsNotAvailable";
pub const DELETE_MENU: &str = "deleteAnExpense";
pub const DELETE_MARKER: &str = "deleteExpense";

/// A date choice, encoded as milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateToken(pub i64);

impl DateToken {
    /// Token for `days` days before `now`.
    pub fn days_before(now: DateTime<Utc>, days: i64) -> Self {
        Self((now - Duration::days(days)).timestamp_millis())
    }

    /// Token for UTC midnight of `date`. Used where the token identifies a
    /// stored calendar day rather than an instant.
    pub fn of_day(date: NaiveDate) -> Self {
        Self(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
    }

    /// Calendar day of this instant in UTC, the inverse of [`DateToken::of_day`].
    pub fn utc_date(self) -> Option<NaiveDate> {
        DateTime::from_timestamp_millis(self.0).map(|dt| dt.date_naive())
    }

    /// Calendar day of this instant in `tz`.
    pub fn date_in(self, tz: Tz) -> Option<NaiveDate> {
        DateTime::from_timestamp_millis(self.0).map(|dt| dt.with_timezone(&tz).date_naive())
    }
}

/// Identity of a stored expense as shown on a delete button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeleteRequest {
    pub row: i64,
    pub date: DateToken,
    pub cost: MoneyCents,
}

/// Decoded callback payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    TotalExpenses,
    LastExpenses,
    AddExpense,
    Date(DateToken),
    Category(String),
    Subcategory(String),
    DetailsNotAvailable,
    DeleteMenu,
    DeleteExpense(DeleteRequest),
    Unknown(String),
}

impl CallbackAction {
    /// Decodes a payload. Anything that is not recognised, including a known
    /// marker with a malformed argument, becomes [`CallbackAction::Unknown`].
    pub fn parse(data: &str) -> Self {
        match data {
            TOTAL_EXPENSES => return Self::TotalExpenses,
            LAST_EXPENSES => return Self::LastExpenses,
            ADD_EXPENSE => return Self::AddExpense,
            DETAILS_NOT_AVAILABLE => return Self::DetailsNotAvailable,
            DELETE_MENU => return Self::DeleteMenu,
            _ => {}
        }

        if let Some(raw) = data.strip_prefix(DATE_MARKER) {
            return raw
                .parse()
                .map(|millis| Self::Date(DateToken(millis)))
                .unwrap_or_else(|_| Self::Unknown(data.to_string()));
        }
        if let Some(raw) = data.strip_prefix(DELETE_MARKER) {
            return parse_delete(raw)
                .map(Self::DeleteExpense)
                .unwrap_or_else(|| Self::Unknown(data.to_string()));
        }
        if let Some(name) = data.strip_prefix(CATEGORY_MARKER) {
            return Self::Category(name.to_string());
        }
        if let Some(name) = data.strip_prefix(SUBCATEGORY_MARKER) {
            return Self::Subcategory(name.to_string());
        }

        Self::Unknown(data.to_string())
    }

    pub fn encode(&self) -> String {
        match self {
            Self::TotalExpenses => TOTAL_EXPENSES.to_string(),
            Self::LastExpenses => LAST_EXPENSES.to_string(),
            Self::AddExpense => ADD_EXPENSE.to_string(),
            Self::Date(token) => format!("{DATE_MARKER}{}", token.0),
            Self::Category(name) => format!("{CATEGORY_MARKER}{name}"),
            Self::Subcategory(name) => format!("{SUBCATEGORY_MARKER}{name}"),
            Self::DetailsNotAvailable => DETAILS_NOT_AVAILABLE.to_string(),
            Self::DeleteMenu => DELETE_MENU.to_string(),
            Self::DeleteExpense(req) => format!(
                "{DELETE_MARKER}{}_{}_{}",
                req.row,
                req.date.0,
                req.cost.cents()
            ),
            Self::Unknown(raw) => raw.clone(),
        }
    }

    /// `true` for the actions of the main menu, which reset any flow.
    pub fn is_top_level(&self) -> bool {
        matches!(
            self,
            Self::TotalExpenses | Self::LastExpenses | Self::DeleteMenu | Self::DeleteExpense(_)
        )
    }
}

fn parse_delete(raw: &str) -> Option<DeleteRequest> {
    let mut parts = raw.split('_');
    let row = parts.next()?.parse().ok()?;
    let date = parts.next()?.parse().ok()?;
    let cost = parts.next()?.parse::<i64>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(DeleteRequest {
        row,
        date: DateToken(date),
        cost: MoneyCents::new(cost),
    })
}
