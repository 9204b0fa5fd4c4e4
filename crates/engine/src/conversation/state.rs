use chrono::NaiveDate;

use crate::{ExpenseRecord, MoneyCents};

/// Step of the add-expense flow a chat is in, with everything gathered so
/// far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ConversationState {
    #[default]
    NoFlow,
    AwaitingDate,
    AwaitingCategory {
        date: NaiveDate,
    },
    AwaitingSubcategory {
        date: NaiveDate,
        category: String,
    },
    AwaitingDescription {
        date: NaiveDate,
        category: String,
        subcategory: String,
    },
    AwaitingValue {
        date: NaiveDate,
        category: String,
        subcategory: String,
        description: String,
    },
    AwaitingDetails {
        date: NaiveDate,
        category: String,
        subcategory: String,
        description: String,
        value: MoneyCents,
    },
    ReadyToCommit(ExpenseRecord),
}

impl ConversationState {
    /// Name of the step, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoFlow => "no_flow",
            Self::AwaitingDate => "awaiting_date",
            Self::AwaitingCategory { .. } => "awaiting_category",
            Self::AwaitingSubcategory { .. } => "awaiting_subcategory",
            Self::AwaitingDescription { .. } => "awaiting_description",
            Self::AwaitingValue { .. } => "awaiting_value",
            Self::AwaitingDetails { .. } => "awaiting_details",
            Self::ReadyToCommit(_) => "ready_to_commit",
        }
    }

    /// State once the commit requested from `ReadyToCommit` has run.
    ///
    /// A successful write ends the flow. A failed one goes back to the
    /// details step, so sending the details again retries the write. Any
    /// other state is returned unchanged.
    pub fn after_commit(self, committed: bool) -> Self {
        match self {
            Self::ReadyToCommit(_) if committed => Self::NoFlow,
            Self::ReadyToCommit(record) => Self::AwaitingDetails {
                date: record.date,
                category: record.category,
                subcategory: record.subcategory,
                description: record.description,
                value: record.value,
            },
            other => other,
        }
    }
}
