use chrono::NaiveDate;

use crate::{DeleteRequest, ExpenseRecord};

/// A side effect requested by a transition. The bot executes them in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    ShowMainMenu,
    /// Per-category totals of the current month.
    ShowTotals,
    ShowLastExpenses,
    ShowDeleteCandidates,
    DeleteExpense(DeleteRequest),
    PromptDate,
    PromptCategory,
    PromptSubcategory { category: String },
    PromptDescription,
    PromptValue,
    PromptDetails,
    Notify(Notice),
    /// Persist the record, then recap it with the monthly totals and the menu.
    /// The event log is cleared only if the write succeeds.
    Commit(ExpenseRecord),
    ClearLog,
}

/// Short messages that are not prompts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    DateChosen(NaiveDate),
    CategoryChosen(String),
    SubcategoryChosen(String),
    InvalidValue(String),
}

impl Effect {
    /// Effects of the main menu buttons. They are the same whatever the
    /// conversation was doing, and they always end by clearing the log.
    pub(crate) fn menu(action: &crate::CallbackAction) -> Option<Vec<Effect>> {
        use crate::CallbackAction as A;

        let effects = match action {
            A::TotalExpenses => vec![Effect::ShowTotals, Effect::ShowMainMenu, Effect::ClearLog],
            A::LastExpenses => vec![
                Effect::ShowLastExpenses,
                Effect::ShowMainMenu,
                Effect::ClearLog,
            ],
            A::DeleteMenu => vec![Effect::ShowDeleteCandidates, Effect::ClearLog],
            A::DeleteExpense(req) => vec![
                Effect::DeleteExpense(*req),
                Effect::ShowMainMenu,
                Effect::ClearLog,
            ],
            _ => return None,
        };
        Some(effects)
    }
}
