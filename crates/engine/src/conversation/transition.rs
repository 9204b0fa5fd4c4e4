//! Explicit state machine.
//!
//! [`transition`] is pure: the same state and event always give the same
//! result, and every side effect is returned as an [`Effect`].

use super::{ConvContext, ConversationState, Effect, Notice, capitalize};
use crate::{CallbackAction, Event, ExpenseRecord, MoneyCents};

/// Result of a state transition
#[derive(Debug, PartialEq, Eq)]
pub struct TransitionResult {
    pub new_state: ConversationState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConversationState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    /// Back to the main menu, whatever was going on.
    fn reset() -> Self {
        Self::new(ConversationState::NoFlow).with_effect(Effect::ShowMainMenu)
    }
}

pub fn transition(
    state: &ConversationState,
    event: &Event,
    ctx: &ConvContext,
) -> TransitionResult {
    match event {
        Event::ButtonCallback { data, .. } => on_callback(state, CallbackAction::parse(data), ctx),
        Event::TextMessage { text, .. } => on_text(state, text),
    }
}

fn on_callback(
    state: &ConversationState,
    action: CallbackAction,
    ctx: &ConvContext,
) -> TransitionResult {
    use ConversationState as S;

    if let Some(effects) = Effect::menu(&action) {
        return TransitionResult::new(S::NoFlow).with_effects(effects);
    }

    match (state, action) {
        (_, CallbackAction::AddExpense) => {
            TransitionResult::new(S::AwaitingDate).with_effect(Effect::PromptDate)
        }

        (S::AwaitingDate, CallbackAction::Date(token)) => match token.date_in(ctx.timezone) {
            Some(date) => TransitionResult::new(S::AwaitingCategory { date })
                .with_effect(Effect::Notify(Notice::DateChosen(date)))
                .with_effect(Effect::PromptCategory),
            None => TransitionResult::reset(),
        },

        (S::AwaitingCategory { date }, CallbackAction::Category(category)) => {
            TransitionResult::new(S::AwaitingSubcategory {
                date: *date,
                category: category.clone(),
            })
            .with_effect(Effect::Notify(Notice::CategoryChosen(category.clone())))
            .with_effect(Effect::PromptSubcategory { category })
        }

        (S::AwaitingSubcategory { date, category }, CallbackAction::Subcategory(subcategory)) => {
            TransitionResult::new(S::AwaitingDescription {
                date: *date,
                category: category.clone(),
                subcategory: subcategory.clone(),
            })
            .with_effect(Effect::Notify(Notice::SubcategoryChosen(subcategory)))
            .with_effect(Effect::PromptDescription)
        }

        (
            S::AwaitingDetails {
                date,
                category,
                subcategory,
                description,
                value,
            },
            CallbackAction::DetailsNotAvailable,
        ) => {
            let record = ExpenseRecord::new(
                *date,
                category.clone(),
                subcategory.clone(),
                description.clone(),
                *value,
                None,
            );
            commit(record)
        }

        // Buttons nobody sends: ignore them.
        (_, CallbackAction::Unknown(_)) => TransitionResult::new(state.clone()),

        // A button from an earlier prompt.
        _ => TransitionResult::reset(),
    }
}

fn on_text(state: &ConversationState, text: &str) -> TransitionResult {
    use ConversationState as S;

    match state {
        S::AwaitingDescription {
            date,
            category,
            subcategory,
        } => TransitionResult::new(S::AwaitingValue {
            date: *date,
            category: category.clone(),
            subcategory: subcategory.clone(),
            description: capitalize(text),
        })
        .with_effect(Effect::PromptValue),

        S::AwaitingValue {
            date,
            category,
            subcategory,
            description,
        } => match text.parse::<MoneyCents>() {
            Ok(value) => TransitionResult::new(S::AwaitingDetails {
                date: *date,
                category: category.clone(),
                subcategory: subcategory.clone(),
                description: description.clone(),
                value,
            })
            .with_effect(Effect::PromptDetails),
            Err(_) => TransitionResult::new(state.clone())
                .with_effect(Effect::Notify(Notice::InvalidValue(text.to_string()))),
        },

        S::AwaitingDetails {
            date,
            category,
            subcategory,
            description,
            value,
        } => commit(ExpenseRecord::new(
            *date,
            category.clone(),
            subcategory.clone(),
            description.clone(),
            *value,
            Some(capitalize(text)),
        )),

        _ => TransitionResult::reset(),
    }
}

fn commit(record: ExpenseRecord) -> TransitionResult {
    TransitionResult::new(ConversationState::ReadyToCommit(record.clone()))
        .with_effect(Effect::Commit(record))
}
