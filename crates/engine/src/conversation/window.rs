//! Trailing-window inference.
//!
//! The step is read off the shape of the last events in the log. The rules
//! are checked in order and the first match wins; they are kept exactly as
//! older logs expect them, including their blind spots (an interleaved
//! menu press breaks the flow).

use super::{ConvContext, Effect, Notice, capitalize};
use crate::{
    CATEGORY_MARKER, CallbackAction, DATE_MARKER, EngineError, Event, ExpenseRecord, MoneyCents,
    ResultEngine, SUBCATEGORY_MARKER,
};

/// Events looked at to infer the step.
pub const INFERENCE_WINDOW: usize = 5;
/// Events needed to assemble a record: the date press plus the five above.
pub const COMMIT_WINDOW: usize = 6;

/// Step inferred from a text message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WindowState {
    NoFlow,
    /// The text was the description.
    AwaitingValue,
    /// The text was a valid value.
    AwaitingDetails,
    /// The text was meant as the value but is not a number. The flow stays
    /// where it was.
    ValueRejected(String),
    /// The text was the details.
    ReadyToCommit,
}

/// What to do for the last event of a window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LegacyStep {
    Effects(Vec<Effect>),
    /// Assemble the record from the last [`COMMIT_WINDOW`] events and write it.
    Commit,
}

/// `n`-th event from the end, 1-based.
fn back(window: &[Event], n: usize) -> Option<&Event> {
    window.len().checked_sub(n).map(|i| &window[i])
}

fn is_text(window: &[Event], n: usize) -> bool {
    back(window, n).is_some_and(Event::is_text)
}

fn has_marker(window: &[Event], n: usize, marker: &str) -> bool {
    back(window, n).is_some_and(|e| e.callback_contains(marker))
}

/// Infers the step from a window whose last event is a text message.
pub fn infer(window: &[Event]) -> WindowState {
    if !is_text(window, 1) {
        return WindowState::NoFlow;
    }

    if has_marker(window, 3, CATEGORY_MARKER) && has_marker(window, 2, SUBCATEGORY_MARKER) {
        return WindowState::AwaitingValue;
    }

    if is_text(window, 2)
        && has_marker(window, 4, CATEGORY_MARKER)
        && has_marker(window, 3, SUBCATEGORY_MARKER)
    {
        let text = back(window, 1).and_then(Event::text).unwrap_or_default();
        return match text.parse::<MoneyCents>() {
            Ok(_) => WindowState::AwaitingDetails,
            Err(_) => WindowState::ValueRejected(text.to_string()),
        };
    }

    if is_text(window, 2)
        && is_text(window, 3)
        && has_marker(window, 5, CATEGORY_MARKER)
        && has_marker(window, 4, SUBCATEGORY_MARKER)
    {
        return WindowState::ReadyToCommit;
    }

    WindowState::NoFlow
}

/// Effects for the last event of `window`, which holds up to
/// [`INFERENCE_WINDOW`] events in arrival order.
pub fn legacy_step(window: &[Event], ctx: &ConvContext) -> LegacyStep {
    let Some(last) = window.last() else {
        return LegacyStep::Effects(vec![Effect::ShowMainMenu]);
    };

    let Some(data) = last.callback_data() else {
        let effects = match infer(window) {
            WindowState::AwaitingValue => vec![Effect::PromptValue],
            WindowState::AwaitingDetails => vec![Effect::PromptDetails],
            WindowState::ValueRejected(text) => vec![Effect::Notify(Notice::InvalidValue(text))],
            WindowState::ReadyToCommit => return LegacyStep::Commit,
            WindowState::NoFlow => vec![Effect::ShowMainMenu],
        };
        return LegacyStep::Effects(effects);
    };

    let action = CallbackAction::parse(data);
    if let Some(effects) = Effect::menu(&action) {
        return LegacyStep::Effects(effects);
    }

    let effects = match action {
        CallbackAction::AddExpense => vec![Effect::PromptDate],
        CallbackAction::Date(token) => match token.date_in(ctx.timezone) {
            Some(date) => vec![
                Effect::Notify(Notice::DateChosen(date)),
                Effect::PromptCategory,
            ],
            None => vec![Effect::ShowMainMenu],
        },
        CallbackAction::Category(category) => vec![
            Effect::Notify(Notice::CategoryChosen(category.clone())),
            Effect::PromptSubcategory { category },
        ],
        CallbackAction::Subcategory(subcategory) => vec![
            Effect::Notify(Notice::SubcategoryChosen(subcategory)),
            Effect::PromptDescription,
        ],
        CallbackAction::DetailsNotAvailable => return LegacyStep::Commit,
        _ => vec![],
    };
    LegacyStep::Effects(effects)
}

fn callback_arg<'a>(event: &'a Event, marker: &str) -> ResultEngine<&'a str> {
    event
        .callback_data()
        .and_then(|data| data.strip_prefix(marker))
        .ok_or_else(|| EngineError::MalformedEvent(format!("expected a {marker} button")))
}

fn message_text(event: &Event, step: &str) -> ResultEngine<String> {
    event
        .text()
        .map(str::to_string)
        .ok_or_else(|| EngineError::MalformedEvent(format!("expected the {step} as text")))
}

/// Builds the record from the last [`COMMIT_WINDOW`] events: date button,
/// category button, subcategory button, description, value, then details as
/// text or the "N/A" button.
pub fn assemble(window: &[Event], ctx: &ConvContext) -> ResultEngine<ExpenseRecord> {
    let [date, category, subcategory, description, value, details] = window else {
        return Err(EngineError::InsufficientHistory {
            needed: COMMIT_WINDOW,
            found: window.len(),
        });
    };

    let millis = callback_arg(date, DATE_MARKER)?;
    let date = millis
        .parse()
        .ok()
        .and_then(|millis| crate::DateToken(millis).date_in(ctx.timezone))
        .ok_or_else(|| EngineError::MalformedEvent(format!("date token {millis}")))?;
    let category = callback_arg(category, CATEGORY_MARKER)?;
    let subcategory = callback_arg(subcategory, SUBCATEGORY_MARKER)?;
    let description = capitalize(&message_text(description, "description")?);
    let value = message_text(value, "value")?.parse::<MoneyCents>()?;
    let details = details.text().map(capitalize);

    Ok(ExpenseRecord::new(
        date,
        category,
        subcategory,
        description,
        value,
        details,
    ))
}
