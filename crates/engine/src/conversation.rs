//! Where a chat is in the add-expense flow, and what the bot does next.
//!
//! Two engines produce the same [`Effect`] vocabulary:
//!
//! - [`transition`] keeps an explicit [`ConversationState`] per chat;
//! - [`legacy_step`] infers the step from the trailing window of the event
//!   log, matching the rules older logs were written against.

use chrono_tz::Tz;
use serde::Deserialize;

pub use effect::{Effect, Notice};
pub use state::ConversationState;
pub use transition::{TransitionResult, transition};
pub use window::{
    COMMIT_WINDOW, INFERENCE_WINDOW, LegacyStep, WindowState, assemble, infer, legacy_step,
};

mod effect;
mod state;
mod transition;
mod window;

/// Which engine drives the conversation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Explicit,
    Legacy,
}

/// What the transition functions need to know about the deployment.
#[derive(Clone, Copy, Debug)]
pub struct ConvContext {
    /// Zone the date buttons are interpreted in.
    pub timezone: Tz,
}

/// Upper-cases the first character, leaves the rest untouched.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
