//! Inbound events, one per webhook delivery.

use serde::{Deserialize, Serialize};

/// A classified delivery.
///
/// Events are immutable once logged and are identified only by their
/// position in the event log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// A press on an inline keyboard button.
    ButtonCallback {
        from: i64,
        data: String,
        source_message_id: Option<i32>,
    },
    /// A free text message.
    TextMessage { from: i64, text: String },
}

impl Event {
    /// Identity of the sender. The bot talks in private chats only, so this
    /// is also the chat the replies go to.
    pub fn sender(&self) -> i64 {
        match self {
            Event::ButtonCallback { from, .. } | Event::TextMessage { from, .. } => *from,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Event::TextMessage { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Event::TextMessage { text, .. } => Some(text),
            Event::ButtonCallback { .. } => None,
        }
    }

    pub fn callback_data(&self) -> Option<&str> {
        match self {
            Event::ButtonCallback { data, .. } => Some(data),
            Event::TextMessage { .. } => None,
        }
    }

    /// `true` if this is a button press whose payload contains `marker`.
    pub fn callback_contains(&self, marker: &str) -> bool {
        self.callback_data().is_some_and(|data| data.contains(marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_a_kind_tag() {
        let event = Event::TextMessage {
            from: 1,
            text: "Milk".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "text_message");
        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn callback_marker_lookup() {
        let event = Event::ButtonCallback {
            from: 1,
            data: "subcatGroceries".to_string(),
            source_message_id: Some(3),
        };
        assert!(event.callback_contains("subcat"));
        assert!(!event.callback_contains("category"));
        assert!(!event.is_text());
        assert_eq!(event.sender(), 1);
    }
}
