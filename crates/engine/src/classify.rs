//! Intent classification: raw delivery in, [`Event`] out.

use api_types::Delivery;

use crate::{EngineError, Event, ResultEngine};

/// Parses a raw webhook body and classifies it.
///
/// Bodies that are not JSON, or JSON without a known shape, are
/// [`EngineError::UnclassifiableEvent`].
pub fn parse_delivery(body: &[u8]) -> ResultEngine<Event> {
    let delivery: Delivery = serde_json::from_slice(body)
        .map_err(|err| EngineError::UnclassifiableEvent(format!("invalid payload: {err}")))?;
    classify(delivery)
}

/// A populated callback wins over a message; neither is an error.
pub fn classify(delivery: Delivery) -> ResultEngine<Event> {
    if let Some(query) = delivery.callback_query {
        return Ok(Event::ButtonCallback {
            from: query.from.id,
            data: query.data.unwrap_or_default(),
            source_message_id: query.message.map(|m| m.message_id),
        });
    }

    if let Some(message) = delivery.message {
        return Ok(Event::TextMessage {
            from: message.chat.id,
            text: message.text.unwrap_or_default(),
        });
    }

    Err(EngineError::UnclassifiableEvent(
        "delivery has neither callback_query nor message".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_payload_is_a_button_callback() {
        let body = br#"{"callback_query": {"from": {"id": 7}, "data": "categoryFood", "message": {"message_id": 12}}}"#;
        assert_eq!(
            parse_delivery(body).unwrap(),
            Event::ButtonCallback {
                from: 7,
                data: "categoryFood".to_string(),
                source_message_id: Some(12),
            }
        );
    }

    #[test]
    fn message_payload_is_a_text_message() {
        let body = br#"{"message": {"chat": {"id": 7}, "text": "Milk and bread"}}"#;
        assert_eq!(
            parse_delivery(body).unwrap(),
            Event::TextMessage {
                from: 7,
                text: "Milk and bread".to_string(),
            }
        );
    }

    #[test]
    fn callback_takes_precedence_over_message() {
        let body = br#"{
            "callback_query": {"from": {"id": 1}, "data": "totalExpenses"},
            "message": {"chat": {"id": 2}, "text": "hi"}
        }"#;
        assert!(matches!(
            parse_delivery(body).unwrap(),
            Event::ButtonCallback { from: 1, .. }
        ));
    }

    #[test]
    fn unknown_shapes_are_rejected() {
        assert!(matches!(
            parse_delivery(br#"{"edited_message": {}}"#),
            Err(EngineError::UnclassifiableEvent(_))
        ));
        assert!(matches!(
            parse_delivery(b"not json"),
            Err(EngineError::UnclassifiableEvent(_))
        ));
    }
}
