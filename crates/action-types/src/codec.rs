//! Action → wire message codec.
//!
//! The payload is a JSON object:
//!
//! ```text
//! {"subject":"42","action":"purchase","item_id":7,"price":9.5,"timestamp_ms":1704067200000,"extra_info":"AAAA..."}
//! ```
//!
//! `encode` is total. The payload is rendered from a `serde_json::Value`,
//! whose `Display` cannot fail, and non-finite prices become `null`.

use base64::Engine;
use serde_json::{Map, Number, Value};

use crate::action::Action;
use crate::message::{OrderingKey, WireMessage, SEQUENCE_NUM_ATTRIBUTE};

/// Stateless apart from its configuration; the same action and sequence
/// number always produce the same message.
#[derive(Debug, Clone, Default)]
pub struct ActionCodec {
    ordering_enabled: bool,
    extra_info: Option<String>,
}

impl ActionCodec {
    pub fn new(ordering_enabled: bool) -> Self {
        Self {
            ordering_enabled,
            extra_info: None,
        }
    }

    /// Pad every payload with `bytes` zero bytes (base64-encoded).
    ///
    /// Zero disables padding.
    pub fn with_extra_info_bytes(mut self, bytes: usize) -> Self {
        self.extra_info = (bytes > 0)
            .then(|| base64::engine::general_purpose::STANDARD.encode(vec![0u8; bytes]));
        self
    }

    pub fn ordering_enabled(&self) -> bool {
        self.ordering_enabled
    }

    pub fn encode(&self, action: &Action, sequence_num: u64) -> WireMessage {
        WireMessage::new(self.payload(action).into_bytes())
            .with_attribute(SEQUENCE_NUM_ATTRIBUTE, sequence_num.to_string())
            .with_ordering_key(self.ordering_key(action, sequence_num))
    }

    fn ordering_key(&self, action: &Action, sequence_num: u64) -> Option<OrderingKey> {
        if !self.ordering_enabled {
            return None;
        }
        let key = OrderingKey::new(action.subject.as_str());
        if key.is_none() {
            tracing::warn!(
                sequence_num,
                "Action has an empty subject; publishing without an ordering key"
            );
        }
        key
    }

    fn payload(&self, action: &Action) -> String {
        let mut object = Map::new();
        object.insert(
            "subject".to_string(),
            Value::String(action.subject.as_str().to_string()),
        );
        object.insert(
            "action".to_string(),
            Value::String(action.kind.as_str().to_string()),
        );
        object.insert(
            "item_id".to_string(),
            action.item_id.map_or(Value::Null, Value::from),
        );
        object.insert(
            "price".to_string(),
            action
                .price
                .and_then(Number::from_f64)
                .map_or(Value::Null, Value::Number),
        );
        object.insert(
            "timestamp_ms".to_string(),
            Value::from(action.timestamp.timestamp_millis()),
        );
        if let Some(extra_info) = &self.extra_info {
            object.insert("extra_info".to_string(), Value::String(extra_info.clone()));
        }
        Value::Object(object).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, SubjectId};
    use chrono::DateTime;

    fn action(subject: &str) -> Action {
        Action::new(
            subject,
            ActionKind::Purchase,
            DateTime::from_timestamp(1_704_067_200, 0).unwrap(),
        )
        .with_item(7)
        .with_price(9.5)
    }

    #[test]
    fn test_encode_without_ordering() {
        let message = ActionCodec::new(false).encode(&action("u1"), 3);

        assert_eq!(message.sequence_num(), Some(3));
        assert_eq!(message.attributes[SEQUENCE_NUM_ATTRIBUTE], "3");
        assert!(message.ordering_key.is_none());
    }

    #[test]
    fn test_encode_with_ordering_uses_subject() {
        let message = ActionCodec::new(true).encode(&action("u1"), 0);
        assert_eq!(message.ordering_key, OrderingKey::new("u1"));

        let numeric = Action::new(
            SubjectId::from(1001_i64),
            ActionKind::View,
            DateTime::from_timestamp(0, 0).unwrap(),
        );
        let message = ActionCodec::new(true).encode(&numeric, 1);
        assert_eq!(message.ordering_key.unwrap().as_str(), "1001");
    }

    #[test]
    fn test_empty_subject_gets_no_ordering_key() {
        let message = ActionCodec::new(true).encode(&action("  "), 5);
        assert!(message.ordering_key.is_none());
        assert_eq!(message.sequence_num(), Some(5));
    }

    #[test]
    fn test_payload_fields() {
        let message = ActionCodec::new(false).encode(&action("u1"), 0);
        let payload: Value = serde_json::from_slice(&message.payload).unwrap();

        assert_eq!(payload["subject"], "u1");
        assert_eq!(payload["action"], "purchase");
        assert_eq!(payload["item_id"], 7);
        assert_eq!(payload["price"], 9.5);
        assert_eq!(payload["timestamp_ms"], 1_704_067_200_000_i64);
        assert!(payload.get("extra_info").is_none());
    }

    #[test]
    fn test_action_names_in_payload() {
        let codec = ActionCodec::new(false);
        for kind in [
            ActionKind::View,
            ActionKind::AddToCart,
            ActionKind::RemoveFromCart,
            ActionKind::Purchase,
        ] {
            let a = Action::new("u1", kind, DateTime::from_timestamp(0, 0).unwrap());
            let payload: Value = serde_json::from_slice(&codec.encode(&a, 0).payload).unwrap();
            let name = payload["action"].as_str().unwrap();
            assert_eq!(name.parse::<ActionKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_non_finite_price_is_null() {
        let mut a = action("u1");
        a.price = Some(f64::NAN);
        let message = ActionCodec::new(false).encode(&a, 0);
        let payload: Value = serde_json::from_slice(&message.payload).unwrap();
        assert!(payload["price"].is_null());
    }

    #[test]
    fn test_extra_info_padding() {
        let codec = ActionCodec::new(false).with_extra_info_bytes(1024);
        let message = codec.encode(&action("u1"), 0);
        let payload: Value = serde_json::from_slice(&message.payload).unwrap();

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(payload["extra_info"].as_str().unwrap())
            .unwrap();
        assert_eq!(decoded.len(), 1024);
        assert!(decoded.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let codec = ActionCodec::new(true).with_extra_info_bytes(16);
        assert_eq!(codec.encode(&action("u2"), 9), codec.encode(&action("u2"), 9));
    }
}
