//! Wire message handed to a publish client.

use std::collections::BTreeMap;
use std::fmt;

/// Attribute carrying the sequence number assigned by the publisher loop.
pub const SEQUENCE_NUM_ATTRIBUTE: &str = "sequence_num";

/// Key grouping messages that must be delivered in submission order.
///
/// Never empty: brokers disagree on whether an empty key means "no key" or
/// is invalid, so an empty candidate is simply not a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderingKey(String);

impl OrderingKey {
    /// Returns `None` for an empty candidate.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for OrderingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An encoded message ready for the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    pub payload: Vec<u8>,
    pub attributes: BTreeMap<String, String>,
    pub ordering_key: Option<OrderingKey>,
}

impl WireMessage {
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            payload,
            attributes: BTreeMap::new(),
            ordering_key: None,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_ordering_key(mut self, key: Option<OrderingKey>) -> Self {
        self.ordering_key = key;
        self
    }

    /// The sequence number attribute, if present and numeric.
    pub fn sequence_num(&self) -> Option<u64> {
        self.attributes
            .get(SEQUENCE_NUM_ATTRIBUTE)
            .and_then(|v| v.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ordering_key_is_rejected() {
        assert!(OrderingKey::new("").is_none());
        assert_eq!(OrderingKey::new("u1").unwrap().as_str(), "u1");
    }

    #[test]
    fn test_sequence_num_attribute() {
        let message = WireMessage::new(b"{}".to_vec()).with_attribute(SEQUENCE_NUM_ATTRIBUTE, "12");
        assert_eq!(message.sequence_num(), Some(12));

        let message = WireMessage::new(Vec::new()).with_attribute(SEQUENCE_NUM_ATTRIBUTE, "x");
        assert_eq!(message.sequence_num(), None);
        assert_eq!(WireMessage::new(Vec::new()).sequence_num(), None);
    }
}
