//! The domain record published by action-publisher.

use chrono::{DateTime, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

use crate::error::{ActionTypesError, Result};

/// Identifier of the user an action belongs to.
///
/// Stored in its canonical string form, which doubles as the ordering key
/// when ordered publishing is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<i64> for SubjectId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the user did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    View,
    AddToCart,
    RemoveFromCart,
    Purchase,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::View => "view",
            ActionKind::AddToCart => "add_to_cart",
            ActionKind::RemoveFromCart => "remove_from_cart",
            ActionKind::Purchase => "purchase",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ActionTypesError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "view" => Ok(ActionKind::View),
            "add_to_cart" => Ok(ActionKind::AddToCart),
            "remove_from_cart" => Ok(ActionKind::RemoveFromCart),
            "purchase" => Ok(ActionKind::Purchase),
            _ => Err(ActionTypesError::UnknownActionKind(s.to_string())),
        }
    }
}

/// A single user action.
///
/// Immutable once produced by a record source; consumed exactly once by the
/// codec.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub subject: SubjectId,
    pub kind: ActionKind,
    pub item_id: Option<i64>,
    pub price: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Action {
    pub fn new(subject: impl Into<SubjectId>, kind: ActionKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            subject: subject.into(),
            kind,
            item_id: None,
            price: None,
            timestamp,
        }
    }

    pub fn with_item(mut self, item_id: i64) -> Self {
        self.item_id = Some(item_id);
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }
}

/// Parse an action timestamp.
///
/// Accepts RFC 3339 (`2024-01-01T00:00:00Z`) or integer milliseconds since
/// the Unix epoch.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(millis) = s.parse::<i64>() {
        return Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| ActionTypesError::InvalidTimestamp(s.to_string()));
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ActionTypesError::InvalidTimestamp(s.to_string()))
}
