//! Shared types for action-publisher.
//!
//! This crate holds the domain record published by the pipeline (`Action`),
//! the wire representation handed to a broker (`WireMessage`) and the codec
//! converting one into the other.
//!
//! # Architecture
//!
//! ```text
//! Record Source ──▶ Action ──▶ ActionCodec::encode(action, sequence_num) ──▶ WireMessage
//!                                      │
//!                                      └── ordering key = subject id (ordering enabled only)
//! ```
//!
//! # Example
//!
//! ```
//! use action_types::{Action, ActionCodec, ActionKind, SEQUENCE_NUM_ATTRIBUTE};
//! use chrono::DateTime;
//!
//! let action = Action::new("42", ActionKind::Purchase, DateTime::from_timestamp(0, 0).unwrap());
//! let codec = ActionCodec::new(true);
//! let message = codec.encode(&action, 7);
//!
//! assert_eq!(message.attributes[SEQUENCE_NUM_ATTRIBUTE], "7");
//! assert_eq!(message.ordering_key.as_ref().map(|k| k.as_str()), Some("42"));
//! ```

pub mod action;
pub mod codec;
pub mod error;
pub mod message;

pub use action::{parse_timestamp, Action, ActionKind, SubjectId};
pub use codec::ActionCodec;
pub use error::{ActionTypesError, Result};
pub use message::{OrderingKey, WireMessage, SEQUENCE_NUM_ATTRIBUTE};
