//! CSV record source for action-publisher
//!
//! Streams `Action` records out of a headered CSV file:
//!
//! ```text
//! user_id,action,item_id,price,timestamp
//! 1001,view,17,,2024-01-01T00:00:00Z
//! 1001,purchase,17,9.99,1704067260000
//! ```
//!
//! `item_id` and `price` may be empty. Timestamps are RFC 3339 or epoch
//! milliseconds. Malformed rows are skipped with a warning. In repeat mode
//! the file is replayed from the top whenever it is exhausted.

mod error;
mod source;

pub use error::CsvSourceError;
pub use source::{CsvActionSource, CsvSourceConfig};
