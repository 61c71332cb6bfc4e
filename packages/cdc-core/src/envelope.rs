//! Debezium change envelope decoding.
//!
//! Wire format:
//! ```json
//! {
//!   "payload": {
//!     "before": null,
//!     "after": {"id": "...", "content": "hi", "status": "pending",
//!               "created_at": 1700000000000, "updated_at": 1700000000000},
//!     "op": "c"
//!   }
//! }
//! ```
//! Every other top-level or payload field (`schema`, `source`, `ts_ms`, ...)
//! is ignored. A missing or `null` payload decodes to an empty envelope with
//! an unknown operation.

use serde::{Deserialize, Deserializer};

use crate::error::DecodeError;

/// Row mutation kind carried in the `op` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Row inserted (`c`)
    Create,
    /// Row updated (`u`)
    Update,
    /// Row deleted (`d`)
    Delete,
    /// Row read during a snapshot (`r`)
    Read,
    /// Any other code, kept verbatim
    Unknown(String),
}

impl Operation {
    /// Maps a wire code to an operation.
    pub fn from_code(code: &str) -> Self {
        match code {
            "c" => Operation::Create,
            "u" => Operation::Update,
            "d" => Operation::Delete,
            "r" => Operation::Read,
            other => Operation::Unknown(other.to_string()),
        }
    }

    /// Returns the wire code for this operation.
    pub fn code(&self) -> &str {
        match self {
            Operation::Create => "c",
            Operation::Update => "u",
            Operation::Delete => "d",
            Operation::Read => "r",
            Operation::Unknown(code) => code,
        }
    }
}

impl Default for Operation {
    fn default() -> Self {
        Operation::Unknown(String::new())
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = Option::<String>::deserialize(deserializer)?;
        Ok(code.map(|c| Operation::from_code(&c)).unwrap_or_default())
    }
}

/// Point-in-time view of one `messages` row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RowSnapshot {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub created_at: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub updated_at: i64,
}

impl RowSnapshot {
    /// Returns true if the row is waiting to be picked up.
    pub fn is_pending(&self) -> bool {
        self.status == "pending"
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decoded change event for a single log record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChangeEnvelope {
    #[serde(default, rename = "op")]
    pub operation: Operation,
    #[serde(default)]
    pub before: Option<RowSnapshot>,
    #[serde(default)]
    pub after: Option<RowSnapshot>,
}

#[derive(Deserialize)]
struct Wire {
    #[serde(default)]
    payload: Option<ChangeEnvelope>,
}

/// Decodes a raw record value into a change envelope.
pub fn decode(raw: &[u8]) -> Result<ChangeEnvelope, DecodeError> {
    serde_json::from_slice::<Wire>(raw)
        .map(|wire| wire.payload.unwrap_or_default())
        .map_err(|e| DecodeError::from_json(&e, raw.len()))
}
