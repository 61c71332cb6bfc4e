//! Consumer error types.

use thiserror::Error;

/// Classification of a payload that could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFailure {
    /// Not well-formed JSON
    Syntax,
    /// Well-formed JSON that does not match the envelope shape
    Shape,
    /// Input ended in the middle of a value
    Truncated,
}

impl std::fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DecodeFailure::Syntax => "syntax",
            DecodeFailure::Shape => "shape",
            DecodeFailure::Truncated => "truncated",
        };
        f.write_str(name)
    }
}

/// Envelope decoding errors.
///
/// Only the payload length and the parser position are kept so a bad record
/// never ends up in the logs verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload could not be parsed into a change envelope
    #[error("Malformed envelope ({kind} error at line {line}, column {column}; {len} bytes)")]
    Malformed {
        kind: DecodeFailure,
        len: usize,
        line: usize,
        column: usize,
    },
}

impl DecodeError {
    pub(crate) fn from_json(err: &serde_json::Error, len: usize) -> Self {
        use serde_json::error::Category;

        let kind = match err.classify() {
            Category::Syntax | Category::Io => DecodeFailure::Syntax,
            Category::Data => DecodeFailure::Shape,
            Category::Eof => DecodeFailure::Truncated,
        };
        DecodeError::Malformed {
            kind,
            len,
            line: err.line(),
            column: err.column(),
        }
    }

    /// Returns the length of the payload that failed to decode.
    pub fn payload_len(&self) -> usize {
        match self {
            DecodeError::Malformed { len, .. } => *len,
        }
    }
}

/// Log transport errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The read was interrupted because cancellation was requested
    #[error("Read cancelled")]
    Cancelled,

    /// The read failed for any other reason (network, broker, I/O)
    #[error("Read failed: {0}")]
    Read(String),
}

impl TransportError {
    /// Returns true if this error was caused by cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransportError::Cancelled)
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Read(err.to_string())
    }
}

/// Invalid consumer configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No broker addresses were given
    #[error("At least one broker address is required")]
    NoBrokers,

    /// Consumer group id is empty
    #[error("Consumer group id must not be empty")]
    EmptyGroupId,

    /// Topic does not follow `<connector>.<schema>.<table>`
    #[error("Invalid topic name '{0}': expected <connector>.<schema>.<table>")]
    InvalidTopic(String),

    /// Fetch bounds are inverted, zero, or the max is below the client's message size
    #[error("Invalid fetch bounds: min {min} bytes, max {max} bytes")]
    InvalidFetchBounds { min: usize, max: usize },

    /// Unrecognized start offset
    #[error("Unknown start offset '{0}': expected 'earliest' or 'latest'")]
    UnknownStartOffset(String),
}
