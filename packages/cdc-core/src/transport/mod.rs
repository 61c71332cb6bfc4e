//! Log transport boundary.
//!
//! A transport owns the read cursor: consumer-group membership, partition
//! assignment and offset commits all live behind it. The event loop only asks
//! for the next record.

mod channel;
#[cfg(feature = "kafka")]
mod kafka;
mod lines;

pub use channel::ChannelTransport;
#[cfg(feature = "kafka")]
pub use kafka::KafkaTransport;
pub use lines::LineTransport;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::shutdown::CancellationToken;

/// One record read from the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    /// Record value; `None` for a tombstone
    pub payload: Option<Vec<u8>>,
}

impl LogRecord {
    /// Creates a record with the given value at partition 0.
    pub fn new(topic: impl Into<String>, offset: i64, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            partition: 0,
            offset,
            key: None,
            payload: Some(payload.into()),
        }
    }

    /// Creates a tombstone (a record without a value).
    pub fn tombstone(topic: impl Into<String>, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition: 0,
            offset,
            key: None,
            payload: None,
        }
    }
}

/// Source of log records.
#[async_trait]
pub trait LogTransport: Send {
    /// Waits for the next record.
    ///
    /// Must return [`TransportError::Cancelled`] promptly once `cancel` fires,
    /// even if no record arrives.
    async fn next(&mut self, cancel: &CancellationToken) -> Result<LogRecord, TransportError>;

    /// Releases the read cursor. Called exactly once, after the last read.
    async fn close(&mut self);
}

#[async_trait]
impl<T: LogTransport + ?Sized> LogTransport for Box<T> {
    async fn next(&mut self, cancel: &CancellationToken) -> Result<LogRecord, TransportError> {
        (**self).next(cancel).await
    }

    async fn close(&mut self) {
        (**self).close().await
    }
}
