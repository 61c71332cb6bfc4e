//! Change-data-capture consumer core.
//!
//! Decodes Debezium row-change envelopes read from a partitioned log and
//! turns them into message notifications, with cooperative cancellation.

pub mod config;
pub mod envelope;
pub mod error;
pub mod event_loop;
pub mod notification;
pub mod shutdown;
pub mod transport;

pub use config::{ConsumerConfig, StartOffset, TopicName};
pub use envelope::{decode, ChangeEnvelope, Operation, RowSnapshot};
pub use error::{ConfigError, DecodeError, TransportError};
pub use event_loop::{ChangeEventLoop, LoopState, LoopStats};
pub use notification::{CollectingSink, Notification, NotificationSink, StdoutSink};
pub use shutdown::{spawn_signal_listener, CancellationToken};
pub use transport::{ChannelTransport, LineTransport, LogRecord, LogTransport};
