//! Receive → decode → dispatch loop with cooperative cancellation.

use crate::envelope;
use crate::notification::{Notification, NotificationSink};
use crate::shutdown::CancellationToken;
use crate::transport::{LogRecord, LogTransport};

/// Loop state after a single iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Ready for the next read
    Running,
    /// Cancellation observed; no further reads will be issued
    Stopped,
}

/// Counters collected over the lifetime of a loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Records returned by the transport
    pub records: u64,
    /// Records that decoded into an envelope
    pub decoded: u64,
    /// Records dropped because they did not decode
    pub decode_failures: u64,
    /// Reads that failed for a reason other than cancellation
    pub read_failures: u64,
    /// Records without a value
    pub tombstones: u64,
    /// Notifications handed to the sink
    pub notifications: u64,
    /// Notifications the sink failed to write
    pub sink_failures: u64,
}

/// Single-consumer change event loop.
///
/// Owns the transport for its whole lifetime. Decode and read failures are
/// logged and skipped; only cancellation ends the loop.
pub struct ChangeEventLoop<T, S> {
    transport: T,
    sink: S,
    cancel: CancellationToken,
    stats: LoopStats,
}

impl<T, S> ChangeEventLoop<T, S>
where
    T: LogTransport,
    S: NotificationSink,
{
    /// Creates a loop reading from `transport` and writing to `sink`.
    ///
    /// # Arguments
    /// * `transport` - Log transport, closed when the loop stops
    /// * `sink` - Notification destination
    /// * `cancel` - Token that stops the loop
    pub fn new(transport: T, sink: S, cancel: CancellationToken) -> Self {
        Self {
            transport,
            sink,
            cancel,
            stats: LoopStats::default(),
        }
    }

    /// Returns a handle that stops the loop when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Counters so far.
    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Runs until cancelled, then closes the transport and returns the counters.
    pub async fn run(mut self) -> LoopStats {
        tracing::info!("Change event loop started");

        while self.tick().await == LoopState::Running {}

        self.transport.close().await;
        tracing::info!(
            "Consumer stopped: {} records, {} notifications, {} decode failures, {} read failures",
            self.stats.records,
            self.stats.notifications,
            self.stats.decode_failures,
            self.stats.read_failures
        );
        self.stats
    }

    /// Performs one read and handles its outcome.
    ///
    /// Does not close the transport; [`run`](Self::run) does that once the
    /// loop stops.
    pub async fn tick(&mut self) -> LoopState {
        if self.cancel.is_cancelled() {
            return LoopState::Stopped;
        }

        match self.transport.next(&self.cancel).await {
            Ok(record) => {
                self.handle_record(record);
                LoopState::Running
            }
            Err(e) if e.is_cancelled() || self.cancel.is_cancelled() => {
                tracing::info!("Shutting down consumer");
                LoopState::Stopped
            }
            Err(e) => {
                self.stats.read_failures += 1;
                tracing::error!("Error reading message: {}", e);
                LoopState::Running
            }
        }
    }

    fn handle_record(&mut self, record: LogRecord) {
        self.stats.records += 1;

        let Some(payload) = record.payload else {
            self.stats.tombstones += 1;
            tracing::debug!(
                "Skipping tombstone at {}[{}]@{}",
                record.topic,
                record.partition,
                record.offset
            );
            return;
        };

        let envelope = match envelope::decode(&payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.stats.decode_failures += 1;
                tracing::warn!(
                    "Error decoding message at {}[{}]@{}: {}",
                    record.topic,
                    record.partition,
                    record.offset,
                    e
                );
                return;
            }
        };
        self.stats.decoded += 1;
        tracing::debug!(
            "Decoded op '{}' at {}[{}]@{}",
            envelope.operation.code(),
            record.topic,
            record.partition,
            record.offset
        );

        if let Some(notification) = Notification::from_envelope(envelope) {
            self.dispatch(&notification);
        }
    }

    fn dispatch(&mut self, notification: &Notification) {
        match self.sink.emit(notification) {
            Ok(()) => self.stats.notifications += 1,
            Err(e) => {
                self.stats.sink_failures += 1;
                tracing::warn!(
                    "Failed to write {} notification for {}: {}",
                    notification.title(),
                    notification.id(),
                    e
                );
            }
        }
    }
}
