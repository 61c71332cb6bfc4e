//! Shared fixtures for the integration tests.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;

use cdc_core::{
    CancellationToken, ChangeEventLoop, ChannelTransport, CollectingSink, LogRecord, LogTransport,
    LoopStats, Notification, NotificationSink, TransportError,
};

pub const TOPIC: &str = "postgres-connector.public.messages";

/// Upper bound for any loop run in these tests.
pub const LOOP_DEADLINE: Duration = Duration::from_secs(2);

/// Builds a Debezium row snapshot.
pub fn row(id: &str, content: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "content": content,
        "status": status,
        "created_at": 1_700_000_000_000_i64,
        "updated_at": 1_700_000_000_000_i64,
    })
}

/// Builds the raw bytes of a change envelope.
pub fn envelope(
    op: &str,
    before: Option<serde_json::Value>,
    after: Option<serde_json::Value>,
) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "payload": {
            "before": before,
            "after": after,
            "op": op,
            "ts_ms": 1_700_000_000_123_i64,
        }
    }))
    .unwrap()
}

/// Channel transport that counts reads and closes.
pub struct CountingTransport {
    inner: ChannelTransport,
    pub reads: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

#[async_trait]
impl LogTransport for CountingTransport {
    async fn next(&mut self, cancel: &CancellationToken) -> Result<LogRecord, TransportError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.next(cancel).await
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close().await;
    }
}

/// Handles kept by a test after the loop is built.
pub struct Harness {
    pub tx: mpsc::Sender<Result<LogRecord, TransportError>>,
    pub sink: CollectingSink,
    pub cancel: CancellationToken,
    pub reads: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    next_offset: i64,
}

impl Harness {
    /// Queues a record carrying `payload`.
    pub async fn send(&mut self, payload: impl Into<Vec<u8>>) {
        let record = LogRecord::new(TOPIC, self.next_offset, payload);
        self.next_offset += 1;
        self.tx.send(Ok(record)).await.unwrap();
    }

    /// Queues a raw transport result.
    pub async fn send_result(&self, result: Result<LogRecord, TransportError>) {
        self.tx.send(result).await.unwrap();
    }
}

/// Creates a loop over a counting channel transport and a collecting sink.
pub fn harness() -> (Harness, ChangeEventLoop<CountingTransport, CollectingSink>) {
    let (tx, inner) = ChannelTransport::new(64);
    let reads = Arc::new(AtomicUsize::new(0));
    let closes = Arc::new(AtomicUsize::new(0));
    let transport = CountingTransport {
        inner,
        reads: reads.clone(),
        closes: closes.clone(),
    };
    let sink = CollectingSink::new();
    let cancel = CancellationToken::new();
    let event_loop = ChangeEventLoop::new(transport, sink.clone(), cancel.clone());

    (
        Harness {
            tx,
            sink,
            cancel,
            reads,
            closes,
            next_offset: 0,
        },
        event_loop,
    )
}

/// Runs the loop until every queued record has been handled, then cancels it.
pub async fn drain<T, S>(event_loop: ChangeEventLoop<T, S>, expected_records: u64) -> LoopStats
where
    T: LogTransport,
    S: NotificationSink,
{
    let mut event_loop = event_loop;
    tokio::time::timeout(LOOP_DEADLINE, async {
        while event_loop.stats().records + event_loop.stats().read_failures < expected_records {
            event_loop.tick().await;
        }
    })
    .await
    .expect("loop did not consume the queued records in time");

    event_loop.cancellation_token().cancel();
    tokio::time::timeout(LOOP_DEADLINE, event_loop.run())
        .await
        .expect("loop did not stop after cancellation")
}

/// Sink whose writes always fail.
pub struct FailingSink;

impl NotificationSink for FailingSink {
    fn emit(&mut self, _notification: &Notification) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"))
    }
}
