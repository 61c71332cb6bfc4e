//! Local recovery from decode, read and sink failures.

use std::sync::atomic::Ordering;

use cdc_core::{
    CancellationToken, ChangeEventLoop, ChannelTransport, LogRecord, LoopState, TransportError,
};

use super::helpers::{drain, envelope, harness, row, FailingSink, LOOP_DEADLINE, TOPIC};

#[tokio::test]
async fn test_malformed_payload_does_not_stop_loop() {
    let (mut h, event_loop) = harness();
    h.send(b"{not json".to_vec()).await;
    h.send(envelope("c", None, Some(row("1", "hi", "pending")))).await;

    let stats = drain(event_loop, 2).await;

    assert_eq!(stats.records, 2);
    assert_eq!(stats.decode_failures, 1);
    assert_eq!(stats.decoded, 1);
    assert_eq!(h.sink.len(), 1);
    assert_eq!(h.sink.notifications()[0].id(), "1");
}

#[tokio::test]
async fn test_no_state_leaks_after_partial_envelope() {
    let (mut h, event_loop) = harness();
    // Valid JSON, wrong shape: `after.id` is a number
    let partial = br#"{"payload":{"after":{"id":1,"content":"leak","status":"pending"},"op":"c"}}"#;
    h.send(partial.to_vec()).await;
    h.send(envelope("u", None, Some(row("2", "clean", "done")))).await;

    drain(event_loop, 2).await;

    let notifications = h.sink.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].id(), "2");
    assert!(!notifications[0].to_string().contains("leak"));
}

#[tokio::test]
async fn test_read_failures_are_retried() {
    let (mut h, event_loop) = harness();
    h.send_result(Err(TransportError::Read("broker unavailable".to_string())))
        .await;
    h.send_result(Err(TransportError::Read("broker unavailable".to_string())))
        .await;
    h.send(envelope("c", None, Some(row("1", "hi", "pending")))).await;

    let stats = drain(event_loop, 3).await;

    assert_eq!(stats.read_failures, 2);
    assert_eq!(stats.records, 1);
    assert_eq!(h.sink.len(), 1);
    // Two failed reads, one record, one read that observed cancellation.
    assert!(h.reads.load(Ordering::SeqCst) >= 3);
}

#[tokio::test]
async fn test_tombstone_is_skipped() {
    let (mut h, event_loop) = harness();
    h.send(envelope("d", Some(row("1", "x", "done")), None)).await;
    h.send_result(Ok(LogRecord::tombstone(TOPIC, 1))).await;

    let stats = drain(event_loop, 2).await;

    assert_eq!(stats.tombstones, 1);
    assert_eq!(stats.decode_failures, 0);
    assert_eq!(h.sink.len(), 1);
}

#[tokio::test]
async fn test_sink_failure_is_counted_not_fatal() {
    let (tx, transport) = ChannelTransport::new(8);
    let cancel = CancellationToken::new();
    let mut event_loop = ChangeEventLoop::new(transport, FailingSink, cancel.clone());

    for offset in 0..2 {
        let payload = envelope("u", None, Some(row("1", "x", "done")));
        tx.send(Ok(LogRecord::new(TOPIC, offset, payload))).await.unwrap();
    }

    for _ in 0..2 {
        assert_eq!(event_loop.tick().await, LoopState::Running);
    }
    cancel.cancel();
    let stats = tokio::time::timeout(LOOP_DEADLINE, event_loop.run())
        .await
        .unwrap();

    assert_eq!(stats.sink_failures, 2);
    assert_eq!(stats.notifications, 0);
    assert_eq!(stats.decoded, 2);
}
