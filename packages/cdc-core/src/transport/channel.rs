//! In-process transport fed through a tokio channel.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{LogRecord, LogTransport};
use crate::error::TransportError;
use crate::shutdown::CancellationToken;

/// Reads records (or injected read failures) from an mpsc channel.
///
/// Once every sender is dropped the transport behaves like an idle log and
/// waits for cancellation.
pub struct ChannelTransport {
    rx: mpsc::Receiver<Result<LogRecord, TransportError>>,
    drained: bool,
    closed: bool,
}

impl ChannelTransport {
    /// Creates a transport and the sender that feeds it.
    pub fn new(capacity: usize) -> (mpsc::Sender<Result<LogRecord, TransportError>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            tx,
            Self {
                rx,
                drained: false,
                closed: false,
            },
        )
    }

    /// Returns true once [`LogTransport::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl LogTransport for ChannelTransport {
    async fn next(&mut self, cancel: &CancellationToken) -> Result<LogRecord, TransportError> {
        if self.drained {
            cancel.cancelled().await;
            return Err(TransportError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            item = self.rx.recv() => match item {
                Some(item) => item,
                None => {
                    self.drained = true;
                    cancel.cancelled().await;
                    Err(TransportError::Cancelled)
                }
            },
        }
    }

    async fn close(&mut self) {
        self.rx.close();
        self.closed = true;
    }
}
