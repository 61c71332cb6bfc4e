//! Replay transport reading newline-delimited envelopes.
//!
//! Useful for replaying a captured topic dump (`kcat -e -C -t ... > dump.jsonl`)
//! without a broker.

use std::path::Path;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Split};

use super::{LogRecord, LogTransport};
use crate::error::TransportError;
use crate::shutdown::CancellationToken;

/// Yields each non-empty input line as one record on partition 0.
///
/// The record offset is the zero-based line number in the input. Lines are
/// handed over as raw bytes, so invalid UTF-8 surfaces as a decode failure.
pub struct LineTransport<R> {
    lines: Split<R>,
    topic: String,
    line_no: i64,
    exhausted: bool,
    cancel_on_eof: bool,
}

impl<R> LineTransport<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    /// Creates a transport over any buffered reader.
    pub fn new(reader: R, topic: impl Into<String>) -> Self {
        Self {
            lines: reader.split(b'\n'),
            topic: topic.into(),
            line_no: 0,
            exhausted: false,
            cancel_on_eof: false,
        }
    }

    /// Cancel the loop once the input is exhausted instead of idling.
    pub fn cancel_on_eof(mut self, enabled: bool) -> Self {
        self.cancel_on_eof = enabled;
        self
    }

    async fn idle(&mut self, cancel: &CancellationToken) -> TransportError {
        if self.cancel_on_eof && cancel.cancel() {
            tracing::info!("Replay input exhausted after {} lines", self.line_no);
        }
        cancel.cancelled().await;
        TransportError::Cancelled
    }
}

impl LineTransport<BufReader<tokio::fs::File>> {
    /// Opens a replay file.
    pub async fn open(path: impl AsRef<Path>, topic: impl Into<String>) -> std::io::Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Self::new(BufReader::new(file), topic))
    }
}

#[async_trait]
impl<R> LogTransport for LineTransport<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next(&mut self, cancel: &CancellationToken) -> Result<LogRecord, TransportError> {
        loop {
            if self.exhausted {
                return Err(self.idle(cancel).await);
            }
            let line = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TransportError::Cancelled),
                line = self.lines.next_segment() => line,
            };
            let offset = self.line_no;
            let mut line = match line {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.exhausted = true;
                    continue;
                }
                Err(e) => {
                    self.line_no += 1;
                    return Err(e.into());
                }
            };
            self.line_no += 1;
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Ok(LogRecord::new(self.topic.clone(), offset, line));
        }
    }

    async fn close(&mut self) {
        tracing::debug!("Replay transport closed at line {}", self.line_no);
    }
}
