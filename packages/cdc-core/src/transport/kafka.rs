//! Kafka transport backed by librdkafka.

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::Message;

use super::{LogRecord, LogTransport};
use crate::config::ConsumerConfig;
use crate::error::TransportError;
use crate::shutdown::CancellationToken;

/// Consumer-group member subscribed to a single change topic.
///
/// Offsets are auto-committed by librdkafka after each record is handed out,
/// so a record counts as consumed whether or not it decodes.
pub struct KafkaTransport {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaTransport {
    /// Creates the consumer and subscribes to the configured topic.
    pub fn connect(config: &ConsumerConfig) -> Result<Self, TransportError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", config.bootstrap_servers())
            .set("group.id", &config.group_id)
            .set("auto.offset.reset", config.start_offset.as_str())
            .set("fetch.min.bytes", config.fetch_min_bytes.to_string())
            .set("fetch.max.bytes", config.fetch_max_bytes.to_string())
            .set("session.timeout.ms", config.session_timeout_ms.to_string())
            .set("enable.auto.commit", "true")
            .set("enable.partition.eof", "false")
            .create()
            .map_err(kafka_error)?;

        let topic = config.topic.to_string();
        consumer.subscribe(&[&topic]).map_err(kafka_error)?;
        tracing::info!(
            "Subscribed to {} as group {} via {}",
            topic,
            config.group_id,
            config.bootstrap_servers()
        );

        Ok(Self { consumer, topic })
    }

    /// Returns the subscribed topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

fn kafka_error(err: KafkaError) -> TransportError {
    TransportError::Read(err.to_string())
}

#[async_trait]
impl LogTransport for KafkaTransport {
    async fn next(&mut self, cancel: &CancellationToken) -> Result<LogRecord, TransportError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            message = self.consumer.recv() => {
                let message = message.map_err(kafka_error)?;
                Ok(LogRecord {
                    topic: message.topic().to_string(),
                    partition: message.partition(),
                    offset: message.offset(),
                    key: message.key().map(<[u8]>::to_vec),
                    payload: message.payload().map(<[u8]>::to_vec),
                })
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.consumer.commit_consumer_state(CommitMode::Sync) {
            // Nothing consumed yet is the common case here.
            tracing::debug!("Final offset commit skipped: {}", e);
        }
        self.consumer.unsubscribe();
        tracing::info!("Left consumer group for {}", self.topic);
    }
}
