//! CDC consumer for the `messages` table.
//!
//! Reads Debezium change events from Kafka (or a replay file), prints a
//! notification block for each relevant change and shuts down cleanly on
//! SIGINT/SIGTERM.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use cdc_core::{
    spawn_signal_listener, CancellationToken, ChangeEventLoop, ConsumerConfig, LineTransport,
    LogTransport, StartOffset, StdoutSink, TopicName,
};

/// Command-line arguments for the consumer.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Comma-separated Kafka bootstrap servers
    #[arg(long, env = "CDC_BROKERS", value_delimiter = ',', default_value = "localhost:9092")]
    brokers: Vec<String>,

    /// Change topic (<connector>.<schema>.<table>)
    #[arg(long, env = "CDC_TOPIC", default_value = "postgres-connector.public.messages")]
    topic: String,

    /// Consumer group id
    #[arg(long, env = "CDC_GROUP_ID", default_value = "cdc-consumer-group")]
    group_id: String,

    /// Where to start without a committed offset (earliest or latest)
    #[arg(long, env = "CDC_START_OFFSET", default_value = "earliest")]
    start_offset: String,

    /// Minimum bytes per fetch
    #[arg(long, default_value_t = 1)]
    fetch_min_bytes: usize,

    /// Maximum bytes per fetch
    #[arg(long, default_value_t = 10_000_000)]
    fetch_max_bytes: usize,

    /// Replay newline-delimited envelopes from a file ("-" for stdin) instead of Kafka
    #[arg(long, env = "CDC_INPUT")]
    input: Option<PathBuf>,

    /// Stop once the replay input is exhausted
    #[arg(long, requires = "input")]
    exit_at_eof: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// Builds the consumer configuration from the parsed flags.
    fn consumer_config(&self) -> anyhow::Result<ConsumerConfig> {
        let topic: TopicName = self.topic.parse()?;
        let start_offset: StartOffset = self.start_offset.parse()?;
        let config = ConsumerConfig {
            brokers: self.brokers.clone(),
            topic,
            group_id: self.group_id.clone(),
            start_offset,
            fetch_min_bytes: self.fetch_min_bytes,
            fetch_max_bytes: self.fetch_max_bytes,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }
}

async fn open_transport(
    args: &Args,
    config: &ConsumerConfig,
) -> anyhow::Result<Box<dyn LogTransport>> {
    let topic = config.topic.to_string();
    match &args.input {
        Some(path) if path.as_os_str() == "-" => {
            tracing::info!("Replaying change events from stdin");
            let transport = LineTransport::new(BufReader::new(tokio::io::stdin()), topic)
                .cancel_on_eof(args.exit_at_eof);
            Ok(Box::new(transport))
        }
        Some(path) => {
            let transport = LineTransport::open(path, topic)
                .await
                .with_context(|| format!("Failed to open replay file {}", path.display()))?
                .cancel_on_eof(args.exit_at_eof);
            tracing::info!("Replaying change events from {}", path.display());
            Ok(Box::new(transport))
        }
        None => kafka_transport(config),
    }
}

#[cfg(feature = "kafka")]
fn kafka_transport(config: &ConsumerConfig) -> anyhow::Result<Box<dyn LogTransport>> {
    let transport = cdc_core::transport::KafkaTransport::connect(config)
        .context("Failed to create Kafka consumer")?;
    Ok(Box::new(transport))
}

#[cfg(not(feature = "kafka"))]
fn kafka_transport(_config: &ConsumerConfig) -> anyhow::Result<Box<dyn LogTransport>> {
    anyhow::bail!("built without the `kafka` feature; pass --input to replay from a file")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = args.consumer_config().context("Invalid consumer configuration")?;
    let transport = open_transport(&args, &config).await?;

    let cancel = CancellationToken::new();
    let signals = spawn_signal_listener(cancel.clone());

    tracing::info!("Consumer started, listening to topic: {}", config.topic);
    let stats = ChangeEventLoop::new(transport, StdoutSink, cancel).run().await;
    signals.abort();

    tracing::info!(
        "Consumer stopped after {} records ({} decoded, {} tombstones)",
        stats.records,
        stats.decoded,
        stats.tombstones
    );
    Ok(())
}
