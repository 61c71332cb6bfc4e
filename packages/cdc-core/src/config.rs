//! Consumer configuration.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Topic name following the Debezium convention `<connector>.<schema>.<table>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicName {
    /// Connector name (`name` of the Debezium connector)
    pub connector: String,
    /// Database schema
    pub schema: String,
    /// Captured table
    pub table: String,
}

impl TopicName {
    pub fn new(
        connector: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            connector: connector.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl FromStr for TopicName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Connector names may contain dots of their own; schema and table are
        // always the last two segments.
        let mut parts = s.rsplitn(3, '.');
        let (Some(table), Some(schema), Some(connector)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(ConfigError::InvalidTopic(s.to_string()));
        };
        if connector.is_empty() || schema.is_empty() || table.is_empty() {
            return Err(ConfigError::InvalidTopic(s.to_string()));
        }
        Ok(TopicName::new(connector, schema, table))
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.connector, self.schema, self.table)
    }
}

impl Default for TopicName {
    fn default() -> Self {
        TopicName::new("postgres-connector", "public", "messages")
    }
}

/// Where a new consumer group starts reading when it has no committed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartOffset {
    /// Oldest retained record
    #[default]
    Earliest,
    /// Only records produced after joining
    Latest,
}

impl StartOffset {
    /// Value for the `auto.offset.reset` client property.
    pub fn as_str(&self) -> &'static str {
        match self {
            StartOffset::Earliest => "earliest",
            StartOffset::Latest => "latest",
        }
    }
}

impl FromStr for StartOffset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "earliest" | "first" => Ok(StartOffset::Earliest),
            "latest" | "last" => Ok(StartOffset::Latest),
            _ => Err(ConfigError::UnknownStartOffset(s.to_string())),
        }
    }
}

/// Smallest `fetch.max.bytes` the client accepts: its default
/// `message.max.bytes`.
pub const MIN_FETCH_MAX_BYTES: usize = 1_000_000;

/// Consumer configuration.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Broker bootstrap addresses
    pub brokers: Vec<String>,
    /// Topic carrying the change events
    pub topic: TopicName,
    /// Consumer group id
    pub group_id: String,
    /// Offset to start from when the group has none committed
    pub start_offset: StartOffset,
    /// Minimum bytes the broker accumulates before answering a fetch
    pub fetch_min_bytes: usize,
    /// Maximum bytes returned by a single fetch
    pub fetch_max_bytes: usize,
    /// Group session timeout in milliseconds
    pub session_timeout_ms: u64,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:9092".to_string()],
            topic: TopicName::default(),
            group_id: "cdc-consumer-group".to_string(),
            start_offset: StartOffset::Earliest,
            fetch_min_bytes: 1,
            fetch_max_bytes: 10_000_000, // 10 MB
            session_timeout_ms: 10_000,
        }
    }
}

impl ConsumerConfig {
    /// Checks the configuration for values the transport would reject.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.brokers.iter().all(|b| b.trim().is_empty()) {
            return Err(ConfigError::NoBrokers);
        }
        if self.group_id.trim().is_empty() {
            return Err(ConfigError::EmptyGroupId);
        }
        if self.fetch_min_bytes == 0
            || self.fetch_min_bytes > self.fetch_max_bytes
            || self.fetch_max_bytes < MIN_FETCH_MAX_BYTES
        {
            return Err(ConfigError::InvalidFetchBounds {
                min: self.fetch_min_bytes,
                max: self.fetch_max_bytes,
            });
        }
        Ok(())
    }

    /// Comma-separated broker list for the `bootstrap.servers` property.
    pub fn bootstrap_servers(&self) -> String {
        self.brokers
            .iter()
            .map(|b| b.trim())
            .filter(|b| !b.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }
}
