use envconfig::Envconfig;
use rdkafka::ClientConfig;

use crate::container::ContainerConfig;
use crate::error::ContainerError;
use crate::listener::AckMode;
use crate::subscription::Subscription;
use crate::types::TopicPartition;

/// Environment-driven configuration for a fan-out container.
///
/// Exactly one of `kafka_topics`, `kafka_topic_pattern` or `kafka_partitions`
/// must be set; `validate()` enforces the exclusivity before anything is
/// built from it.
#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(default = "localhost:9092")]
    pub kafka_hosts: String,

    #[envconfig(default = "kafka-fanout")]
    pub kafka_consumer_group: String,

    /// Comma-separated topic names.
    pub kafka_topics: Option<String>,

    /// Regex matched against topic names by the broker client.
    pub kafka_topic_pattern: Option<String>,

    /// Comma-separated `topic:partition` pairs for explicit assignment.
    pub kafka_partitions: Option<String>,

    #[envconfig(default = "1")]
    pub concurrency: usize,

    #[envconfig(default = "batch")]
    pub ack_mode: String,

    #[envconfig(default = "true")]
    pub sync_commits: bool,

    /// Only meaningful with `kafka_partitions`.
    #[envconfig(default = "0")]
    pub recent_offset: i64,

    #[envconfig(default = "1")]
    pub queue_depth: usize,

    #[envconfig(default = "earliest")]
    pub kafka_consumer_offset_reset: String,

    #[envconfig(default = "false")]
    pub kafka_tls: bool,

    pub container_name: Option<String>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ContainerError> {
        if self.concurrency == 0 {
            return Err(ContainerError::Configuration(
                "concurrency must be greater than 0".into(),
            ));
        }

        let sources = [
            self.kafka_topics.is_some(),
            self.kafka_topic_pattern.is_some(),
            self.kafka_partitions.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();
        if sources != 1 {
            return Err(ContainerError::Configuration(
                "exactly one of KAFKA_TOPICS, KAFKA_TOPIC_PATTERN or KAFKA_PARTITIONS must be set"
                    .into(),
            ));
        }

        parse_ack_mode(&self.ack_mode)?;
        self.subscription()?;
        Ok(())
    }

    pub fn subscription(&self) -> Result<Subscription, ContainerError> {
        if let Some(topics) = &self.kafka_topics {
            return Subscription::topics(
                topics.split(',').map(|t| t.trim().to_string()).collect(),
            );
        }
        if let Some(pattern) = &self.kafka_topic_pattern {
            return Subscription::pattern(pattern);
        }
        if let Some(partitions) = &self.kafka_partitions {
            let parsed = partitions
                .split(',')
                .map(|entry| parse_partition(entry.trim()))
                .collect::<Result<Vec<_>, _>>()?;
            return Subscription::partitions(parsed);
        }
        Err(ContainerError::Configuration(
            "no subscription source configured".into(),
        ))
    }

    pub fn container_config(&self) -> Result<ContainerConfig, ContainerError> {
        let mut config = ContainerConfig::new()
            .with_concurrency(self.concurrency)
            .with_sync_commits(self.sync_commits)
            .with_recent_offset(self.recent_offset);
        config.ack_mode = parse_ack_mode(&self.ack_mode)?;
        config.queue_depth = self.queue_depth;
        config.name = self.container_name.clone();
        Ok(config)
    }

    /// Broker client config for the worker factory.
    pub fn client_config(&self) -> ClientConfig {
        ConsumerClientConfigBuilder::new(&self.kafka_hosts, &self.kafka_consumer_group)
            .with_tls(self.kafka_tls)
            .with_offset_reset(&self.kafka_consumer_offset_reset)
            .build()
    }
}

fn parse_partition(entry: &str) -> Result<TopicPartition, ContainerError> {
    let (topic, partition) = entry.rsplit_once(':').ok_or_else(|| {
        ContainerError::Configuration(format!(
            "partition entry {entry:?} must look like topic:partition"
        ))
    })?;
    if topic.is_empty() {
        return Err(ContainerError::Configuration(format!(
            "partition entry {entry:?} has an empty topic"
        )));
    }
    let partition: i32 = partition.parse().map_err(|_| {
        ContainerError::Configuration(format!("partition entry {entry:?} has a non-numeric index"))
    })?;
    Ok(TopicPartition::new(topic, partition))
}

fn parse_ack_mode(value: &str) -> Result<AckMode, ContainerError> {
    match value.to_ascii_lowercase().as_str() {
        "record" => Ok(AckMode::Record),
        "batch" => Ok(AckMode::Batch),
        "time" => Ok(AckMode::Time),
        "count" => Ok(AckMode::Count),
        "count_time" => Ok(AckMode::CountTime),
        "manual" => Ok(AckMode::Manual),
        "manual_immediate" => Ok(AckMode::ManualImmediate),
        other => Err(ContainerError::Configuration(format!(
            "unknown ack mode {other:?}"
        ))),
    }
}

/// Builds an `rdkafka::ClientConfig` with group-consumer defaults suitable
/// for fan-out workers: auto commit and auto offset store disabled (commits
/// are owned by the workers), with session/heartbeat defaults.
pub struct ConsumerClientConfigBuilder {
    config: ClientConfig,
}

impl ConsumerClientConfigBuilder {
    pub fn new(bootstrap_servers: &str, group_id: &str) -> Self {
        let mut config = ClientConfig::new();

        config
            .set("bootstrap.servers", bootstrap_servers)
            .set("group.id", group_id)
            .set("enable.auto.offset.store", "false")
            .set("enable.auto.commit", "false")
            .set("socket.timeout.ms", "10000")
            .set("session.timeout.ms", "60000")
            .set("heartbeat.interval.ms", "5000")
            .set("max.poll.interval.ms", "300000");

        Self { config }
    }

    pub fn with_tls(mut self, enabled: bool) -> Self {
        if enabled {
            self.config
                .set("security.protocol", "ssl")
                .set("enable.ssl.certificate.verification", "false");
        }
        self
    }

    pub fn with_offset_reset(mut self, policy: &str) -> Self {
        self.config.set("auto.offset.reset", policy);
        self
    }

    /// Add any custom configuration.
    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.config.set(key, value);
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::init_from_hashmap(&map).unwrap()
    }

    #[test]
    fn test_defaults_require_a_subscription_source() {
        let config = config_from(&[]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_topics_subscription_from_env() {
        let config = config_from(&[("KAFKA_TOPICS", "events, clicks"), ("CONCURRENCY", "4")]);
        config.validate().unwrap();

        match config.subscription().unwrap() {
            Subscription::Topics(topics) => {
                assert_eq!(topics, vec!["events".to_string(), "clicks".to_string()])
            }
            other => panic!("expected topics, got {}", other.kind()),
        }
        assert_eq!(config.container_config().unwrap().concurrency, 4);
    }

    #[test]
    fn test_explicit_partitions_from_env() {
        let config = config_from(&[
            ("KAFKA_PARTITIONS", "events:0,events:1,clicks:0"),
            ("RECENT_OFFSET", "100"),
        ]);
        config.validate().unwrap();

        let subscription = config.subscription().unwrap();
        assert_eq!(
            subscription.explicit_partitions().unwrap(),
            &[
                TopicPartition::new("events", 0),
                TopicPartition::new("events", 1),
                TopicPartition::new("clicks", 0),
            ]
        );
        assert_eq!(config.container_config().unwrap().recent_offset, 100);
    }

    #[test]
    fn test_multiple_subscription_sources_rejected() {
        let config = config_from(&[
            ("KAFKA_TOPICS", "events"),
            ("KAFKA_TOPIC_PATTERN", "^events-.*"),
        ]);
        assert!(matches!(
            config.validate(),
            Err(ContainerError::Configuration(_))
        ));
    }

    #[test]
    fn test_malformed_partition_entries_rejected() {
        for entry in ["events", "events:abc", ":0"] {
            let config = config_from(&[("KAFKA_PARTITIONS", entry)]);
            assert!(config.validate().is_err(), "accepted {entry:?}");
        }
    }

    #[test]
    fn test_ack_mode_parsing() {
        assert_eq!(parse_ack_mode("BATCH").unwrap(), AckMode::Batch);
        assert_eq!(
            parse_ack_mode("manual_immediate").unwrap(),
            AckMode::ManualImmediate
        );
        assert!(parse_ack_mode("bogus").is_err());
    }

    #[test]
    fn test_client_config_disables_auto_commit() {
        let config = config_from(&[("KAFKA_TOPICS", "events")]);
        let client = config.client_config();
        assert_eq!(client.get("enable.auto.commit"), Some("false"));
        assert_eq!(client.get("enable.auto.offset.store"), Some("false"));
        assert_eq!(client.get("group.id"), Some("kafka-fanout"));
    }
}
