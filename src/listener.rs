//! Callback surface propagated from the container to its workers.
//!
//! The container never invokes these itself (the poll loop lives in the
//! worker collaborator); it only snapshots them into each worker at start so
//! the whole fan-out shares one set of policies.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use rdkafka::error::KafkaError;
use rdkafka::message::OwnedMessage;
use rdkafka::TopicPartitionList;
use tracing::{debug, error};

/// How workers acknowledge processed records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckMode {
    /// Ack after each record.
    Record,
    /// Ack after each poll batch.
    #[default]
    Batch,
    /// Ack once the configured ack time has elapsed.
    Time,
    /// Ack once the configured ack count is reached.
    Count,
    /// Ack when either the count or the time threshold is reached.
    CountTime,
    /// The listener acks explicitly; acks are batched.
    Manual,
    /// The listener acks explicitly; acks are committed immediately.
    ManualImmediate,
}

/// Retry behavior executed inside each worker. The container only carries
/// this to the workers; it never retries anything itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: f64,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            multiplier: 2.0,
            max_backoff: Duration::from_secs(10),
        }
    }
}

/// Business logic invoked by a worker for every record it polls.
#[async_trait]
pub trait MessageListener: Send + Sync {
    async fn on_message(&self, message: OwnedMessage) -> Result<()>;
}

/// Invoked by a worker when the listener returns an error.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, error: &anyhow::Error, message: Option<&OwnedMessage>);
}

/// Default error handler: logs the full error chain and keeps going.
#[derive(Debug, Default)]
pub struct LoggingErrorHandler;

impl ErrorHandler for LoggingErrorHandler {
    fn handle(&self, err: &anyhow::Error, message: Option<&OwnedMessage>) {
        error!(error = ?err, message = ?message, "Listener failed to process message");
    }
}

/// Invoked by a worker after the retry policy is exhausted for a record.
pub trait RecoveryCallback: Send + Sync {
    fn recover(&self, message: &OwnedMessage, error: &anyhow::Error);
}

/// Notified when the broker assigns or revokes partitions for a worker.
///
/// Meaningful for topic and pattern subscriptions, where the broker balances
/// partitions across the fan-out. Default implementations do nothing.
#[async_trait]
pub trait RebalanceHandler: Send + Sync {
    async fn on_partitions_assigned(&self, _partitions: &TopicPartitionList) -> Result<()> {
        Ok(())
    }

    async fn on_partitions_revoked(&self, _partitions: &TopicPartitionList) -> Result<()> {
        Ok(())
    }
}

/// Completion callback for offset commits issued by a worker.
pub trait CommitCallback: Send + Sync {
    fn on_complete(&self, offsets: &TopicPartitionList, error: Option<&KafkaError>);
}

/// Default commit callback: success at debug, failure at error.
#[derive(Debug, Default)]
pub struct LoggingCommitCallback;

impl CommitCallback for LoggingCommitCallback {
    fn on_complete(&self, offsets: &TopicPartitionList, error: Option<&KafkaError>) {
        match error {
            None => debug!(offsets = ?offsets, "Offsets committed"),
            Some(e) => error!(error = %e, offsets = ?offsets, "Offset commit failed"),
        }
    }
}
