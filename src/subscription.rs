use std::collections::HashSet;

use regex::Regex;

use crate::error::ContainerError;
use crate::types::TopicPartition;

/// What the container's workers consume. Exactly one variant is chosen at
/// construction and it is immutable thereafter.
///
/// Explicit partitions are distributed across workers by the assigner; topic
/// names and patterns are passed to every worker verbatim and the broker
/// balances partitions among them.
#[derive(Debug, Clone)]
pub enum Subscription {
    /// Explicit topic/partition pairs. Duplicates are removed at
    /// construction, first-occurrence order preserved.
    Partitions(Vec<TopicPartition>),
    /// Topic names, subscribed through the consumer group.
    Topics(Vec<String>),
    /// A regex matched against topic names by the broker client.
    Pattern(String),
}

impl Subscription {
    /// Explicit topic/partition assignment. The only variant for which a
    /// recent-offset hint is meaningful.
    pub fn partitions(partitions: Vec<TopicPartition>) -> Result<Self, ContainerError> {
        if partitions.is_empty() {
            return Err(ContainerError::Configuration(
                "a list of partitions must be provided".into(),
            ));
        }

        // Dedup while preserving insertion order of the first occurrence.
        let mut seen = HashSet::with_capacity(partitions.len());
        let deduped: Vec<TopicPartition> = partitions
            .into_iter()
            .filter(|tp| seen.insert(tp.clone()))
            .collect();

        Ok(Self::Partitions(deduped))
    }

    pub fn topics(topics: Vec<String>) -> Result<Self, ContainerError> {
        if topics.is_empty() {
            return Err(ContainerError::Configuration(
                "a list of topics must be provided".into(),
            ));
        }
        if topics.iter().any(|t| t.trim().is_empty()) {
            return Err(ContainerError::Configuration(
                "topic names cannot be blank".into(),
            ));
        }
        Ok(Self::Topics(topics))
    }

    /// A topic-name pattern. Validated eagerly so a bad regex fails here
    /// rather than inside the broker client at start time.
    pub fn pattern(pattern: &str) -> Result<Self, ContainerError> {
        Regex::new(pattern).map_err(|e| {
            ContainerError::Configuration(format!("invalid topic pattern {pattern:?}: {e}"))
        })?;
        Ok(Self::Pattern(pattern.to_string()))
    }

    /// The explicit partition list, if this is a partition subscription.
    pub fn explicit_partitions(&self) -> Option<&[TopicPartition]> {
        match self {
            Self::Partitions(partitions) => Some(partitions),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Partitions(_) => "partitions",
            Self::Topics(_) => "topics",
            Self::Pattern(_) => "pattern",
        }
    }
}
