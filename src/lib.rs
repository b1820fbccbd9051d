//! Concurrent partition fan-out manager for Kafka consumer groups.
//!
//! Given a subscription (explicit topic/partition list, topic names, or a
//! topic-name pattern) and a concurrency level, [`ConcurrentContainer`]
//! creates and supervises N independent consumer workers and coordinates
//! their lifecycle as one logical unit. Explicit partitions are split into
//! contiguous per-worker subsets so every partition is consumed by exactly
//! one worker and per-partition ordering is preserved.
//!
//! The per-worker poll/commit/retry loop is a collaborator behind the
//! [`ContainerWorker`] and [`WorkerFactory`] traits; this crate owns only
//! assignment correctness, lifecycle transitions and policy propagation.

pub mod assignment;
pub mod config;
pub mod container;
pub mod error;
pub mod listener;
pub mod metrics_const;
pub mod subscription;
pub mod types;
pub mod worker;

pub use config::{Config, ConsumerClientConfigBuilder};
pub use container::{ConcurrentContainer, ContainerConfig, ContainerState};
pub use error::ContainerError;
pub use listener::{
    AckMode, CommitCallback, ErrorHandler, MessageListener, RebalanceHandler, RetryPolicy,
};
pub use subscription::Subscription;
pub use types::TopicPartition;
pub use worker::{ContainerWorker, StopCallback, StopMetadata, WorkerFactory, WorkerSettings};
