//! The worker collaborator contract.
//!
//! A worker owns one subscription (a partition subset, or the full topic
//! list/pattern) and runs its own poll/commit/retry loop. The container only
//! creates, starts and stops workers; everything else is behind these traits.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::listener::{
    AckMode, CommitCallback, ErrorHandler, LoggingCommitCallback, LoggingErrorHandler,
    MessageListener, RebalanceHandler, RecoveryCallback, RetryPolicy,
};
use crate::subscription::Subscription;

/// Metadata handed to the stop callback when a worker finishes shutting down.
#[derive(Debug, Clone)]
pub struct StopMetadata {
    pub worker_name: String,
}

/// Invoked by each worker once its shutdown completes, with `None` on clean
/// shutdown or the failure otherwise. Aggregating N completions (e.g. with a
/// countdown) is the caller's concern, not the container's.
pub type StopCallback = Arc<dyn Fn(&StopMetadata, Option<&anyhow::Error>) + Send + Sync>;

/// Snapshot of the container's policy fields, copied into each worker at
/// start. Workers never see the container's live config, so a later mutation
/// of the container has no effect on running workers.
#[derive(Clone)]
pub struct WorkerSettings {
    pub ack_mode: AckMode,
    pub ack_count: u32,
    pub ack_time: Duration,
    pub queue_depth: usize,
    pub sync_commits: bool,
    /// "Go back N records from latest" hint; only meaningful when the worker
    /// was given explicit partitions.
    pub recent_offset: i64,
    /// Always false: the container starts workers explicitly.
    pub auto_start: bool,
    /// Derived `{base}-{index}` name when the container has a base name.
    pub name: Option<String>,
    pub message_listener: Option<Arc<dyn MessageListener>>,
    pub error_handler: Arc<dyn ErrorHandler>,
    pub rebalance_handler: Option<Arc<dyn RebalanceHandler>>,
    pub commit_callback: Arc<dyn CommitCallback>,
    pub retry_policy: Option<RetryPolicy>,
    pub recovery_callback: Option<Arc<dyn RecoveryCallback>>,
    /// Runtime the worker's poll loop should run on, when not the ambient one.
    pub consumer_runtime: Option<tokio::runtime::Handle>,
    /// Runtime listener invocations should run on, when not the ambient one.
    pub listener_runtime: Option<tokio::runtime::Handle>,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            ack_mode: AckMode::default(),
            ack_count: 1,
            ack_time: Duration::from_secs(5),
            queue_depth: 1,
            sync_commits: true,
            recent_offset: 0,
            auto_start: false,
            name: None,
            message_listener: None,
            error_handler: Arc::new(LoggingErrorHandler),
            rebalance_handler: None,
            commit_callback: Arc::new(LoggingCommitCallback),
            retry_policy: None,
            recovery_callback: None,
            consumer_runtime: None,
            listener_runtime: None,
        }
    }
}

/// One supervised consumer worker.
#[async_trait]
pub trait ContainerWorker: Send + Sync {
    /// Begin polling. Must not return until the worker's own readiness is
    /// established (broker client created, partitions assigned or
    /// subscription registered), or fail loudly.
    async fn start(&self) -> Result<()>;

    /// Request shutdown and return promptly. Completion is observed through
    /// `callback`, never through this method's return.
    async fn stop(&self, callback: Option<StopCallback>);
}

/// Creates workers for the container. Implementations typically wrap an
/// `rdkafka::ClientConfig` and build a consumer per worker.
pub trait WorkerFactory: Send + Sync {
    type Worker: ContainerWorker + Send + Sync + 'static;

    fn create_worker(
        &self,
        subscription: Subscription,
        settings: WorkerSettings,
    ) -> Result<Self::Worker>;
}

/// A live worker tracked by the container: created in `start()`, removed in
/// `stop()`. The container's list is insertion-ordered so worker `i` keeps
/// the index it was named with.
pub struct WorkerHandle<W> {
    name: String,
    subscription: Subscription,
    worker: Arc<W>,
}

impl<W> WorkerHandle<W> {
    pub(crate) fn new(name: String, subscription: Subscription, worker: Arc<W>) -> Self {
        Self {
            name,
            subscription,
            worker,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    pub fn worker(&self) -> &Arc<W> {
        &self.worker
    }
}
