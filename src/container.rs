//! The concurrent fan-out container.
//!
//! Creates 1 or more workers based on the configured concurrency. When the
//! subscription is an explicit partition list, the partitions are distributed
//! contiguously across the workers; otherwise every worker receives the full
//! topic list or pattern and the broker balances partitions among them.
//! Messages within one partition are always processed by exactly one worker,
//! preserving per-partition ordering.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use metrics::{counter, gauge};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::assignment::partition_subsets;
use crate::error::ContainerError;
use crate::listener::{
    AckMode, CommitCallback, ErrorHandler, LoggingCommitCallback, LoggingErrorHandler,
    MessageListener, RebalanceHandler, RecoveryCallback, RetryPolicy,
};
use crate::metrics_const::{
    CONCURRENCY_CLAMPED_COUNTER, LIVE_WORKERS_GAUGE, WORKER_START_FAILURES_COUNTER,
};
use crate::subscription::Subscription;
use crate::worker::{ContainerWorker, StopCallback, WorkerFactory, WorkerHandle, WorkerSettings};

/// Shared policy set propagated verbatim to every worker at start.
///
/// Mutable until `start()`; after that the container has snapshotted the
/// fields into its workers and further mutation has no effect on them.
#[derive(Clone)]
pub struct ContainerConfig {
    /// Number of workers to run. Clamped to the partition count when an
    /// explicit partition list is smaller.
    pub concurrency: usize,
    /// Base name for workers; worker `i` becomes `{name}-{i}`.
    pub name: Option<String>,
    pub ack_mode: AckMode,
    pub ack_count: u32,
    pub ack_time: Duration,
    pub queue_depth: usize,
    /// Commit synchronously. Default true; async commits are opt-in since
    /// they have proven less reliable.
    pub sync_commits: bool,
    /// Start this many records back from latest. Only meaningful with an
    /// explicit partition subscription; ignored otherwise.
    pub recent_offset: i64,
    pub message_listener: Option<Arc<dyn MessageListener>>,
    pub error_handler: Arc<dyn ErrorHandler>,
    pub rebalance_handler: Option<Arc<dyn RebalanceHandler>>,
    pub commit_callback: Arc<dyn CommitCallback>,
    pub retry_policy: Option<RetryPolicy>,
    pub recovery_callback: Option<Arc<dyn RecoveryCallback>>,
    pub consumer_runtime: Option<tokio::runtime::Handle>,
    pub listener_runtime: Option<tokio::runtime::Handle>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            name: None,
            ack_mode: AckMode::default(),
            ack_count: 1,
            ack_time: Duration::from_secs(5),
            queue_depth: 1,
            sync_commits: true,
            recent_offset: 0,
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

impl ContainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_sync_commits(mut self, sync_commits: bool) -> Self {
        self.sync_commits = sync_commits;
        self
    }

    pub fn with_recent_offset(mut self, recent_offset: i64) -> Self {
        self.recent_offset = recent_offset;
        self
    }

    pub fn with_message_listener(mut self, listener: Arc<dyn MessageListener>) -> Self {
        self.message_listener = Some(listener);
        self
    }

    pub fn with_rebalance_handler(mut self, handler: Arc<dyn RebalanceHandler>) -> Self {
        self.rebalance_handler = Some(handler);
        self
    }

    pub fn with_commit_callback(mut self, callback: Arc<dyn CommitCallback>) -> Self {
        self.commit_callback = callback;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Snapshot this config into the settings for worker `index`.
    fn worker_settings(&self, index: usize) -> WorkerSettings {
        WorkerSettings {
            ack_mode: self.ack_mode,
            ack_count: self.ack_count,
            ack_time: self.ack_time,
            queue_depth: self.queue_depth,
            sync_commits: self.sync_commits,
            recent_offset: self.recent_offset,
            auto_start: false,
            name: self.name.as_ref().map(|base| format!("{base}-{index}")),
            message_listener: self.message_listener.clone(),
            error_handler: self.error_handler.clone(),
            rebalance_handler: self.rebalance_handler.clone(),
            commit_callback: self.commit_callback.clone(),
            retry_policy: self.retry_policy.clone(),
            recovery_callback: self.recovery_callback.clone(),
            consumer_runtime: self.consumer_runtime.clone(),
            listener_runtime: self.listener_runtime.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// State guarded by the lifecycle lock: the transition in progress and the
/// insertion-ordered list of live workers.
struct Inner<W> {
    state: ContainerState,
    effective_concurrency: usize,
    workers: Vec<WorkerHandle<W>>,
}

/// Supervises N single-subscription workers as one logical unit.
///
/// `start()` and `stop()` are serialized against each other (and against the
/// read accessors) by a single lifecycle lock held for the whole transition.
/// Both are idempotent: `start()` on a running container and `stop()` on a
/// stopped one are no-ops.
pub struct ConcurrentContainer<F: WorkerFactory> {
    factory: F,
    subscription: Subscription,
    config: ContainerConfig,
    inner: Mutex<Inner<F::Worker>>,
}

impl<F: WorkerFactory> ConcurrentContainer<F> {
    pub fn new(
        factory: F,
        subscription: Subscription,
        config: ContainerConfig,
    ) -> Result<Self, ContainerError> {
        if config.concurrency == 0 {
            return Err(ContainerError::Configuration(
                "concurrency must be greater than 0".into(),
            ));
        }

        Ok(Self {
            factory,
            subscription,
            config,
            inner: Mutex::new(Inner {
                state: ContainerState::Stopped,
                effective_concurrency: 0,
                workers: Vec::new(),
            }),
        })
    }

    /// Create and start the workers. No-op when already running.
    ///
    /// Worker starts are synchronous: this returns once every worker has
    /// established its own readiness, which may block until the broker client
    /// completes assignment or subscription. Callers needing a timeout must
    /// wrap this externally.
    ///
    /// Best-effort on failure: if a worker fails to start, the error is
    /// returned and the siblings that already started are left running.
    /// Call `stop()` to clean up.
    pub async fn start(&self) -> Result<(), ContainerError> {
        let mut inner = self.inner.lock().await;
        if inner.state == ContainerState::Running {
            return Ok(());
        }
        inner.state = ContainerState::Starting;

        let mut concurrency = self.config.concurrency;
        let subsets = match self.subscription.explicit_partitions() {
            Some(partitions) => {
                if concurrency > partitions.len() {
                    warn!(
                        requested = concurrency,
                        partitions = partitions.len(),
                        "Concurrency must not exceed the number of explicit partitions; reducing"
                    );
                    counter!(CONCURRENCY_CLAMPED_COUNTER).increment(1);
                    concurrency = partitions.len();
                }
                Some(partition_subsets(partitions, concurrency)?)
            }
            None => None,
        };

        inner.effective_concurrency = concurrency;
        // Running is set before any worker exists so that a stop() queued on
        // the lifecycle lock tears down exactly the workers appended below.
        inner.state = ContainerState::Running;
        info!(
            concurrency,
            subscription = self.subscription.kind(),
            "Starting fan-out container"
        );

        for i in 0..concurrency {
            let worker_subscription = match &subsets {
                Some(subsets) => Subscription::Partitions(subsets[i].clone()),
                None => self.subscription.clone(),
            };
            let settings = self.config.worker_settings(i);
            let name = settings
                .name
                .clone()
                .unwrap_or_else(|| format!("worker-{i}"));

            let worker = self
                .factory
                .create_worker(worker_subscription.clone(), settings)
                .map_err(|e| self.start_failure(name.clone(), e))?;
            let worker = Arc::new(worker);

            worker
                .start()
                .await
                .map_err(|e| self.start_failure(name.clone(), e))?;

            info!(worker = %name, "Worker started");
            inner
                .workers
                .push(WorkerHandle::new(name, worker_subscription, worker));
            gauge!(LIVE_WORKERS_GAUGE).set(inner.workers.len() as f64);
        }

        Ok(())
    }

    fn start_failure(&self, name: String, source: anyhow::Error) -> ContainerError {
        error!(worker = %name, error = ?source, "Worker failed to start");
        counter!(WORKER_START_FAILURES_COUNTER).increment(1);
        ContainerError::WorkerStart { name, source }
    }

    /// Signal every live worker to stop and clear the worker list. No-op
    /// when not running.
    ///
    /// Workers shut down independently and concurrently; this returns once
    /// each has been signalled, not once they have finished. Completion is
    /// observed through `callback`, invoked once per worker. A worker that
    /// fails to stop cleanly reports through its callback invocation and is
    /// still removed from the list.
    pub async fn stop(&self, callback: Option<StopCallback>) {
        let mut inner = self.inner.lock().await;
        if inner.state != ContainerState::Running {
            return;
        }
        inner.state = ContainerState::Stopping;

        let workers: Vec<WorkerHandle<F::Worker>> = inner.workers.drain(..).collect();
        info!(workers = workers.len(), "Stopping fan-out container");

        let stops = workers
            .iter()
            .map(|handle| handle.worker().stop(callback.clone()));
        join_all(stops).await;

        inner.effective_concurrency = 0;
        inner.state = ContainerState::Stopped;
        gauge!(LIVE_WORKERS_GAUGE).set(0.0);
    }

    pub async fn state(&self) -> ContainerState {
        self.inner.lock().await.state
    }

    pub async fn is_running(&self) -> bool {
        self.inner.lock().await.state == ContainerState::Running
    }

    /// Number of live workers: equals the effective concurrency while
    /// running, 0 otherwise.
    pub async fn worker_count(&self) -> usize {
        self.inner.lock().await.workers.len()
    }

    /// Concurrency actually in effect after any clamping, 0 when stopped.
    pub async fn effective_concurrency(&self) -> usize {
        self.inner.lock().await.effective_concurrency
    }

    pub async fn worker_names(&self) -> Vec<String> {
        self.inner
            .lock()
            .await
            .workers
            .iter()
            .map(|h| h.name().to_string())
            .collect()
    }
}
