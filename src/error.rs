use thiserror::Error;

/// Errors surfaced by the fan-out container.
///
/// Worker stop failures are intentionally absent: they are reported per
/// worker through the stop callback and never fail the container's `stop()`.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Invalid constructor arguments. Raised before any worker exists.
    #[error("invalid container configuration: {0}")]
    Configuration(String),

    /// Concurrency exceeds the number of available partitions. The container
    /// recovers from this by clamping; the assigner itself refuses it.
    #[error("concurrency {concurrency} exceeds available partitions {partitions}")]
    InvalidAssignment {
        concurrency: usize,
        partitions: usize,
    },

    /// A worker failed during `start()`. Siblings that already started are
    /// left running; the caller is expected to `stop()` to clean up.
    /// `{source:#}` keeps the full cause chain on one line.
    #[error("worker {name} failed to start: {source:#}")]
    WorkerStart { name: String, source: anyhow::Error },
}
