pub const LIVE_WORKERS_GAUGE: &str = "fanout_live_workers";
pub const CONCURRENCY_CLAMPED_COUNTER: &str = "fanout_concurrency_clamped_total";
pub const WORKER_START_FAILURES_COUNTER: &str = "fanout_worker_start_failures_total";
