// [apps/worker-runtime/src/errors.rs]
use fleetscan_core_coordination::CoordinationError;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("[L1_WORKER_CONFIG_FAULT]: num_units must be at least 1")]
    InvalidNumUnits,

    #[error("[L1_WORKER_CONFIG_FAULT]: a liveness tunable was zero or negative")]
    InvalidTunable,
}

/// The top-level error type returned by `Worker::new`/`Worker::run`.
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("[L1_WORKER_CONFIG_FAULT]: {0}")]
    Config(#[from] ConfigError),

    #[error("[L1_WORKER_COORDINATION_FAULT]: {0}")]
    Coordination(#[from] CoordinationError),
}
