// [libs/core/coordination/src/errors.rs]
use fleetscan_core_partition::PartitionError;
use fleetscan_infra_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoordinationError {
    #[error("[L2_COORD_STORE_FAULT]: {0}")]
    Store(#[from] StoreError),

    #[error("[L2_COORD_PARTITION_FAULT]: {0}")]
    Partition(#[from] PartitionError),

    /// A cooperative cancellation token fired while waiting on the lease.
    #[error("[L2_COORD_CANCELLED]: acquisition interrupted by cancellation")]
    Cancelled,

    /// A caller attempted to mutate or release a lease it does not hold.
    /// Always a programming error, never a runtime race outcome.
    #[error("[L2_COORD_LEASE_FAULT]: lease not held for ({0}, {1})")]
    LeaseNotHeld(String, String),

    /// A user-supplied hook (`process`, `cleanup`, ...) returned an error.
    #[error("[L2_COORD_HOOK_FAULT]: {0}")]
    Hook(#[from] anyhow::Error),
}
