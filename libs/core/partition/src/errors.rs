// [libs/core/partition/src/errors.rs]
use fleetscan_infra_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PartitionError {
    #[error("[L2_PARTITION_STORE_FAULT]: {0}")]
    Store(#[from] StoreError),

    /// A document in the collection is missing the configured split field.
    #[error("[L2_PARTITION_KEY_FAULT]: document '{0}' has no value for split field '{1}'")]
    EmptyKeyField(String, String),

    #[error("[L2_PARTITION_ORDER_FAULT]: {0}")]
    Ordering(#[from] fleetscan_domain_models::KeyOrdering),
}
