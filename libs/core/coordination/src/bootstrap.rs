// [libs/core/coordination/src/bootstrap.rs]
/*!
 * First-access bootstrap: creates the `(collection, field)` work table if
 * it does not exist yet. A `DuplicateKey` race from a concurrent bootstrap
 * is treated as success — exactly one writer "wins" the insert, everyone
 * else observes the row it created.
 */

use crate::errors::CoordinationError;
use chrono::Utc;
use fleetscan_domain_models::WorkTable;
use fleetscan_infra_store::{StoreAdapter, StoreError};
use tracing::{debug, instrument};

pub struct WorkTableBootstrap;

impl WorkTableBootstrap {
    #[instrument(skip(store))]
    pub async fn ensure_exists(
        store: &dyn StoreAdapter,
        collection: &str,
        field: &str,
    ) -> Result<(), CoordinationError> {
        let table = WorkTable::new(collection, field, Utc::now());

        match store.insert_work_table(&table).await {
            Ok(()) => {
                debug!("🆕 [BOOTSTRAP]: created work table ({}, {})", collection, field);
                Ok(())
            }
            Err(StoreError::DuplicateKey) => {
                debug!(
                    "♻️ [BOOTSTRAP]: work table ({}, {}) already exists",
                    collection, field
                );
                Ok(())
            }
            Err(other) => Err(CoordinationError::Store(other)),
        }
    }
}
