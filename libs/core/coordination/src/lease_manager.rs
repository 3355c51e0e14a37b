// [libs/core/coordination/src/lease_manager.rs]
/*!
 * The advisory boolean lease on one `(collection, field)` work table.
 * `acquire` loops: try the atomic conditional update, otherwise check for
 * (and recover) a stuck lease, then back off with jitter and retry.
 */

use crate::errors::CoordinationError;
use chrono::Utc;
use fleetscan_domain_models::WorkTable;
use fleetscan_infra_store::StoreAdapter;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};

pub const BACKOFF_MILLIS: u64 = 100;
pub const MAX_LOCK_MILLIS: i64 = 1000;

pub struct LeaseManager {
    store: Arc<dyn StoreAdapter>,
    collection: String,
    field: String,
    backoff_millis: u64,
    max_lock_millis: i64,
}

impl LeaseManager {
    /// Uses the protocol's documented default tunables.
    pub fn new(store: Arc<dyn StoreAdapter>, collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self::with_tunables(store, collection, field, BACKOFF_MILLIS, MAX_LOCK_MILLIS)
    }

    pub fn with_tunables(
        store: Arc<dyn StoreAdapter>,
        collection: impl Into<String>,
        field: impl Into<String>,
        backoff_millis: u64,
        max_lock_millis: i64,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            field: field.into(),
            backoff_millis,
            max_lock_millis,
        }
    }

    /// Blocks until the lease is acquired, or until `cancellation` fires (if
    /// given). Between attempts, checks for and recovers a stuck lease.
    #[instrument(skip(self, cancellation))]
    pub async fn acquire(
        &self,
        cancellation: Option<&CancellationToken>,
    ) -> Result<LeaseGuard, CoordinationError> {
        loop {
            if cancellation.is_some_and(|token| token.is_cancelled()) {
                return Err(CoordinationError::Cancelled);
            }

            if let Some(table) = self.store.try_acquire_lease(&self.collection, &self.field).await? {
                debug!("🔑 [LEASE]: acquired ({}, {})", self.collection, self.field);
                return Ok(LeaseGuard::new(self.store.clone(), table));
            }

            self.recover_stuck_lease_if_any().await?;

            let jitter = rand::thread_rng().gen_range(0.9..=1.1_f64);
            let backoff = Duration::from_millis((self.backoff_millis as f64 * jitter) as u64);

            match cancellation {
                Some(token) => tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = token.cancelled() => return Err(CoordinationError::Cancelled),
                },
                None => tokio::time::sleep(backoff).await,
            }
        }
    }

    #[instrument(skip(self))]
    async fn recover_stuck_lease_if_any(&self) -> Result<(), CoordinationError> {
        let table = match self.store.peek_work_table(&self.collection, &self.field).await? {
            Some(table) => table,
            None => return Ok(()),
        };

        if !table.lock || table.units.is_none() {
            return Ok(());
        }

        if Utc::now() - table.ts > chrono::Duration::milliseconds(self.max_lock_millis) {
            let recovered = self
                .store
                .force_clear_stuck_lease(&self.collection, &self.field, table.ts)
                .await?;
            if recovered {
                warn!(
                    "🧟 [LEASE]: recovered stuck lease on ({}, {})",
                    self.collection, self.field
                );
            }
        }

        Ok(())
    }
}

/// Holds the post-acquire `WorkTable` snapshot. Mutate it via `table_mut`
/// and the new value is written back on `release`. If dropped without an
/// explicit `release` (early return, panic unwind), the lease is still
/// cleared via a best-effort fire-and-forget write — stuck-lock recovery
/// remains the correctness backstop, this is belt-and-suspenders.
pub struct LeaseGuard {
    store: Arc<dyn StoreAdapter>,
    table: Option<WorkTable>,
}

impl LeaseGuard {
    fn new(store: Arc<dyn StoreAdapter>, table: WorkTable) -> Self {
        Self {
            store,
            table: Some(table),
        }
    }

    pub fn table(&self) -> &WorkTable {
        self.table.as_ref().expect("lease guard used after release")
    }

    pub fn table_mut(&mut self) -> &mut WorkTable {
        self.table.as_mut().expect("lease guard used after release")
    }

    #[instrument(skip(self))]
    pub async fn release(mut self) -> Result<(), CoordinationError> {
        let mut table = self.table.take().expect("lease guard released twice");
        table.lock = false;
        table.ts = Utc::now();
        self.store.replace_work_table(&table).await?;
        debug!("🔓 [LEASE]: released ({}, {})", table.collection, table.field);
        Ok(())
    }
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        let Some(mut table) = self.table.take() else {
            return;
        };
        table.lock = false;
        table.ts = Utc::now();
        let store = self.store.clone();
        warn!(
            "🧹 [LEASE_GUARD]: releasing ({}, {}) via drop fallback",
            table.collection, table.field
        );
        tokio::spawn(async move {
            if let Err(e) = store.replace_work_table(&table).await {
                error!("⚠️ [LEASE_GUARD]: drop-path release failed: {}", e);
            }
        });
    }
}
