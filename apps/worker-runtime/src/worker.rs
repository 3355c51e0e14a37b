// [apps/worker-runtime/src/worker.rs]
/*!
 * The worker loop: construction/initialization, the per-unit scan-or-cleanup
 * cycle, heartbeats, fired-condition handling, and hook invocation.
 *
 * A worker owns exactly one unit at a time. It never holds the lease while
 * scanning or invoking hooks — only while bootstrapping, claiming a unit,
 * heartbeating, and marking a unit's completion.
 */

use crate::config::ScanConfig;
use crate::errors::WorkerError;
use crate::hooks::{Hooks, RangeBound};
use chrono::Utc;
use fleetscan_core_coordination::{CoordinationError, LeaseManager, UnitPicker, WorkTableBootstrap};
use fleetscan_core_partition::SplitFinder;
use fleetscan_domain_models::{Unit, WorkerId};
use fleetscan_infra_store::StoreAdapter;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// The worker ran out of units to pick; its fleet-local work is done.
    Completed,
    /// A heartbeat discovered this worker's unit had been reassigned.
    Fired,
    /// A cancellation token fired mid-unit; the unit is left for a peer to
    /// reclaim as stale in the ordinary way.
    Cancelled,
}

enum UnitOutcome {
    Completed,
    Fired,
    Cancelled,
}

pub struct Worker {
    id: WorkerId,
    store: Arc<dyn StoreAdapter>,
    collection: String,
    field: String,
    config: ScanConfig,
    hooks: Arc<dyn Hooks>,
    num_unit: usize,
    cleanup: bool,
    lower_bound: RangeBound,
    upper_bound: RangeBound,
}

impl Worker {
    /// Ensures the work table exists, acquires the lease, (re)initializes
    /// units if needed, and picks a unit. Returns `None` if no unit is
    /// available — the caller should not spawn a run loop in that case.
    #[instrument(skip(store, hooks, config))]
    pub async fn spawn(
        store: Arc<dyn StoreAdapter>,
        db_name: impl Into<String>,
        collection: impl Into<String>,
        field: impl Into<String>,
        hooks: Arc<dyn Hooks>,
        config: ScanConfig,
    ) -> Result<Option<Self>, WorkerError> {
        let collection = collection.into();
        let field = field.into();
        let _db_name = db_name.into(); // informational: libSQL connections are already database-scoped

        WorkTableBootstrap::ensure_exists(&*store, &collection, &field)
            .await
            .map_err(WorkerError::from)?;

        let lease_manager = LeaseManager::with_tunables(
            store.clone(),
            collection.clone(),
            field.clone(),
            config.backoff_millis,
            config.max_lock_millis,
        );
        let mut guard = lease_manager.acquire(None).await.map_err(WorkerError::from)?;

        if guard.table().needs_initialization() {
            let mut finder = SplitFinder::select(&*store, collection.clone(), field.clone(), config.num_units)
                .await
                .map_err(CoordinationError::from)?;
            let ranges = finder.plan(&*store).await.map_err(CoordinationError::from)?;
            let now = Utc::now();
            let units: Vec<Unit> = ranges.into_iter().map(|range| Unit::open(range, now)).collect();
            info!(
                "🗺️ [WORKER_INIT]: ({}, {}) partitioned into {} units",
                collection,
                field,
                units.len()
            );
            guard.table_mut().units = Some(units);
        }

        let worker_id = WorkerId::generate();
        let picked = {
            let units = guard
                .table_mut()
                .units
                .as_mut()
                .expect("units were initialized above");
            UnitPicker::pick(units, worker_id.as_str(), Utc::now(), config.stale_threshold())
        };

        let worker = picked.map(|picked| {
            let unit = &guard.table().units.as_ref().unwrap()[picked.index];
            Worker {
                id: worker_id,
                store: store.clone(),
                collection: collection.clone(),
                field: field.clone(),
                config,
                hooks,
                num_unit: picked.index,
                cleanup: picked.cleanup,
                lower_bound: unit.lower_bound.clone(),
                upper_bound: unit.upper_bound.clone(),
            }
        });

        guard.release().await.map_err(WorkerError::from)?;

        if worker.is_none() {
            debug!("🏁 [WORKER_INIT]: ({}, {}) has no work for a new worker", collection, field);
        }

        Ok(worker)
    }

    pub fn id(&self) -> &WorkerId {
        &self.id
    }

    fn lease_manager(&self) -> LeaseManager {
        LeaseManager::with_tunables(
            self.store.clone(),
            self.collection.clone(),
            self.field.clone(),
            self.config.backoff_millis,
            self.config.max_lock_millis,
        )
    }

    /// Runs until no unit remains, the worker is fired, or `cancellation`
    /// fires.
    #[instrument(skip(self, cancellation), fields(worker_id = %self.id))]
    pub async fn run(mut self, cancellation: Option<CancellationToken>) -> Result<WorkerOutcome, WorkerError> {
        self.hooks.start_processing().await;

        loop {
            match self.run_one_unit(cancellation.as_ref()).await? {
                UnitOutcome::Fired => {
                    self.hooks.fired(&self.lower_bound, &self.upper_bound).await;
                    return Ok(WorkerOutcome::Fired);
                }
                UnitOutcome::Cancelled => {
                    return Ok(WorkerOutcome::Cancelled);
                }
                UnitOutcome::Completed => {
                    if !self.advance_to_next_unit().await? {
                        break;
                    }
                }
            }
        }

        self.hooks.finish_processing().await;
        Ok(WorkerOutcome::Completed)
    }

    async fn run_one_unit(&mut self, cancellation: Option<&CancellationToken>) -> Result<UnitOutcome, WorkerError> {
        if self.cleanup {
            self.hooks.cleanup(&self.lower_bound, &self.upper_bound).await;
            return Ok(UnitOutcome::Completed);
        }

        self.hooks.start_unit(&self.lower_bound, &self.upper_bound).await;

        let mut stream = self
            .store
            .scan_sorted(&self.collection, &self.field, self.lower_bound.clone(), self.upper_bound.clone());

        let heartbeat_interval = StdDuration::from_millis(self.config.heartbeat_millis.max(0) as u64);
        let mut last_heartbeat = tokio::time::Instant::now();

        while let Some(document) = stream.next().await {
            if cancellation.is_some_and(|token| token.is_cancelled()) {
                warn!("🛑 [WORKER]: cancellation observed mid-unit, stopping early");
                return Ok(UnitOutcome::Cancelled);
            }

            let document = document.map_err(CoordinationError::from)?;
            self.hooks
                .process(document.payload)
                .await
                .map_err(CoordinationError::Hook)?;

            if last_heartbeat.elapsed() >= heartbeat_interval {
                if !self.heartbeat(cancellation).await? {
                    return Ok(UnitOutcome::Fired);
                }
                last_heartbeat = tokio::time::Instant::now();
            }
        }

        self.hooks.finish_unit(&self.lower_bound, &self.upper_bound).await;
        Ok(UnitOutcome::Completed)
    }

    /// Re-acquires the lease, confirms this worker still owns its unit, and
    /// refreshes the unit's `ts`. Returns `false` if another worker has
    /// taken over (the caller must treat this as Fired).
    async fn heartbeat(&self, cancellation: Option<&CancellationToken>) -> Result<bool, WorkerError> {
        let lease_manager = self.lease_manager();
        let mut guard = lease_manager.acquire(cancellation).await.map_err(WorkerError::from)?;

        let now = Utc::now();
        let still_owned = {
            let units = guard
                .table_mut()
                .units
                .as_mut()
                .ok_or_else(|| CoordinationError::LeaseNotHeld(self.collection.clone(), self.field.clone()))
                .map_err(WorkerError::from)?;
            let unit = units.get_mut(self.num_unit).ok_or_else(|| {
                WorkerError::from(CoordinationError::LeaseNotHeld(self.collection.clone(), self.field.clone()))
            })?;

            if unit.owner.as_deref() != Some(self.id.as_str()) {
                false
            } else {
                unit.heartbeat(now);
                true
            }
        };

        guard.release().await.map_err(WorkerError::from)?;

        if !still_owned {
            warn!("🔥 [WORKER]: fired — unit {} reassigned to another owner", self.num_unit);
        }

        Ok(still_owned)
    }

    /// Marks the current unit complete (or reopened, if it was a cleanup
    /// pass), picks the next unit, and moves this worker onto it. Returns
    /// `false` if there is no next unit.
    async fn advance_to_next_unit(&mut self) -> Result<bool, WorkerError> {
        let lease_manager = self.lease_manager();
        let mut guard = lease_manager.acquire(None).await.map_err(WorkerError::from)?;

        let now = Utc::now();
        let advanced = {
            let units = guard
                .table_mut()
                .units
                .as_mut()
                .ok_or_else(|| CoordinationError::LeaseNotHeld(self.collection.clone(), self.field.clone()))
                .map_err(WorkerError::from)?;

            let unit = units.get_mut(self.num_unit).ok_or_else(|| {
                WorkerError::from(CoordinationError::LeaseNotHeld(self.collection.clone(), self.field.clone()))
            })?;

            if self.cleanup {
                unit.mark_reopened(now);
            } else {
                unit.mark_completed(now);
            }

            match UnitPicker::pick(units, self.id.as_str(), now, self.config.stale_threshold()) {
                Some(picked) => {
                    let next_unit = &units[picked.index];
                    self.num_unit = picked.index;
                    self.cleanup = picked.cleanup;
                    self.lower_bound = next_unit.lower_bound.clone();
                    self.upper_bound = next_unit.upper_bound.clone();
                    true
                }
                None => false,
            }
        };

        guard.release().await.map_err(WorkerError::from)?;
        Ok(advanced)
    }
}
