// [apps/worker-runtime/tests/scenarios.rs]
//! Integration tests for the worker loop against a real in-memory libSQL
//! store, covering the fleet's canonical coordination scenarios.

use async_trait::async_trait;
use chrono::Utc;
use fleetscan_domain_models::{range::Range, Unit, UnitStatus, WorkTable};
use fleetscan_infra_store::{LibsqlStore, StoreAdapter, StoreClient};
use fleetscan_worker::{Hooks, RangeBound, ScanConfig, Worker, WorkerOutcome};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct RecordingHooks {
    processed: Mutex<Vec<i64>>,
    cleanup_called: AtomicBool,
    fired_called: AtomicBool,
    finish_processing_called: AtomicBool,
    process_delay: Duration,
}

impl RecordingHooks {
    fn new() -> Arc<Self> {
        Self::with_process_delay(Duration::ZERO)
    }

    /// A worker whose `process` hook sleeps before returning, so a peer has
    /// a window to reclaim its unit as stale.
    fn with_process_delay(process_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            processed: Mutex::new(Vec::new()),
            cleanup_called: AtomicBool::new(false),
            fired_called: AtomicBool::new(false),
            finish_processing_called: AtomicBool::new(false),
            process_delay,
        })
    }

    fn processed_ids(&self) -> Vec<i64> {
        self.processed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Hooks for RecordingHooks {
    async fn process(&self, document: Value) -> anyhow::Result<()> {
        if !self.process_delay.is_zero() {
            tokio::time::sleep(self.process_delay).await;
        }
        let id = document.get("_id").and_then(Value::as_i64).unwrap_or(-1);
        self.processed.lock().unwrap().push(id);
        Ok(())
    }

    async fn cleanup(&self, _lower: &RangeBound, _upper: &RangeBound) {
        self.cleanup_called.store(true, Ordering::SeqCst);
    }

    async fn fired(&self, _lower: &RangeBound, _upper: &RangeBound) {
        self.fired_called.store(true, Ordering::SeqCst);
    }

    async fn finish_processing(&self) {
        self.finish_processing_called.store(true, Ordering::SeqCst);
    }
}

async fn shared_store() -> Arc<LibsqlStore> {
    let client = StoreClient::connect(":memory:", None).await.unwrap();
    Arc::new(LibsqlStore::new(client))
}

fn fast_config(num_units: usize) -> ScanConfig {
    ScanConfig::builder()
        .num_units(num_units)
        .backoff_millis(10)
        .max_lock_millis(50)
        .heartbeat_millis(50)
        .max_missed_heartbeats(2)
        .build()
        .unwrap()
}

#[tokio::test]
async fn scenario_single_worker_empty_collection() {
    let store = shared_store().await;
    let hooks = RecordingHooks::new();

    let worker = Worker::spawn(store.clone(), "mem", "docs", "_id", hooks.clone(), fast_config(1))
        .await
        .unwrap()
        .expect("an empty collection still yields one unbounded unit");

    let outcome = worker.run(None).await.unwrap();
    assert_eq!(outcome, WorkerOutcome::Completed);
    assert!(hooks.processed_ids().is_empty());
    assert!(hooks.finish_processing_called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn scenario_single_worker_partitions_and_processes_all_documents() {
    let store = shared_store().await;
    for i in 0..100i64 {
        store.insert_document("docs", &i.to_string(), json!({"_id": i})).await.unwrap();
    }

    let hooks = RecordingHooks::new();
    let worker = Worker::spawn(store.clone(), "mem", "docs", "_id", hooks.clone(), fast_config(4))
        .await
        .unwrap()
        .expect("a populated collection yields a unit for the sole worker");

    let outcome = worker.run(None).await.unwrap();
    assert_eq!(outcome, WorkerOutcome::Completed);

    let mut processed = hooks.processed_ids();
    processed.sort_unstable();
    let expected: Vec<i64> = (0..100).collect();
    assert_eq!(processed, expected);
}

#[tokio::test]
async fn scenario_two_workers_race_bootstrap_and_lease() {
    let store = shared_store().await;
    for i in 0..40i64 {
        store.insert_document("docs", &i.to_string(), json!({"_id": i})).await.unwrap();
    }

    let hooks_a = RecordingHooks::new();
    let hooks_b = RecordingHooks::new();

    let (worker_a, worker_b) = tokio::join!(
        Worker::spawn(store.clone(), "mem", "docs", "_id", hooks_a.clone(), fast_config(2)),
        Worker::spawn(store.clone(), "mem", "docs", "_id", hooks_b.clone(), fast_config(2)),
    );

    let worker_a = worker_a.unwrap();
    let worker_b = worker_b.unwrap();

    // Exactly one of the two races the bootstrap insert, but both may still
    // pick a unit once the table exists — either is a legal outcome; what
    // matters is neither observes a fatal error and all documents still get
    // processed exactly once in total.
    let mut handles = Vec::new();
    if let Some(worker) = worker_a {
        handles.push(tokio::spawn(async move { worker.run(None).await.unwrap() }));
    }
    if let Some(worker) = worker_b {
        handles.push(tokio::spawn(async move { worker.run(None).await.unwrap() }));
    }
    assert!(!handles.is_empty(), "at least one worker must have found the initial unit(s)");

    for handle in handles {
        assert_eq!(handle.await.unwrap(), WorkerOutcome::Completed);
    }

    let mut total: Vec<i64> = hooks_a.processed_ids();
    total.extend(hooks_b.processed_ids());
    total.sort_unstable();
    let expected: Vec<i64> = (0..40).collect();
    assert_eq!(total, expected);
}

#[tokio::test]
async fn scenario_stale_processing_unit_is_reclaimed_for_cleanup() {
    let store = shared_store().await;
    let long_ago = Utc::now() - chrono::Duration::seconds(3600);

    let mut stuck_unit = Unit::open(Range::unbounded(), long_ago);
    stuck_unit.status = UnitStatus::Processing;
    stuck_unit.owner = Some("vanished-worker".to_string());
    stuck_unit.ts = long_ago;

    let table = WorkTable {
        collection: "docs".into(),
        field: "_id".into(),
        lock: false,
        ts: long_ago,
        units: Some(vec![stuck_unit]),
    };
    store.insert_work_table(&table).await.unwrap();

    let hooks = RecordingHooks::new();
    let worker = Worker::spawn(store.clone(), "mem", "docs", "_id", hooks.clone(), fast_config(1))
        .await
        .unwrap()
        .expect("the stale unit must be reclaimed for cleanup");

    let outcome = worker.run(None).await.unwrap();
    assert_eq!(outcome, WorkerOutcome::Completed);
    assert!(hooks.cleanup_called.load(Ordering::SeqCst));

    let reopened = store.peek_work_table("docs", "_id").await.unwrap().unwrap();
    assert_eq!(reopened.units.unwrap()[0].status, UnitStatus::Open);
}

#[tokio::test]
async fn scenario_stuck_lease_is_recovered_during_acquisition() {
    let store = shared_store().await;
    let long_ago = Utc::now() - chrono::Duration::seconds(10);

    let table = WorkTable {
        collection: "docs".into(),
        field: "_id".into(),
        lock: true,
        ts: long_ago,
        units: Some(vec![Unit::open(Range::unbounded(), long_ago)]),
    };
    store.insert_work_table(&table).await.unwrap();

    let hooks = RecordingHooks::new();
    let worker = Worker::spawn(store.clone(), "mem", "docs", "_id", hooks.clone(), fast_config(1))
        .await
        .unwrap();

    assert!(worker.is_some(), "acquisition must recover the stuck lease rather than block forever");
}

#[tokio::test]
async fn scenario_restart_after_all_units_completed_reinitializes() {
    let store = shared_store().await;
    let now = Utc::now();

    let mut done = Unit::open(Range::unbounded(), now);
    done.mark_completed(now);
    let table = WorkTable {
        collection: "docs".into(),
        field: "_id".into(),
        lock: false,
        ts: now,
        units: Some(vec![done]),
    };
    store.insert_work_table(&table).await.unwrap();

    store.insert_document("docs", "1", json!({"_id": 1})).await.unwrap();

    let hooks = RecordingHooks::new();
    let worker = Worker::spawn(store.clone(), "mem", "docs", "_id", hooks.clone(), fast_config(1))
        .await
        .unwrap()
        .expect("an all-completed epoch must be re-partitioned");

    let outcome = worker.run(None).await.unwrap();
    assert_eq!(outcome, WorkerOutcome::Completed);
    assert_eq!(hooks.processed_ids(), vec![1]);
}

#[tokio::test]
async fn scenario_original_owner_is_fired_when_a_peer_reclaims_its_stale_unit() {
    let store = shared_store().await;
    store.insert_document("docs", "1", json!({"_id": 1})).await.unwrap();
    store.insert_document("docs", "2", json!({"_id": 2})).await.unwrap();

    // Heartbeats every 10ms, and a unit goes stale after just one missed
    // heartbeat — but worker A's own process hook sleeps far longer than
    // that, leaving a wide window for worker B to reclaim its unit before
    // A ever gets to check in.
    let config = ScanConfig::builder()
        .num_units(1)
        .backoff_millis(5)
        .max_lock_millis(5_000)
        .heartbeat_millis(10)
        .max_missed_heartbeats(1)
        .build()
        .unwrap();

    let hooks_a = RecordingHooks::with_process_delay(Duration::from_millis(200));
    let worker_a = Worker::spawn(store.clone(), "mem", "docs", "_id", hooks_a.clone(), config)
        .await
        .unwrap()
        .expect("worker a must claim the sole unit");

    let hooks_b = RecordingHooks::new();
    let reclaimer_store = store.clone();
    let reclaimer_hooks = hooks_b.clone();
    let reclaimer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        let worker_b = Worker::spawn(reclaimer_store, "mem", "docs", "_id", reclaimer_hooks, config)
            .await
            .unwrap()
            .expect("worker b must reclaim the unit a has let go stale");
        worker_b.run(None).await.unwrap()
    });

    let outcome_a = worker_a.run(None).await.unwrap();
    let outcome_b = reclaimer.await.unwrap();

    assert_eq!(outcome_a, WorkerOutcome::Fired);
    assert!(hooks_a.fired_called.load(Ordering::SeqCst));
    assert_eq!(outcome_b, WorkerOutcome::Completed);
    assert!(hooks_b.cleanup_called.load(Ordering::SeqCst));
}
