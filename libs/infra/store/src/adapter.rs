// [libs/infra/store/src/adapter.rs]
/*!
 * =================================================================
 * APARATO: STORE ADAPTER CONTRACT (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CAPACIDADES MÍNIMAS DE DOCUMENT-STORE
 *
 * El motor de coordinacion nunca habla SQL directamente; solo conoce
 * esta superficie. Cualquier backend que la implemente es un Motor A
 * valido.
 * =================================================================
 */

use crate::errors::StoreError;
use async_trait::async_trait;
use fleetscan_domain_models::WorkTable;
use serde_json::Value;
use std::pin::Pin;
use tokio_stream::Stream;

/// Aggregate statistics used by `SplitFinder` Strategy B.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectionStats {
    pub count: u64,
    pub avg_doc_size_bytes: f64,
}

/// A lazily-produced document, keyed by its split-field value plus the raw
/// JSON payload.
pub struct ScannedDocument {
    pub key: Value,
    pub payload: Value,
}

pub type DocumentStream = Pin<Box<dyn Stream<Item = Result<ScannedDocument, StoreError>> + Send>>;

/// The minimal document-store capability set the coordination protocol
/// depends on. Implemented concretely by [`crate::libsql_store::LibsqlStore`];
/// kept as a trait so the coordination layer stays store-agnostic.
#[async_trait]
pub trait StoreAdapter: Send + Sync {
    /// Inserts a brand-new work table. Fails with `DuplicateKey` if one
    /// already exists for `(collection, field)`.
    async fn insert_work_table(&self, table: &WorkTable) -> Result<(), StoreError>;

    /// Reads the current work table for `(collection, field)`, if any.
    async fn peek_work_table(
        &self,
        collection: &str,
        field: &str,
    ) -> Result<Option<WorkTable>, StoreError>;

    /// Atomic conditional acquire: succeeds only if the observed row has
    /// `lock = false`. Returns the post-acquire row on success.
    async fn try_acquire_lease(
        &self,
        collection: &str,
        field: &str,
    ) -> Result<Option<WorkTable>, StoreError>;

    /// Clears a lease that has been independently verified stuck, filtered on
    /// the timestamp the caller observed so at most one recoverer wins.
    async fn force_clear_stuck_lease(
        &self,
        collection: &str,
        field: &str,
        observed_ts: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool, StoreError>;

    /// Atomically replaces the full work-table row (used for release,
    /// heartbeat, unit mutation, and re-initialization writes alike).
    async fn replace_work_table(&self, table: &WorkTable) -> Result<(), StoreError>;

    /// Inserts a document into the externally-assumed data collection. Only
    /// used by tests/demo setup; the protocol itself never writes documents.
    async fn insert_document(&self, collection: &str, id: &str, payload: Value) -> Result<(), StoreError>;

    /// Count and average payload size for `collection`, used by SplitFinder
    /// Strategy B and the Strategy A/B selection threshold.
    async fn collection_stats(&self, collection: &str) -> Result<CollectionStats, StoreError>;

    /// Approximate split keys partitioning `collection` on `field` into
    /// chunks of roughly `chunk_size_docs` documents each.
    async fn split_vector(
        &self,
        collection: &str,
        field: &str,
        chunk_size_docs: u64,
    ) -> Result<Vec<Value>, StoreError>;

    /// Every distinct value of `field` across `collection`, sorted ascending
    /// — the full-read input to SplitFinder Strategy A.
    async fn sample_sorted_keys(&self, collection: &str, field: &str) -> Result<Vec<Value>, StoreError>;

    /// Lazy cursor over documents in `collection` with `field` in
    /// `[lower, upper)`, sorted ascending on `field`. Either bound absent
    /// means unbounded on that side.
    fn scan_sorted(
        &self,
        collection: &str,
        field: &str,
        lower: Option<Value>,
        upper: Option<Value>,
    ) -> DocumentStream;
}
