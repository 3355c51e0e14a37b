// [libs/core/partition/src/split_finder.rs]
/*!
 * SplitFinder: produces the initial tiling of Ranges over a collection's key
 * space. Strategy A reads every key and slices the sorted sequence; Strategy
 * B leans on store-reported stats and an approximated split-vector query.
 * Both converge on the same tiling invariant (see `fleetscan_domain_models::range::verify_tiling`).
 */

use crate::errors::PartitionError;
use fleetscan_domain_models::range::Range;
use fleetscan_infra_store::StoreAdapter;
use serde_json::Value;
use tracing::{debug, instrument};

/// Collections below this document count use Strategy A by default; above
/// it, the full-read cost is no longer acceptable and Strategy B takes over.
pub const SMALL_COLLECTION_THRESHOLD_DOCS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Sampling,
    StatsBased,
}

/// Partitions one `(collection, field)` key space into `requested_n`
/// approximately-balanced Ranges. `effective_n` may differ from
/// `requested_n` after `plan` runs — the caller must accept it.
pub struct SplitFinder {
    collection: String,
    field: String,
    requested_n: usize,
    strategy: Strategy,
    effective_n: usize,
}

impl SplitFinder {
    /// Forces Strategy A (full sorted read) regardless of collection size.
    pub fn sampling(collection: impl Into<String>, field: impl Into<String>, requested_n: usize) -> Self {
        Self {
            collection: collection.into(),
            field: field.into(),
            requested_n,
            strategy: Strategy::Sampling,
            effective_n: requested_n,
        }
    }

    /// Forces Strategy B (stats-based split-vector approximation).
    pub fn stats_based(collection: impl Into<String>, field: impl Into<String>, requested_n: usize) -> Self {
        Self {
            collection: collection.into(),
            field: field.into(),
            requested_n,
            strategy: Strategy::StatsBased,
            effective_n: requested_n,
        }
    }

    /// Picks Strategy A or B based on the collection's reported size.
    #[instrument(skip(store))]
    pub async fn select(
        store: &dyn StoreAdapter,
        collection: impl Into<String>,
        field: impl Into<String>,
        requested_n: usize,
    ) -> Result<Self, PartitionError> {
        let collection = collection.into();
        let field = field.into();
        let stats = store.collection_stats(&collection).await?;

        let strategy = if stats.count < SMALL_COLLECTION_THRESHOLD_DOCS {
            Strategy::Sampling
        } else {
            Strategy::StatsBased
        };

        debug!(
            "🧭 [SPLIT_FINDER]: selected {:?} for '{}' ({} docs)",
            strategy, collection, stats.count
        );

        Ok(Self {
            collection,
            field,
            requested_n,
            strategy,
            effective_n: requested_n,
        })
    }

    /// The number of Ranges actually produced by the last `plan` call.
    /// Equal to `requested_n` before `plan` has run.
    pub fn effective_n(&self) -> usize {
        self.effective_n
    }

    #[instrument(skip(self, store))]
    pub async fn plan(&mut self, store: &dyn StoreAdapter) -> Result<Vec<Range>, PartitionError> {
        let ranges = match self.strategy {
            Strategy::Sampling => self.plan_sampling(store).await?,
            Strategy::StatsBased => self.plan_stats_based(store).await?,
        };
        self.effective_n = ranges.len();
        Ok(ranges)
    }

    async fn plan_sampling(&self, store: &dyn StoreAdapter) -> Result<Vec<Range>, PartitionError> {
        let keys = store.sample_sorted_keys(&self.collection, &self.field).await?;
        let n = self.requested_n.max(1);

        if keys.is_empty() || n == 1 {
            return Ok(vec![Range::unbounded()]);
        }

        let step = (keys.len() / n).max(1);
        let mut boundaries: Vec<Value> = Vec::new();
        for i in 1..n {
            let idx = i * step;
            if idx < keys.len() {
                boundaries.push(keys[idx].clone());
            }
        }
        boundaries.dedup();

        Ok(ranges_from_boundaries(boundaries))
    }

    async fn plan_stats_based(&self, store: &dyn StoreAdapter) -> Result<Vec<Range>, PartitionError> {
        let stats = store.collection_stats(&self.collection).await?;
        if stats.count == 0 {
            return Ok(vec![Range::unbounded()]);
        }

        let n = self.requested_n.max(1) as f64;
        let chunk_size_bytes = (2.0 * stats.count as f64 * stats.avg_doc_size_bytes) / n;
        let docs_per_chunk = if stats.avg_doc_size_bytes > 0.0 {
            (chunk_size_bytes / stats.avg_doc_size_bytes).round().max(1.0) as u64
        } else {
            (stats.count as f64 / n).round().max(1.0) as u64
        };

        let boundaries = store
            .split_vector(&self.collection, &self.field, docs_per_chunk)
            .await?;

        Ok(ranges_from_boundaries(boundaries))
    }
}

fn ranges_from_boundaries(mut boundaries: Vec<Value>) -> Vec<Range> {
    boundaries.retain(|v| !v.is_null());
    if boundaries.is_empty() {
        return vec![Range::unbounded()];
    }

    let mut ranges = Vec::with_capacity(boundaries.len() + 1);
    ranges.push(Range::new(None, Some(boundaries[0].clone())));
    for pair in boundaries.windows(2) {
        ranges.push(Range::new(Some(pair[0].clone()), Some(pair[1].clone())));
    }
    ranges.push(Range::new(Some(boundaries[boundaries.len() - 1].clone()), None));
    ranges
}
