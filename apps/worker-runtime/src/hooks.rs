// [apps/worker-runtime/src/hooks.rs]
/*!
 * The user extension point. Every method defaults to a no-op except
 * `process`, which carries the actual per-document business logic and has
 * no sensible default. Hooks only ever see immutable range bounds — never a
 * mutable reference into coordination state.
 */

use async_trait::async_trait;
use serde_json::Value;

/// One (possibly absent) bound of a unit's range, as seen by a hook.
pub type RangeBound = Option<Value>;

#[async_trait]
pub trait Hooks: Send + Sync {
    /// Invoked once, before the worker's first unit.
    async fn start_processing(&self) {}

    /// Invoked at the start of a normal (non-cleanup) unit.
    async fn start_unit(&self, _lower: &RangeBound, _upper: &RangeBound) {}

    /// The mandatory per-document hook.
    async fn process(&self, document: Value) -> anyhow::Result<()>;

    /// Invoked after a normal unit's cursor is exhausted.
    async fn finish_unit(&self, _lower: &RangeBound, _upper: &RangeBound) {}

    /// Invoked instead of `start_unit`/`process`/`finish_unit` when the
    /// worker picked up a stale unit for cleanup rather than fresh work.
    async fn cleanup(&self, _lower: &RangeBound, _upper: &RangeBound) {}

    /// Invoked when a heartbeat discovers the unit has been reassigned.
    async fn fired(&self, _lower: &RangeBound, _upper: &RangeBound) {}

    /// Invoked once, when the worker finds no next unit to pick.
    async fn finish_processing(&self) {}
}
