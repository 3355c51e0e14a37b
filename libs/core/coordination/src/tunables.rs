// [libs/core/coordination/src/tunables.rs]
//! Default liveness tunables. `fleetscan-worker`'s `ScanConfig` may override
//! these per-deployment; these are the protocol's documented defaults.

pub const HEARTBEAT_MILLIS: i64 = 10_000;
pub const MAX_MISSED_HEARTBEATS: i64 = 2;

pub fn default_stale_threshold() -> chrono::Duration {
    chrono::Duration::milliseconds(HEARTBEAT_MILLIS * MAX_MISSED_HEARTBEATS)
}
