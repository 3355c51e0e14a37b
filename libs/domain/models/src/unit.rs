// [libs/domain/models/src/unit.rs]
/*!
 * A Unit is one Range of the scan plus its claim bookkeeping: `status`,
 * `owner`, and the `ts` of the last status change or heartbeat.
 *
 * State machine: `open -> processing -> completed` (normal),
 * `processing -> cleanup -> open` (recovery). `open -> cleanup` directly is
 * never permitted; cleanup only follows processing.
 */

use crate::range::Range;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Open,
    Processing,
    Cleanup,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub lower_bound: Option<Value>,
    pub upper_bound: Option<Value>,
    pub status: UnitStatus,
    pub owner: Option<String>,
    pub ts: DateTime<Utc>,
}

impl Unit {
    pub fn open(range: Range, now: DateTime<Utc>) -> Self {
        Self {
            lower_bound: range.lower,
            upper_bound: range.upper,
            status: UnitStatus::Open,
            owner: None,
            ts: now,
        }
    }

    pub fn range(&self) -> Range {
        Range::new(self.lower_bound.clone(), self.upper_bound.clone())
    }

    pub fn is_stale(&self, now: DateTime<Utc>, threshold: chrono::Duration) -> bool {
        now - self.ts > threshold
    }

    /// Claims the unit for cleanup (Pass 1 of the Unit Picker). Only legal
    /// from `processing`, or from a unit already stuck in `cleanup` — a
    /// cleanup owner can itself go stale and needs reclaiming too.
    pub fn claim_for_cleanup(&mut self, owner: &str, now: DateTime<Utc>) {
        self.status = UnitStatus::Cleanup;
        self.owner = Some(owner.to_string());
        self.ts = now;
    }

    /// Claims the unit for regular processing (Pass 2). Only legal from
    /// `open`.
    pub fn claim_for_processing(&mut self, owner: &str, now: DateTime<Utc>) {
        self.status = UnitStatus::Processing;
        self.owner = Some(owner.to_string());
        self.ts = now;
    }

    pub fn heartbeat(&mut self, now: DateTime<Utc>) {
        self.ts = now;
    }

    /// Mark-complete after a normal processing pass: `owner` cleared,
    /// `status <- completed`.
    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.status = UnitStatus::Completed;
        self.owner = None;
        self.ts = now;
    }

    /// Mark-complete after a cleanup pass: the unit becomes available again
    /// for normal processing by any worker.
    pub fn mark_reopened(&mut self, now: DateTime<Utc>) {
        self.status = UnitStatus::Open;
        self.owner = None;
        self.ts = now;
    }
}
