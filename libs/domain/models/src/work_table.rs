// [libs/domain/models/src/work_table.rs]
/*!
 * The shared Work Table: one record per `(collection, field)`, holding the
 * advisory `lock`, its `ts`, and the (possibly not-yet-initialized) unit
 * list. This type mirrors the persisted JSON shape exactly so serialization
 * is the identity of the wire format.
 */

use crate::unit::{Unit, UnitStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkTable {
    pub collection: String,
    pub field: String,
    pub lock: bool,
    pub ts: DateTime<Utc>,
    pub units: Option<Vec<Unit>>,
}

impl WorkTable {
    /// A freshly-bootstrapped, unlocked, uninitialized work table.
    pub fn new(collection: impl Into<String>, field: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            collection: collection.into(),
            field: field.into(),
            lock: false,
            ts: now,
            units: None,
        }
    }

    /// True when the next lease-holder must (re)run SplitFinder: no units
    /// yet, or every unit from a prior epoch is `completed`.
    pub fn needs_initialization(&self) -> bool {
        match &self.units {
            None => true,
            Some(units) => units.iter().all(|unit| unit.status == UnitStatus::Completed),
        }
    }
}
