// [libs/domain/models/src/range.rs]
/*!
 * Half-open key ranges `[lower, upper)` over an arbitrary split field.
 *
 * Either bound may be absent, meaning unbounded on that side. Keys are
 * carried as `serde_json::Value` since the split field's type is a runtime
 * property of the collection being scanned (numeric `_id`, string key,
 * timestamp, ...); ordering is defined only for the homogeneous numeric and
 * string cases a real collection key will take.
 */

use serde_json::Value;
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyOrdering {
    #[error("split field values are not order-comparable: {0:?} vs {1:?}")]
    Incomparable(String, String),
}

/// Compares two key values. Only numbers-vs-numbers and strings-vs-strings
/// are defined; any other pairing (including null, bool, object, array) is
/// a caller error, not a silent tie.
pub fn compare_keys(a: &Value, b: &Value) -> Result<Ordering, KeyOrdering> {
    match (a, b) {
        (Value::Number(lhs), Value::Number(rhs)) => {
            let lhs = lhs.as_f64().unwrap_or(f64::NAN);
            let rhs = rhs.as_f64().unwrap_or(f64::NAN);
            lhs.partial_cmp(&rhs)
                .ok_or_else(|| KeyOrdering::Incomparable(a.to_string(), b.to_string()))
        }
        (Value::String(lhs), Value::String(rhs)) => Ok(lhs.cmp(rhs)),
        _ => Err(KeyOrdering::Incomparable(a.to_string(), b.to_string())),
    }
}

/// A half-open key range `[lower, upper)`. `None` means unbounded on that
/// side.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Range {
    pub lower: Option<Value>,
    pub upper: Option<Value>,
}

impl Range {
    pub fn new(lower: Option<Value>, upper: Option<Value>) -> Self {
        Self { lower, upper }
    }

    pub fn unbounded() -> Self {
        Self::new(None, None)
    }

    /// True if `key` falls within `[lower, upper)`. Returns an error only
    /// when a present bound is not order-comparable with `key`.
    pub fn contains(&self, key: &Value) -> Result<bool, KeyOrdering> {
        if let Some(lower) = &self.lower {
            if compare_keys(key, lower)? == Ordering::Less {
                return Ok(false);
            }
        }
        if let Some(upper) = &self.upper {
            if compare_keys(key, upper)? != Ordering::Less {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Verifies that `ranges` tile the key space: sorted by `lower`, each
/// adjacent pair touching with no gap or overlap, first lower and last
/// upper absent.
pub fn verify_tiling(ranges: &[Range]) -> bool {
    if ranges.is_empty() {
        return false;
    }
    if ranges[0].lower.is_some() {
        return false;
    }
    if ranges[ranges.len() - 1].upper.is_some() {
        return false;
    }
    for pair in ranges.windows(2) {
        if pair[0].upper != pair[1].lower {
            return false;
        }
    }
    true
}
