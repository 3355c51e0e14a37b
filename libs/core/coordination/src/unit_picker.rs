// [libs/core/coordination/src/unit_picker.rs]
/*!
 * Selects the next unit a worker should take responsibility for.
 *
 * Pass 1 (cleanup priority) reclaims units stuck past the staleness
 * threshold. Per the cleanup-of-cleanup fix (see DESIGN.md), this also
 * covers units already stuck in `cleanup` — not only `processing` — so a
 * crashed cleanup-owner cannot strand a unit forever.
 *
 * Pass 2 (open work) claims the first `open` unit in order.
 */

use chrono::{DateTime, Duration, Utc};
use fleetscan_domain_models::{Unit, UnitStatus};
use tracing::debug;

pub struct PickedUnit {
    pub index: usize,
    pub cleanup: bool,
}

pub struct UnitPicker;

impl UnitPicker {
    pub fn pick(
        units: &mut [Unit],
        owner: &str,
        now: DateTime<Utc>,
        staleness_threshold: Duration,
    ) -> Option<PickedUnit> {
        for (index, unit) in units.iter_mut().enumerate() {
            let reclaimable = matches!(unit.status, UnitStatus::Processing | UnitStatus::Cleanup);
            if reclaimable && unit.is_stale(now, staleness_threshold) {
                debug!(
                    "🧟 [UNIT_PICKER]: reclaiming stale unit {} (was {:?}) for {}",
                    index, unit.status, owner
                );
                unit.claim_for_cleanup(owner, now);
                return Some(PickedUnit { index, cleanup: true });
            }
        }

        for (index, unit) in units.iter_mut().enumerate() {
            if unit.status == UnitStatus::Open {
                unit.claim_for_processing(owner, now);
                return Some(PickedUnit { index, cleanup: false });
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetscan_domain_models::range::Range;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn pass_two_claims_the_first_open_unit() {
        let mut units = vec![
            Unit::open(Range::new(None, Some(json!(10))), now()),
            Unit::open(Range::new(Some(json!(10)), None), now()),
        ];
        let picked = UnitPicker::pick(&mut units, "worker-a", now(), Duration::milliseconds(20_000)).unwrap();
        assert_eq!(picked.index, 0);
        assert!(!picked.cleanup);
        assert_eq!(units[0].status, UnitStatus::Processing);
    }

    #[test]
    fn stale_processing_unit_is_reclaimed_for_cleanup() {
        let mut unit = Unit::open(Range::new(None, None), now());
        unit.claim_for_processing("worker-a", now());
        let mut units = vec![unit];

        let later = now() + Duration::seconds(30);
        let picked = UnitPicker::pick(&mut units, "worker-b", later, Duration::milliseconds(20_000)).unwrap();
        assert!(picked.cleanup);
        assert_eq!(units[0].status, UnitStatus::Cleanup);
        assert_eq!(units[0].owner.as_deref(), Some("worker-b"));
    }

    #[test]
    fn stale_cleanup_unit_is_also_reclaimed() {
        let mut unit = Unit::open(Range::new(None, None), now());
        unit.claim_for_cleanup("worker-a", now());
        let mut units = vec![unit];

        let later = now() + Duration::seconds(30);
        let picked = UnitPicker::pick(&mut units, "worker-b", later, Duration::milliseconds(20_000)).unwrap();
        assert!(picked.cleanup);
        assert_eq!(units[0].owner.as_deref(), Some("worker-b"));
    }

    #[test]
    fn fresh_units_yield_nothing() {
        let mut unit = Unit::open(Range::new(None, None), now());
        unit.claim_for_processing("worker-a", now());
        let mut units = vec![unit];
        assert!(UnitPicker::pick(&mut units, "worker-b", now(), Duration::milliseconds(20_000)).is_none());
    }
}
