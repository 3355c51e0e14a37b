// [apps/worker-runtime/src/config.rs]
/*!
 * The tunables governing one scan: how many units to partition into, and
 * the lease/heartbeat timing. Built via `ScanConfigBuilder` and validated
 * at construction time rather than accepted unchecked deep in the
 * coordination protocol.
 */

use crate::errors::ConfigError;
use chrono::Duration;
use fleetscan_core_coordination::{BACKOFF_MILLIS, HEARTBEAT_MILLIS, MAX_LOCK_MILLIS, MAX_MISSED_HEARTBEATS};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanConfig {
    pub num_units: usize,
    pub backoff_millis: u64,
    pub max_lock_millis: i64,
    pub heartbeat_millis: i64,
    pub max_missed_heartbeats: i64,
}

impl ScanConfig {
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// The unit-staleness threshold Pass 1 of the unit picker reclaims
    /// against: `max_missed_heartbeats * heartbeat_millis`.
    pub fn stale_threshold(&self) -> Duration {
        Duration::milliseconds(self.heartbeat_millis * self.max_missed_heartbeats)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            num_units: 1,
            backoff_millis: BACKOFF_MILLIS,
            max_lock_millis: MAX_LOCK_MILLIS,
            heartbeat_millis: HEARTBEAT_MILLIS,
            max_missed_heartbeats: MAX_MISSED_HEARTBEATS,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ScanConfigBuilder {
    num_units: Option<usize>,
    backoff_millis: Option<u64>,
    max_lock_millis: Option<i64>,
    heartbeat_millis: Option<i64>,
    max_missed_heartbeats: Option<i64>,
}

impl ScanConfigBuilder {
    pub fn num_units(mut self, value: usize) -> Self {
        self.num_units = Some(value);
        self
    }

    pub fn backoff_millis(mut self, value: u64) -> Self {
        self.backoff_millis = Some(value);
        self
    }

    pub fn max_lock_millis(mut self, value: i64) -> Self {
        self.max_lock_millis = Some(value);
        self
    }

    pub fn heartbeat_millis(mut self, value: i64) -> Self {
        self.heartbeat_millis = Some(value);
        self
    }

    pub fn max_missed_heartbeats(mut self, value: i64) -> Self {
        self.max_missed_heartbeats = Some(value);
        self
    }

    pub fn build(self) -> Result<ScanConfig, ConfigError> {
        let defaults = ScanConfig::default();

        let num_units = self.num_units.unwrap_or(defaults.num_units);
        if num_units == 0 {
            return Err(ConfigError::InvalidNumUnits);
        }

        let backoff_millis = self.backoff_millis.unwrap_or(defaults.backoff_millis);
        let max_lock_millis = self.max_lock_millis.unwrap_or(defaults.max_lock_millis);
        let heartbeat_millis = self.heartbeat_millis.unwrap_or(defaults.heartbeat_millis);
        let max_missed_heartbeats = self.max_missed_heartbeats.unwrap_or(defaults.max_missed_heartbeats);

        if backoff_millis == 0 || max_lock_millis <= 0 || heartbeat_millis <= 0 || max_missed_heartbeats <= 0 {
            return Err(ConfigError::InvalidTunable);
        }

        Ok(ScanConfig {
            num_units,
            backoff_millis,
            max_lock_millis,
            heartbeat_millis,
            max_missed_heartbeats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ScanConfig::builder().build().is_ok());
    }

    #[test]
    fn zero_num_units_is_rejected() {
        let err = ScanConfig::builder().num_units(0).build().unwrap_err();
        assert_eq!(err, ConfigError::InvalidNumUnits);
    }

    #[test]
    fn zero_heartbeat_millis_is_rejected() {
        let err = ScanConfig::builder().heartbeat_millis(0).build().unwrap_err();
        assert_eq!(err, ConfigError::InvalidTunable);
    }
}
