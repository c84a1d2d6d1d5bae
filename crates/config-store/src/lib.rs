//! Live-mutable runtime settings shared by every pipeline stage.
//!
//! The command surface is the only writer; listeners and the pipeline read a
//! fresh snapshot per event so a concurrent write is never observed torn.

use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;

/// Fixed adjustment step for the notional threshold.
pub const MIN_NOTIONAL_STEP: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Lowest threshold the store accepts.
pub const MIN_NOTIONAL_FLOOR: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Settings readable by every stage and mutable from the command surface.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Master gate: when false, events are suppressed but connections stay up.
    pub enabled: bool,
    /// Minimum notional (quote currency) for an event to be notified.
    pub min_notional: Decimal,
    /// How many top-capitalization instruments to exclude; 0 disables.
    pub exclusion_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_notional: MIN_NOTIONAL_FLOOR,
            exclusion_depth: 20,
        }
    }
}

/// Invariant violations rejected at the store boundary.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("min notional {requested} is below the floor {floor}")]
    BelowFloor {
        requested: Decimal,
        floor: Decimal,
    },
}

/// Thread-safe handle to the runtime configuration. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    inner: Arc<RwLock<RuntimeConfig>>,
}

impl ConfigStore {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// An owned copy of the current settings.
    pub fn snapshot(&self) -> RuntimeConfig {
        self.inner.read().clone()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.write().enabled = enabled;
    }

    /// Flip the enabled gate, returning the new value.
    pub fn toggle_enabled(&self) -> bool {
        let mut config = self.inner.write();
        config.enabled = !config.enabled;
        config.enabled
    }

    /// Raise the threshold by one step, returning the new value.
    pub fn increase_min_notional(&self) -> Decimal {
        let mut config = self.inner.write();
        config.min_notional += MIN_NOTIONAL_STEP;
        config.min_notional
    }

    /// Lower the threshold by one step. Rejected when the result would fall
    /// below the floor; the stored value is left untouched.
    pub fn decrease_min_notional(&self) -> Result<Decimal, ConfigError> {
        let mut config = self.inner.write();
        let requested = config.min_notional - MIN_NOTIONAL_STEP;
        if requested < MIN_NOTIONAL_FLOOR {
            return Err(ConfigError::BelowFloor {
                requested,
                floor: MIN_NOTIONAL_FLOOR,
            });
        }
        config.min_notional = requested;
        Ok(requested)
    }

    /// Set the threshold outright, subject to the floor.
    pub fn set_min_notional(&self, value: Decimal) -> Result<(), ConfigError> {
        if value < MIN_NOTIONAL_FLOOR {
            return Err(ConfigError::BelowFloor {
                requested: value,
                floor: MIN_NOTIONAL_FLOOR,
            });
        }
        self.inner.write().min_notional = value;
        Ok(())
    }

    pub fn set_exclusion_depth(&self, depth: usize) {
        self.inner.write().exclusion_depth = depth;
    }
}
