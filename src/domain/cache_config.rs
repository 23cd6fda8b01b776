//! Cache settings from the `[cache]` configuration section.
//!
//! ```ini
//! [cache]
//! enabled = true
//! series_size = 10000
//! data_size = 1000
//! maintenance_interval_ms = 1000
//! ```
//!
//! Every key is optional.

use crate::domain::error::{Result, SimtraderError};
use crate::ports::config_port::ConfigPort;
use std::time::Duration;

const SECTION: &str = "cache";

pub const DEFAULT_SERIES_CACHE_SIZE: usize = 10_000;
pub const DEFAULT_DATA_CACHE_SIZE: usize = 1_000;
pub const DEFAULT_MAINTENANCE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub enabled: bool,
    pub series_cache_size: usize,
    pub data_cache_size: usize,
    pub maintenance_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            series_cache_size: DEFAULT_SERIES_CACHE_SIZE,
            data_cache_size: DEFAULT_DATA_CACHE_SIZE,
            maintenance_interval: DEFAULT_MAINTENANCE_INTERVAL,
        }
    }
}

impl CacheConfig {
    /// Validates, then reads the `[cache]` section, filling defaults for
    /// missing keys.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self> {
        validate_cache_config(config)?;
        let defaults = Self::default();
        Ok(Self {
            enabled: config.get_bool(SECTION, "enabled", defaults.enabled),
            series_cache_size: positive(config, "series_size")?
                .unwrap_or(defaults.series_cache_size),
            data_cache_size: positive(config, "data_size")?.unwrap_or(defaults.data_cache_size),
            maintenance_interval: positive(config, "maintenance_interval_ms")?
                .map(|ms| Duration::from_millis(ms as u64))
                .unwrap_or(defaults.maintenance_interval),
        })
    }
}

pub fn validate_cache_config(config: &dyn ConfigPort) -> Result<()> {
    validate_enabled(config)?;
    positive(config, "series_size")?;
    positive(config, "data_size")?;
    positive(config, "maintenance_interval_ms")?;
    Ok(())
}

fn validate_enabled(config: &dyn ConfigPort) -> Result<()> {
    let Some(raw) = config.get_string(SECTION, "enabled") else {
        return Ok(());
    };
    // A value that is neither true nor false reads back as both defaults.
    if config.get_bool(SECTION, "enabled", true) != config.get_bool(SECTION, "enabled", false) {
        return Err(SimtraderError::ConfigInvalid {
            section: SECTION.to_string(),
            key: "enabled".to_string(),
            reason: format!("enabled must be a boolean, got {:?}", raw),
        });
    }
    Ok(())
}

/// A present key must hold a positive integer.
fn positive(config: &dyn ConfigPort, key: &str) -> Result<Option<usize>> {
    let Some(raw) = config.get_string(SECTION, key) else {
        return Ok(None);
    };
    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => Ok(Some(value as usize)),
        _ => Err(SimtraderError::ConfigInvalid {
            section: SECTION.to_string(),
            key: key.to_string(),
            reason: format!("{} must be a positive integer, got {:?}", key, raw),
        }),
    }
}
