//! Engine configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/cadence/config.toml)
//! 2. Fall back to compiled defaults
//!
//! Every key is optional; missing keys keep their default.
//!
//! ```toml
//! [cache]
//! ttl_secs = 300
//!
//! [billing]
//! due_soon_days = 3
//! max_renewal_steps = 100000
//!
//! [detection]
//! price_increase_lookback_days = 30
//! trial_ending_window_days = 7
//! cancellation_trial_window_days = 3
//!
//! [forecast]
//! months = 6
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Largest day count accepted for any detection or billing window
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// Tunable parameters shared by the billing and analytics engines
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// How long cached analytics stay valid
    pub cache_ttl: Duration,
    /// Window for the due-soon check
    pub due_soon_days: i64,
    /// Upper bound on billing-cycle steps per subscription in one renewal pass
    pub max_renewal_steps: u32,
    /// Lookback for price-increase detection in savings suggestions
    pub price_increase_lookback_days: i64,
    /// Window for trial-ending savings suggestions
    pub trial_ending_window_days: i64,
    /// Trial window for cancellation candidates
    pub cancellation_trial_window_days: i64,
    /// Default forecast horizon in months
    pub forecast_months: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            due_soon_days: 3,
            max_renewal_steps: 100_000,
            price_increase_lookback_days: 30,
            trial_ending_window_days: 7,
            cancellation_trial_window_days: 3,
            forecast_months: 6,
        }
    }
}

impl EngineConfig {
    /// Load from the data-dir override if present, else defaults
    pub fn load() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        parse_config(&content)
    }
}

/// Default override location in the platform data dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("cadence").join("config.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    cache: Option<RawCache>,
    billing: Option<RawBilling>,
    detection: Option<RawDetection>,
    forecast: Option<RawForecast>,
}

#[derive(Debug, Deserialize)]
struct RawCache {
    ttl_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawBilling {
    due_soon_days: Option<i64>,
    max_renewal_steps: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawDetection {
    price_increase_lookback_days: Option<i64>,
    trial_ending_window_days: Option<i64>,
    cancellation_trial_window_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawForecast {
    months: Option<u32>,
}

fn window_days(key: &str, days: i64) -> Result<i64> {
    if (0..=MAX_WINDOW_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(Error::Config(format!(
            "{} must be between 0 and {} (got {})",
            key, MAX_WINDOW_DAYS, days
        )))
    }
}

/// Parse TOML content onto the defaults
pub fn parse_config(content: &str) -> Result<EngineConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = EngineConfig::default();

    if let Some(cache) = raw.cache {
        if let Some(ttl) = cache.ttl_secs {
            config.cache_ttl = Duration::from_secs(ttl);
        }
    }

    if let Some(billing) = raw.billing {
        if let Some(days) = billing.due_soon_days {
            config.due_soon_days = window_days("billing.due_soon_days", days)?;
        }
        if let Some(steps) = billing.max_renewal_steps {
            if steps == 0 {
                return Err(Error::Config(
                    "billing.max_renewal_steps must be at least 1".to_string(),
                ));
            }
            config.max_renewal_steps = steps;
        }
    }

    if let Some(detection) = raw.detection {
        if let Some(days) = detection.price_increase_lookback_days {
            config.price_increase_lookback_days =
                window_days("detection.price_increase_lookback_days", days)?;
        }
        if let Some(days) = detection.trial_ending_window_days {
            config.trial_ending_window_days =
                window_days("detection.trial_ending_window_days", days)?;
        }
        if let Some(days) = detection.cancellation_trial_window_days {
            config.cancellation_trial_window_days =
                window_days("detection.cancellation_trial_window_days", days)?;
        }
    }

    if let Some(forecast) = raw.forecast {
        if let Some(months) = forecast.months {
            config.forecast_months = months;
        }
    }

    Ok(config)
}
