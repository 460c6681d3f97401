//! Configuration for the calculator and the result cache
//!
//! Two small structs with validated defaults. Values can be overridden from
//! a TOML file with `[calculator]` and `[cache]` tables; a missing file is
//! not fatal: defaults apply and a warning is logged.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result};

/// Tunables for the constraint evaluators
///
/// The parking reservation model uses two coefficients that ordinances
/// rarely spell out as single numbers. Both are configurable per calculator
/// instance rather than buried in evaluator logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalcConfig {
    /// Floor area reserved per required parking space (sqft).
    ///
    /// Valid range: > 0
    /// Default: 180.0 (standard 9x20 stall plus aisle share)
    pub parking_area_per_space_sqft: f64,

    /// Fraction of gross floor area deducted for circulation and common
    /// area before units are counted.
    ///
    /// Valid range: [0.0, 1.0)
    /// Default: 0.15
    pub parking_circulation_fraction: f64,
}

impl Default for CalcConfig {
    fn default() -> Self {
        Self {
            parking_area_per_space_sqft: 180.0,
            parking_circulation_fraction: 0.15,
        }
    }
}

impl CalcConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.parking_area_per_space_sqft.is_finite() || self.parking_area_per_space_sqft <= 0.0 {
            return Err(Error::Config(format!(
                "parking_area_per_space_sqft: value {} out of range (must be finite and > 0)",
                self.parking_area_per_space_sqft
            )));
        }
        if !self.parking_circulation_fraction.is_finite()
            || !(0.0..1.0).contains(&self.parking_circulation_fraction)
        {
            return Err(Error::Config(format!(
                "parking_circulation_fraction: value {} out of range [0.0, 1.0)",
                self.parking_circulation_fraction
            )));
        }
        Ok(())
    }
}

/// Freshness windows and wait budget for [`crate::cache::ResultCache`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a cached parameter set counts as verified (days).
    ///
    /// Valid range: >= 1
    /// Default: 30 (ordinances change on the scale of months)
    pub parameter_freshness_days: i64,

    /// How long a computed analysis stays servable from memory (seconds).
    ///
    /// Valid range: >= 1
    /// Default: 1800
    pub result_ttl_secs: i64,

    /// How long a caller waits on another caller's in-flight computation
    /// before giving up with a transient timeout (seconds).
    ///
    /// Valid range: >= 1
    /// Default: 30
    pub inflight_wait_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            parameter_freshness_days: 30,
            result_ttl_secs: 1800,
            inflight_wait_secs: 30,
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.parameter_freshness_days < 1 {
            return Err(Error::Config(format!(
                "parameter_freshness_days: value {} out of range (must be >= 1)",
                self.parameter_freshness_days
            )));
        }
        if self.result_ttl_secs < 1 {
            return Err(Error::Config(format!(
                "result_ttl_secs: value {} out of range (must be >= 1)",
                self.result_ttl_secs
            )));
        }
        if self.inflight_wait_secs < 1 {
            return Err(Error::Config(format!(
                "inflight_wait_secs: value {} out of range (must be >= 1)",
                self.inflight_wait_secs
            )));
        }
        Ok(())
    }

    pub fn parameter_freshness(&self) -> chrono::Duration {
        chrono::Duration::days(self.parameter_freshness_days)
    }

    pub fn result_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.result_ttl_secs)
    }

    pub fn inflight_wait(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.inflight_wait_secs)
    }
}

/// Combined file configuration (`[calculator]` and `[cache]` tables)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub calculator: CalcConfig,
    pub cache: CacheConfig,
}

impl FileConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file degrades to defaults with a warning. A file that
    /// exists but fails to parse or validate is an error: silently
    /// ignoring a present-but-broken config hides operator mistakes.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file not found: {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: FileConfig = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.calculator.validate()?;
        config.cache.validate()?;
        Ok(config)
    }
}
