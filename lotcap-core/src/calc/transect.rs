//! Shared density caps for form-based (transect) zoning
//!
//! In a transect code, several districts share one density cap and are
//! differentiated by height and FAR instead. A district participates only
//! when its parameter set carries an explicit `transect_family`; the family
//! is never inferred from district naming.

use std::collections::BTreeMap;

/// Lookup table: transect family id → shared density cap (units/acre)
///
/// Family ids are matched case-insensitively ("t4" and "T4" are the same
/// band). BTreeMap keeps iteration deterministic for debug output.
#[derive(Debug, Clone)]
pub struct TransectTable {
    caps: BTreeMap<String, f64>,
}

impl TransectTable {
    /// Empty table: every family lookup misses
    pub fn empty() -> Self {
        Self { caps: BTreeMap::new() }
    }

    /// The Miami 21 bands, the reference transect code for this market:
    /// T3 sub-urban 9, T4 general urban 36, T5 urban center 65,
    /// T6 urban core 150 units/acre.
    pub fn with_defaults() -> Self {
        let mut table = Self::empty();
        table.insert("T3", 9.0);
        table.insert("T4", 36.0);
        table.insert("T5", 65.0);
        table.insert("T6", 150.0);
        table
    }

    /// Add or replace a jurisdiction-specific family cap
    pub fn insert(&mut self, family: &str, units_per_acre: f64) {
        self.caps.insert(family.to_uppercase(), units_per_acre);
    }

    /// Shared density cap for a family, if known
    pub fn density_cap(&self, family: &str) -> Option<f64> {
        self.caps.get(&family.to_uppercase()).copied()
    }
}

impl Default for TransectTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}
