//! Buildable envelope: setback resolution and net footprint
//!
//! Setback values are resolved, not assumed constant. Resolution starts from
//! the district's base setbacks and walks an explicit rule table whose rows
//! select on structure type, plat date, adjacency, waterfront status, and
//! height bracket. Rows are applied in table order and compose:
//! scale factors multiply the running values, additive adjustments add to
//! them, excess-height fractions add on top, and rear floors take the
//! maximum. New jurisdictions add rows; evaluator logic never changes.
//!
//! The default table order (and therefore precedence) is: structure type,
//! plat date, adjacency, waterfront, height bracket.

use chrono::NaiveDate;

use crate::model::{ParcelGeometry, Waterfront, ZoningParameterSet};

/// Principal building vs. accessory structure
///
/// The calculator evaluates principal dwellings; accessory rows exist so the
/// same table answers setback questions for garages and ADUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureType {
    Principal,
    Accessory,
}

/// Site facts a setback rule can select on
#[derive(Debug, Clone)]
pub struct SetbackContext {
    pub structure: StructureType,
    pub height_ft: Option<f64>,
    pub abuts_lower_density_zone: bool,
    pub plat_date: Option<NaiveDate>,
    pub waterfront: Option<Waterfront>,
}

impl SetbackContext {
    /// Context for a principal dwelling on the given parcel
    pub fn principal(params: &ZoningParameterSet, geometry: &ParcelGeometry) -> Self {
        Self {
            structure: StructureType::Principal,
            height_ft: params.max_height_ft,
            abuts_lower_density_zone: geometry.abuts_lower_density_zone,
            plat_date: geometry.plat_date,
            waterfront: geometry.waterfront,
        }
    }
}

/// Setbacks after rule resolution, in feet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedSetbacks {
    pub front_ft: f64,
    pub rear_ft: f64,
    pub interior_side_ft: f64,
    pub street_side_ft: f64,
}

impl ResolvedSetbacks {
    /// Base values from the district parameters; an absent setback
    /// contributes nothing (no regulation extracted means no reduction).
    pub fn from_params(params: &ZoningParameterSet) -> Self {
        Self {
            front_ft: params.setback_front_ft.unwrap_or(0.0),
            rear_ft: params.setback_rear_ft.unwrap_or(0.0),
            interior_side_ft: params.setback_interior_side_ft.unwrap_or(0.0),
            street_side_ft: params.setback_street_side_ft.unwrap_or(0.0),
        }
    }
}

/// One row of the setback rule table
///
/// `None` selectors are wildcards; a row matches when every present selector
/// matches the context. `min_height_ft` matches heights at or above the
/// threshold and doubles as the base for the excess-height fraction.
#[derive(Debug, Clone)]
pub struct SetbackRule {
    pub structure: Option<StructureType>,
    pub min_height_ft: Option<f64>,
    pub abuts_lower_density_zone: Option<bool>,
    pub platted_before: Option<NaiveDate>,
    pub waterfront: Option<Waterfront>,
    pub adjust: SetbackAdjustment,
}

impl SetbackRule {
    fn matches(&self, ctx: &SetbackContext) -> bool {
        if let Some(structure) = self.structure {
            if structure != ctx.structure {
                return false;
            }
        }
        if let Some(threshold) = self.min_height_ft {
            match ctx.height_ft {
                Some(height) if height >= threshold => {}
                _ => return false,
            }
        }
        if let Some(abuts) = self.abuts_lower_density_zone {
            if abuts != ctx.abuts_lower_density_zone {
                return false;
            }
        }
        if let Some(cutoff) = self.platted_before {
            match ctx.plat_date {
                Some(date) if date < cutoff => {}
                _ => return false,
            }
        }
        if let Some(waterfront) = self.waterfront {
            if ctx.waterfront != Some(waterfront) {
                return false;
            }
        }
        true
    }
}

/// How a matching rule changes the running setback values
#[derive(Debug, Clone)]
pub struct SetbackAdjustment {
    /// Multiplies all four running values (1.0 = no change)
    pub scale: f64,
    pub front_add_ft: f64,
    pub rear_add_ft: f64,
    pub interior_side_add_ft: f64,
    pub street_side_add_ft: f64,
    /// Added to all four values per foot of height above the row's
    /// `min_height_ft` threshold
    pub excess_height_fraction: f64,
    /// Lower bound on the rear setback (waterfront mean-high-water distance)
    pub rear_min_ft: Option<f64>,
}

impl Default for SetbackAdjustment {
    fn default() -> Self {
        Self {
            scale: 1.0,
            front_add_ft: 0.0,
            rear_add_ft: 0.0,
            interior_side_add_ft: 0.0,
            street_side_add_ft: 0.0,
            excess_height_fraction: 0.0,
            rear_min_ft: None,
        }
    }
}

/// Ordered rule table resolving applicable setbacks for a site
#[derive(Debug, Clone)]
pub struct SetbackRuleTable {
    rules: Vec<SetbackRule>,
}

impl SetbackRuleTable {
    /// Empty table: base setbacks apply unmodified
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Default rows, in precedence order:
    /// 1. accessory structures keep half the principal setbacks;
    /// 2. lots platted before 1959-01-01 keep 80% of current setbacks;
    /// 3. abutting a lower-density zone adds 5 ft to interior sides;
    /// 4. waterfront rear setbacks floor at 25 ft from mean high water,
    ///    15 ft where a seawall exists;
    /// 5. above 35 ft of height, all setbacks grow by 0.5 ft per foot of
    ///    excess height.
    pub fn with_defaults() -> Self {
        let mut table = Self::empty();

        table.push(SetbackRule {
            structure: Some(StructureType::Accessory),
            min_height_ft: None,
            abuts_lower_density_zone: None,
            platted_before: None,
            waterfront: None,
            adjust: SetbackAdjustment {
                scale: 0.5,
                ..Default::default()
            },
        });

        // NaiveDate::from_ymd_opt only fails on out-of-range dates
        let plat_cutoff = NaiveDate::from_ymd_opt(1959, 1, 1).expect("valid cutoff date");
        table.push(SetbackRule {
            structure: None,
            min_height_ft: None,
            abuts_lower_density_zone: None,
            platted_before: Some(plat_cutoff),
            waterfront: None,
            adjust: SetbackAdjustment {
                scale: 0.8,
                ..Default::default()
            },
        });

        table.push(SetbackRule {
            structure: None,
            min_height_ft: None,
            abuts_lower_density_zone: Some(true),
            platted_before: None,
            waterfront: None,
            adjust: SetbackAdjustment {
                interior_side_add_ft: 5.0,
                ..Default::default()
            },
        });

        table.push(SetbackRule {
            structure: None,
            min_height_ft: None,
            abuts_lower_density_zone: None,
            platted_before: None,
            waterfront: Some(Waterfront::OpenShore),
            adjust: SetbackAdjustment {
                rear_min_ft: Some(25.0),
                ..Default::default()
            },
        });
        table.push(SetbackRule {
            structure: None,
            min_height_ft: None,
            abuts_lower_density_zone: None,
            platted_before: None,
            waterfront: Some(Waterfront::Seawalled),
            adjust: SetbackAdjustment {
                rear_min_ft: Some(15.0),
                ..Default::default()
            },
        });

        table.push(SetbackRule {
            structure: None,
            min_height_ft: Some(35.0),
            abuts_lower_density_zone: None,
            platted_before: None,
            waterfront: None,
            adjust: SetbackAdjustment {
                excess_height_fraction: 0.5,
                ..Default::default()
            },
        });

        table
    }

    /// Append a jurisdiction-specific row (applied after existing rows)
    pub fn push(&mut self, rule: SetbackRule) {
        self.rules.push(rule);
    }

    /// Resolve applicable setbacks for a site from its base values
    pub fn resolve(&self, base: ResolvedSetbacks, ctx: &SetbackContext) -> ResolvedSetbacks {
        let mut resolved = base;
        for rule in &self.rules {
            if !rule.matches(ctx) {
                continue;
            }
            let adjust = &rule.adjust;

            resolved.front_ft *= adjust.scale;
            resolved.rear_ft *= adjust.scale;
            resolved.interior_side_ft *= adjust.scale;
            resolved.street_side_ft *= adjust.scale;

            resolved.front_ft += adjust.front_add_ft;
            resolved.rear_ft += adjust.rear_add_ft;
            resolved.interior_side_ft += adjust.interior_side_add_ft;
            resolved.street_side_ft += adjust.street_side_add_ft;

            if adjust.excess_height_fraction > 0.0 {
                if let (Some(threshold), Some(height)) = (rule.min_height_ft, ctx.height_ft) {
                    let extra = adjust.excess_height_fraction * (height - threshold).max(0.0);
                    resolved.front_ft += extra;
                    resolved.rear_ft += extra;
                    resolved.interior_side_ft += extra;
                    resolved.street_side_ft += extra;
                }
            }

            if let Some(floor) = adjust.rear_min_ft {
                resolved.rear_ft = resolved.rear_ft.max(floor);
            }
        }
        resolved
    }
}

impl Default for SetbackRuleTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Net buildable footprint after setbacks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildableEnvelope {
    pub width_ft: f64,
    pub depth_ft: f64,
    pub area_sqft: f64,
}

/// Compute the net footprint from lot dimensions and resolved setbacks.
///
/// Interior side setbacks apply to both sides; front and rear each apply
/// once. Dimensions consumed entirely by setbacks clamp to zero: the
/// envelope is then a computed zero, not a missing value.
pub fn buildable_envelope(
    lot_width_ft: f64,
    lot_depth_ft: f64,
    setbacks: &ResolvedSetbacks,
) -> BuildableEnvelope {
    let width = (lot_width_ft - 2.0 * setbacks.interior_side_ft).max(0.0);
    let depth = (lot_depth_ft - setbacks.front_ft - setbacks.rear_ft).max(0.0);
    BuildableEnvelope {
        width_ft: width,
        depth_ft: depth,
        area_sqft: width * depth,
    }
}
