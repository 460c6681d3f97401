//! Constraint evaluators: one pure function per regulatory axis
//!
//! Each evaluator either produces a [`ConstraintResult`] or a skip with a
//! human-readable note. Missing optional inputs are skips, never errors;
//! negative or non-finite inputs never reach this module (validation rejects
//! them first). All evaluators floor fractional unit counts.

use crate::config::CalcConfig;
use crate::model::{ConstraintKind, ConstraintResult, ParcelGeometry, ZoningParameterSet};

/// Square feet per acre
pub const SQFT_PER_ACRE: f64 = 43_560.0;

/// Outcome of running one evaluator
#[derive(Debug, Clone)]
pub enum ConstraintEval {
    Evaluated(ConstraintResult),
    /// The constraint could not be evaluated. `missing_core_field` is true
    /// when the gap is one of the core extraction fields (density cap, FAR,
    /// height); those skips cap the analysis confidence.
    Skipped {
        note: String,
        missing_core_field: bool,
    },
}

impl ConstraintEval {
    pub fn result(&self) -> Option<&ConstraintResult> {
        match self {
            ConstraintEval::Evaluated(result) => Some(result),
            ConstraintEval::Skipped { .. } => None,
        }
    }
}

/// Where the effective per-acre density cap came from
#[derive(Debug, Clone)]
pub enum DensityCap {
    /// The district's own max density field
    District(f64),
    /// Shared cap for a transect family (form-based zoning)
    Transect { family: String, units_per_acre: f64 },
}

impl DensityCap {
    fn units_per_acre(&self) -> f64 {
        match self {
            DensityCap::District(units) => *units,
            DensityCap::Transect { units_per_acre, .. } => *units_per_acre,
        }
    }

    fn describe(&self) -> String {
        match self {
            DensityCap::District(units) => format!("{} units/acre", units),
            DensityCap::Transect { family, units_per_acre } => {
                format!("{} units/acre ({} transect band)", units_per_acre, family)
            }
        }
    }
}

fn evaluated(kind: ConstraintKind, raw_units: f64, formula: String) -> ConstraintEval {
    ConstraintEval::Evaluated(ConstraintResult {
        kind,
        raw_units,
        units: raw_units.floor() as u32,
        formula,
        governing: false,
    })
}

/// Density-family constraint: per-acre cap and/or minimum lot area per unit.
///
/// With both figures present the more restrictive (smaller) one binds and
/// the formula names which. The per-acre cap is pre-resolved by the caller
/// so the transect override happens in exactly one place.
pub fn evaluate_density(
    params: &ZoningParameterSet,
    geometry: &ParcelGeometry,
    cap: Option<&DensityCap>,
) -> ConstraintEval {
    let lot_acres = geometry.lot_area_sqft / SQFT_PER_ACRE;

    let per_acre = cap.map(|cap| {
        let raw = cap.units_per_acre() * lot_acres;
        let formula = format!("{} x {:.4} acres = {:.2}", cap.describe(), lot_acres, raw);
        (raw, formula)
    });

    let per_lot_area = params.min_lot_area_per_unit_sqft.map(|min_area| {
        let raw = geometry.lot_area_sqft / min_area;
        let formula = format!(
            "{:.0} sqft / {:.0} sqft/unit = {:.2}",
            geometry.lot_area_sqft, min_area, raw
        );
        (raw, formula)
    });

    match (per_acre, per_lot_area) {
        (None, None) => ConstraintEval::Skipped {
            note: "Density constraint skipped: no density cap or minimum lot area per unit \
                   extracted."
                .to_string(),
            missing_core_field: true,
        },
        (Some((raw, formula)), None) | (None, Some((raw, formula))) => {
            evaluated(ConstraintKind::Density, raw, formula)
        }
        (Some((acre_raw, acre_formula)), Some((area_raw, area_formula))) => {
            if area_raw < acre_raw {
                let formula =
                    format!("{} (more restrictive than {})", area_formula, acre_formula);
                evaluated(ConstraintKind::Density, area_raw, formula)
            } else {
                let formula =
                    format!("{} (more restrictive than {})", acre_formula, area_formula);
                evaluated(ConstraintKind::Density, acre_raw, formula)
            }
        }
    }
}

/// Floor-area-ratio constraint: total bulk divided into minimum-size units
pub fn evaluate_far(params: &ZoningParameterSet, geometry: &ParcelGeometry) -> ConstraintEval {
    let Some(far) = params.far else {
        return ConstraintEval::Skipped {
            note: "FAR constraint skipped: floor area ratio not extracted.".to_string(),
            missing_core_field: true,
        };
    };
    let Some(unit_size) = params.min_unit_size_sqft else {
        return ConstraintEval::Skipped {
            note: "FAR constraint skipped: minimum unit size not extracted.".to_string(),
            missing_core_field: false,
        };
    };
    if unit_size == 0.0 {
        return ConstraintEval::Skipped {
            note: "FAR constraint skipped: minimum unit size is zero.".to_string(),
            missing_core_field: false,
        };
    }

    let max_floor_area = geometry.lot_area_sqft * far;
    let raw = max_floor_area / unit_size;
    let formula = format!(
        "FAR {} x {:.0} sqft = {:.0} sqft / {:.0} sqft/unit = {:.2}",
        far, geometry.lot_area_sqft, max_floor_area, unit_size, raw
    );
    evaluated(ConstraintKind::Far, raw, formula)
}

/// Lot-coverage / buildable-envelope constraint.
///
/// The footprint is the smaller of the setback envelope and the coverage
/// cap; stacked to the story limit it bounds total floor area, further
/// capped by FAR when FAR is present. Missing lot dimensions skip this
/// constraint; the whole lot is never silently treated as buildable.
pub fn evaluate_lot_coverage(
    params: &ZoningParameterSet,
    geometry: &ParcelGeometry,
    buildable_area_sqft: Option<f64>,
) -> ConstraintEval {
    let Some(coverage) = params.max_lot_coverage else {
        return ConstraintEval::Skipped {
            note: "Lot coverage constraint skipped: max lot coverage not extracted.".to_string(),
            missing_core_field: false,
        };
    };
    let Some(stories) = params.max_stories else {
        return ConstraintEval::Skipped {
            note: "Lot coverage constraint skipped: max height in stories not extracted."
                .to_string(),
            missing_core_field: true,
        };
    };
    let Some(unit_size) = params.min_unit_size_sqft else {
        return ConstraintEval::Skipped {
            note: "Lot coverage constraint skipped: minimum unit size not extracted.".to_string(),
            missing_core_field: false,
        };
    };
    let Some(buildable) = buildable_area_sqft else {
        return ConstraintEval::Skipped {
            note: "Lot coverage constraint skipped: lot width/depth unavailable, buildable \
                   envelope not computed."
                .to_string(),
            missing_core_field: false,
        };
    };
    if unit_size == 0.0 || stories == 0 {
        return ConstraintEval::Skipped {
            note: "Lot coverage constraint skipped: zero stories or zero unit size.".to_string(),
            missing_core_field: false,
        };
    }

    let coverage_cap = geometry.lot_area_sqft * coverage;
    let footprint = buildable.min(coverage_cap);
    let mut floor_area = footprint * stories as f64;
    let mut far_clause = String::new();
    if let Some(far) = params.far {
        let far_cap = geometry.lot_area_sqft * far;
        if far_cap < floor_area {
            floor_area = far_cap;
            far_clause = format!(", capped by FAR {} to {:.0} sqft", far, far_cap);
        }
    }

    let raw = floor_area / unit_size;
    let formula = format!(
        "min({:.0} sqft buildable, {:.0} sqft x {} = {:.0} sqft) x {} stories{} / \
         {:.0} sqft/unit = {:.2}",
        buildable,
        geometry.lot_area_sqft,
        coverage,
        coverage_cap,
        stories,
        far_clause,
        unit_size,
        raw
    );
    evaluated(ConstraintKind::LotCoverage, raw, formula)
}

/// Floor-area figure the parking constraint reserves against
#[derive(Debug, Clone, Copy)]
pub struct FloorAreaBasis {
    pub sqft: f64,
    pub source: &'static str,
}

/// Best available floor-area figure: FAR-derived, else envelope-derived
pub fn floor_area_basis(
    params: &ZoningParameterSet,
    geometry: &ParcelGeometry,
    buildable_area_sqft: Option<f64>,
) -> Option<FloorAreaBasis> {
    if let Some(far) = params.far {
        return Some(FloorAreaBasis {
            sqft: geometry.lot_area_sqft * far,
            source: "FAR floor area",
        });
    }
    let buildable = buildable_area_sqft?;
    let stories = params.max_stories? as f64;
    let footprint = match params.max_lot_coverage {
        Some(coverage) => buildable.min(geometry.lot_area_sqft * coverage),
        None => buildable,
    };
    Some(FloorAreaBasis {
        sqft: footprint * stories,
        source: "envelope floor area",
    })
}

/// Parking constraint: reserve floor area for the estimated parking demand
/// and count the units the remainder supports.
///
/// Demand is estimated from the density-based unit figure; the reservation
/// uses the configured area-per-space coefficient, and the circulation
/// deduction comes off the gross figure first. The remainder never counts
/// below zero units.
pub fn evaluate_parking(
    params: &ZoningParameterSet,
    density_units: Option<u32>,
    basis: Option<FloorAreaBasis>,
    config: &CalcConfig,
) -> ConstraintEval {
    let Some(spaces_per_unit) = params.parking_spaces_per_unit else {
        return ConstraintEval::Skipped {
            note: "Parking constraint skipped: parking requirement not extracted.".to_string(),
            missing_core_field: false,
        };
    };
    let Some(demand_units) = density_units else {
        return ConstraintEval::Skipped {
            note: "Parking constraint skipped: no density-based unit estimate to size demand."
                .to_string(),
            missing_core_field: false,
        };
    };
    let Some(basis) = basis else {
        return ConstraintEval::Skipped {
            note: "Parking constraint skipped: no floor-area figure available.".to_string(),
            missing_core_field: false,
        };
    };
    let Some(unit_size) = params.min_unit_size_sqft else {
        return ConstraintEval::Skipped {
            note: "Parking constraint skipped: minimum unit size not extracted.".to_string(),
            missing_core_field: false,
        };
    };
    if unit_size == 0.0 {
        return ConstraintEval::Skipped {
            note: "Parking constraint skipped: minimum unit size is zero.".to_string(),
            missing_core_field: false,
        };
    }

    let usable = basis.sqft * (1.0 - config.parking_circulation_fraction);
    let reserved =
        demand_units as f64 * spaces_per_unit * config.parking_area_per_space_sqft;
    let remaining = (usable - reserved).max(0.0);
    let raw = remaining / unit_size;
    let formula = format!(
        "{:.0} sqft {} x {} usable - {} units x {} spaces/unit x {} sqft/space = \
         {:.0} sqft / {:.0} sqft/unit = {:.2}",
        basis.sqft,
        basis.source,
        1.0 - config.parking_circulation_fraction,
        demand_units,
        spaces_per_unit,
        config.parking_area_per_space_sqft,
        remaining,
        unit_size,
        raw
    );
    evaluated(ConstraintKind::Parking, raw, formula)
}
