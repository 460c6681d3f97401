//! Deterministic max-allowable-units calculator
//!
//! Pure and synchronous: validated zoning parameters plus parcel geometry in,
//! [`DensityAnalysis`] out, no I/O anywhere on the path. Identical inputs
//! always produce identical output, including constraint ordering, so results
//! are cacheable by construction.

pub mod constraints;
pub mod envelope;
pub mod selector;
pub mod transect;

pub use constraints::{ConstraintEval, DensityCap, FloorAreaBasis, SQFT_PER_ACRE};
pub use envelope::{
    buildable_envelope, BuildableEnvelope, ResolvedSetbacks, SetbackAdjustment, SetbackContext,
    SetbackRule, SetbackRuleTable, StructureType,
};
pub use transect::TransectTable;

use tracing::debug;

use crate::config::CalcConfig;
use crate::model::{DensityAnalysis, ParcelGeometry, ZoningParameterSet};
use crate::Result;

use constraints::{
    evaluate_density, evaluate_far, evaluate_lot_coverage, evaluate_parking, floor_area_basis,
};

/// Evaluates every applicable constraint for a parcel and reduces them to
/// the binding answer
///
/// Owns the evaluator tunables and the two jurisdiction tables (transect
/// density bands, setback rules). Cheap to clone; safe to share across
/// threads; evaluation never mutates.
#[derive(Debug, Clone)]
pub struct Calculator {
    config: CalcConfig,
    transects: TransectTable,
    setbacks: SetbackRuleTable,
}

impl Calculator {
    /// Calculator with default tables
    pub fn new(config: CalcConfig) -> Result<Self> {
        Self::with_tables(config, TransectTable::with_defaults(), SetbackRuleTable::with_defaults())
    }

    /// Calculator with jurisdiction-specific tables
    pub fn with_tables(
        config: CalcConfig,
        transects: TransectTable,
        setbacks: SetbackRuleTable,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transects,
            setbacks,
        })
    }

    pub fn config(&self) -> &CalcConfig {
        &self.config
    }

    /// Calculate maximum allowable dwelling units from zoning parameters.
    ///
    /// Evaluation order is fixed: density, FAR, lot coverage, parking.
    /// Constraints lacking inputs are skipped with a note and lower the
    /// confidence instead of failing the call.
    pub fn evaluate(
        &self,
        params: &ZoningParameterSet,
        geometry: &ParcelGeometry,
    ) -> Result<DensityAnalysis> {
        params.validate()?;
        geometry.validate()?;

        let mut notes: Vec<String> = Vec::new();

        // Effective per-acre density cap. Transect-flagged districts use the
        // shared band cap and ignore the per-district field entirely.
        let cap = match &params.transect_family {
            Some(family) => match self.transects.density_cap(family) {
                Some(units_per_acre) => {
                    notes.push(format!(
                        "Density taken from transect family {} shared cap ({} units/acre).",
                        family, units_per_acre
                    ));
                    Some(DensityCap::Transect {
                        family: family.clone(),
                        units_per_acre,
                    })
                }
                None => {
                    notes.push(format!(
                        "Transect family {} has no shared density cap on record; per-acre \
                         density not evaluated.",
                        family
                    ));
                    None
                }
            },
            None => params.max_density_units_per_acre.map(DensityCap::District),
        };

        // Net buildable footprint, when lot dimensions exist
        let envelope = geometry.dimensions().map(|(width, depth)| {
            let base = ResolvedSetbacks::from_params(params);
            let ctx = SetbackContext::principal(params, geometry);
            let resolved = self.setbacks.resolve(base, &ctx);
            let envelope = buildable_envelope(width, depth, &resolved);
            if envelope.area_sqft <= 0.0 {
                notes.push(format!(
                    "Setbacks ({}' front, {}' rear, {}' each side) exceed lot dimensions \
                     ({}' x {}').",
                    resolved.front_ft, resolved.rear_ft, resolved.interior_side_ft, width, depth
                ));
            }
            envelope
        });
        let buildable_area = envelope.map(|e| e.area_sqft);

        let density = evaluate_density(params, geometry, cap.as_ref());
        let far = evaluate_far(params, geometry);
        let coverage = evaluate_lot_coverage(params, geometry, buildable_area);

        let density_units = density.result().map(|r| r.units);
        let basis = floor_area_basis(params, geometry, buildable_area);
        let parking = evaluate_parking(params, density_units, basis, &self.config);

        let analysis = selector::select(
            vec![density, far, coverage, parking],
            geometry.lot_area_sqft,
            buildable_area,
            notes,
        );

        debug!(
            district = %params.key(),
            max_units = analysis.max_units,
            governing = analysis.governing_label(),
            confidence = %analysis.confidence,
            "Density analysis complete"
        );

        Ok(analysis)
    }
}
