//! Binding-constraint selection and confidence classification

use crate::model::{Confidence, ConstraintResult, DensityAnalysis};

use super::constraints::ConstraintEval;

/// Reduce the evaluated constraints to the final analysis.
///
/// The binding capacity is the minimum across evaluated constraints, floored
/// at one unit: a fractional cap on subdivision never prohibits the single
/// dwelling the lot already supports. The exception is the infeasible lot
/// (every evaluated constraint yields zero), which returns an honest zero
/// with an explanatory note. Ties at the minimum all carry the governing
/// flag; the primary reported constraint is the first in evaluation order
/// (density, far, lot_coverage, parking), a deliberate stable tie-break.
///
/// Confidence: high needs at least three evaluated constraints and no skip
/// caused by a missing core field; one or two evaluated constraints (or a
/// core-field gap) is medium; nothing evaluable is low.
pub fn select(
    evals: Vec<ConstraintEval>,
    lot_size_sqft: f64,
    buildable_area_sqft: Option<f64>,
    mut notes: Vec<String>,
) -> DensityAnalysis {
    let mut constraints: Vec<ConstraintResult> = Vec::new();
    let mut core_field_missing = false;

    for eval in evals {
        match eval {
            ConstraintEval::Evaluated(result) => constraints.push(result),
            ConstraintEval::Skipped {
                note,
                missing_core_field,
            } => {
                notes.push(note);
                core_field_missing |= missing_core_field;
            }
        }
    }

    if constraints.is_empty() {
        notes.push(
            "No constraint had sufficient inputs; no numeric zoning parameters available for \
             calculation."
                .to_string(),
        );
        return DensityAnalysis {
            max_units: 0,
            governing_constraint: None,
            constraints,
            lot_size_sqft,
            buildable_area_sqft,
            confidence: Confidence::Low,
            notes,
        };
    }

    let min_units = constraints
        .iter()
        .map(|c| c.units)
        .min()
        .expect("constraints is non-empty");
    for constraint in constraints.iter_mut() {
        if constraint.units == min_units {
            constraint.governing = true;
        }
    }
    let primary = constraints
        .iter()
        .find(|c| c.governing)
        .map(|c| c.kind)
        .expect("at least one constraint is governing");

    let all_zero = constraints.iter().all(|c| c.units == 0);
    let max_units = if all_zero {
        notes.push(format!(
            "Every evaluated constraint yields zero units ({} governs); the lot cannot support \
             a dwelling unit.",
            primary
        ));
        0
    } else {
        if min_units == 0 {
            notes.push(format!(
                "The {} constraint yields zero units; the final figure floors at one dwelling \
                 unit.",
                primary
            ));
        }
        min_units.max(1)
    };

    let confidence = if constraints.len() >= 3 && !core_field_missing {
        Confidence::High
    } else {
        Confidence::Medium
    };

    DensityAnalysis {
        max_units,
        governing_constraint: Some(primary),
        constraints,
        lot_size_sqft,
        buildable_area_sqft,
        confidence,
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConstraintKind;

    fn result(kind: ConstraintKind, units: u32) -> ConstraintEval {
        ConstraintEval::Evaluated(ConstraintResult {
            kind,
            raw_units: units as f64,
            units,
            formula: String::new(),
            governing: false,
        })
    }

    fn skip(core: bool) -> ConstraintEval {
        ConstraintEval::Skipped {
            note: "skipped".to_string(),
            missing_core_field: core,
        }
    }

    #[test]
    fn test_minimum_governs() {
        let analysis = select(
            vec![
                result(ConstraintKind::Density, 4),
                result(ConstraintKind::Far, 10),
                result(ConstraintKind::LotCoverage, 10),
            ],
            7500.0,
            Some(2750.0),
            vec![],
        );

        assert_eq!(analysis.max_units, 4);
        assert_eq!(analysis.governing_constraint, Some(ConstraintKind::Density));
        assert_eq!(analysis.confidence, Confidence::High);
        assert!(analysis.constraints[0].governing);
        assert!(!analysis.constraints[1].governing);
    }

    #[test]
    fn test_ties_share_the_governing_flag() {
        let analysis = select(
            vec![
                result(ConstraintKind::Density, 8),
                result(ConstraintKind::Far, 5),
                result(ConstraintKind::LotCoverage, 5),
            ],
            7500.0,
            None,
            vec![],
        );

        // Primary is the first tied constraint in evaluation order
        assert_eq!(analysis.governing_constraint, Some(ConstraintKind::Far));
        assert!(analysis.constraints[1].governing);
        assert!(analysis.constraints[2].governing);
        assert!(!analysis.constraints[0].governing);
    }

    #[test]
    fn test_no_constraints_is_low_confidence_zero() {
        let analysis = select(vec![skip(true), skip(false)], 7500.0, None, vec![]);

        assert_eq!(analysis.max_units, 0);
        assert_eq!(analysis.governing_constraint, None);
        assert_eq!(analysis.governing_label(), "none");
        assert_eq!(analysis.confidence, Confidence::Low);
        assert!(analysis.notes.iter().any(|n| n.contains("sufficient inputs")));
    }

    #[test]
    fn test_all_zero_is_infeasible() {
        let analysis = select(
            vec![
                result(ConstraintKind::Density, 0),
                result(ConstraintKind::Far, 0),
            ],
            7500.0,
            None,
            vec![],
        );

        assert_eq!(analysis.max_units, 0);
        assert_eq!(analysis.governing_constraint, Some(ConstraintKind::Density));
        assert!(analysis.notes.iter().any(|n| n.contains("cannot support")));
    }

    #[test]
    fn test_zero_minimum_with_feasible_sibling_floors_at_one() {
        let analysis = select(
            vec![
                result(ConstraintKind::Density, 0),
                result(ConstraintKind::Far, 5),
            ],
            7500.0,
            None,
            vec![],
        );

        assert_eq!(analysis.max_units, 1);
        assert_eq!(analysis.governing_constraint, Some(ConstraintKind::Density));
        assert!(analysis.notes.iter().any(|n| n.contains("floors at one")));
    }

    #[test]
    fn test_floor_at_one_unit_when_feasible() {
        let analysis = select(
            vec![result(ConstraintKind::Density, 1)],
            1000.0,
            None,
            vec![],
        );
        assert_eq!(analysis.max_units, 1);
    }

    #[test]
    fn test_core_field_skip_caps_confidence() {
        // Three evaluated, but one skip lost a core field: medium
        let analysis = select(
            vec![
                result(ConstraintKind::Density, 4),
                skip(true),
                result(ConstraintKind::LotCoverage, 10),
                result(ConstraintKind::Parking, 6),
            ],
            7500.0,
            None,
            vec![],
        );
        assert_eq!(analysis.confidence, Confidence::Medium);
    }

    #[test]
    fn test_two_constraints_is_medium() {
        let analysis = select(
            vec![
                result(ConstraintKind::Density, 4),
                result(ConstraintKind::Far, 10),
            ],
            7500.0,
            None,
            vec![],
        );
        assert_eq!(analysis.confidence, Confidence::Medium);
    }

    #[test]
    fn test_skip_notes_are_carried() {
        let analysis = select(
            vec![
                result(ConstraintKind::Density, 4),
                ConstraintEval::Skipped {
                    note: "FAR constraint skipped: floor area ratio not extracted.".to_string(),
                    missing_core_field: true,
                },
            ],
            7500.0,
            None,
            vec!["earlier note".to_string()],
        );

        assert_eq!(analysis.notes[0], "earlier note");
        assert!(analysis.notes[1].contains("FAR constraint skipped"));
    }
}
