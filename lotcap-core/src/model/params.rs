//! Numeric zoning parameters for one (jurisdiction, district) pair
//!
//! Every numeric field is an explicit `Option`: `None` means the regulation
//! was not extracted or does not apply. Presence is never inferred from
//! sentinel values or empty strings; upstream extraction hands over typed
//! numbers or nothing.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Unique key for a district's zoning rules within a jurisdiction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistrictKey {
    pub jurisdiction: String,
    pub district: String,
}

impl DistrictKey {
    pub fn new(jurisdiction: impl Into<String>, district: impl Into<String>) -> Self {
        Self {
            jurisdiction: jurisdiction.into(),
            district: district.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jurisdiction.trim().is_empty() {
            return Err(Error::Validation(
                "jurisdiction: must not be empty".to_string(),
            ));
        }
        if self.district.trim().is_empty() {
            return Err(Error::Validation("district: must not be empty".to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Display for DistrictKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.jurisdiction, self.district)
    }
}

/// Validated numeric zoning rules for one district
///
/// `max_lot_coverage` is a fraction in [0, 1], not a percentage.
/// `transect_family` marks form-based districts whose density cap is shared
/// across a band (see [`crate::calc::transect::TransectTable`]); it is an
/// explicit flag set by the extraction layer, never guessed from the
/// district code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoningParameterSet {
    pub jurisdiction: String,
    pub district: String,

    pub max_density_units_per_acre: Option<f64>,
    pub min_lot_area_per_unit_sqft: Option<f64>,
    pub far: Option<f64>,
    pub max_lot_coverage: Option<f64>,
    pub max_height_ft: Option<f64>,
    pub max_stories: Option<u32>,
    pub setback_front_ft: Option<f64>,
    pub setback_rear_ft: Option<f64>,
    pub setback_interior_side_ft: Option<f64>,
    pub setback_street_side_ft: Option<f64>,
    pub min_unit_size_sqft: Option<f64>,
    pub min_lot_width_ft: Option<f64>,
    pub parking_spaces_per_unit: Option<f64>,

    pub transect_family: Option<String>,
}

impl ZoningParameterSet {
    pub fn key(&self) -> DistrictKey {
        DistrictKey::new(self.jurisdiction.clone(), self.district.clone())
    }

    /// Reject negative or non-finite values and malformed keys.
    ///
    /// Validation runs before any evaluation; evaluators may then assume
    /// every present field is a finite non-negative number.
    pub fn validate(&self) -> Result<()> {
        self.key().validate()?;

        check_field("max_density_units_per_acre", self.max_density_units_per_acre)?;
        check_field("min_lot_area_per_unit_sqft", self.min_lot_area_per_unit_sqft)?;
        check_field("far", self.far)?;
        check_field("max_lot_coverage", self.max_lot_coverage)?;
        check_field("max_height_ft", self.max_height_ft)?;
        check_field("setback_front_ft", self.setback_front_ft)?;
        check_field("setback_rear_ft", self.setback_rear_ft)?;
        check_field("setback_interior_side_ft", self.setback_interior_side_ft)?;
        check_field("setback_street_side_ft", self.setback_street_side_ft)?;
        check_field("min_unit_size_sqft", self.min_unit_size_sqft)?;
        check_field("min_lot_width_ft", self.min_lot_width_ft)?;
        check_field("parking_spaces_per_unit", self.parking_spaces_per_unit)?;

        if let Some(coverage) = self.max_lot_coverage {
            if coverage > 1.0 {
                return Err(Error::Validation(format!(
                    "max_lot_coverage: value {} out of range [0.0, 1.0] (fraction, not percent)",
                    coverage
                )));
            }
        }

        if let Some(family) = &self.transect_family {
            if family.trim().is_empty() {
                return Err(Error::Validation(
                    "transect_family: must not be empty when present".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn check_field(name: &str, value: Option<f64>) -> Result<()> {
    if let Some(v) = value {
        if !v.is_finite() {
            return Err(Error::Validation(format!(
                "{}: value {} is not a finite number",
                name, v
            )));
        }
        if v < 0.0 {
            return Err(Error::Validation(format!(
                "{}: value {} out of range (must be >= 0)",
                name, v
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ZoningParameterSet {
        ZoningParameterSet {
            jurisdiction: "miami_gardens".to_string(),
            district: "R-1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_empty_params() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_missing_key_rejected() {
        let mut params = base();
        params.district = "".to_string();
        assert!(params.validate().is_err());

        let mut params = base();
        params.jurisdiction = "  ".to_string();
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_negative_value_rejected() {
        let mut params = base();
        params.far = Some(-0.5);
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("far"));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut params = base();
        params.max_density_units_per_acre = Some(f64::NAN);
        assert!(params.validate().is_err());

        params.max_density_units_per_acre = Some(f64::INFINITY);
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_coverage_is_a_fraction() {
        let mut params = base();
        params.max_lot_coverage = Some(0.4);
        assert!(params.validate().is_ok());

        // 40 (percent) instead of 0.40 is the classic extraction mistake
        params.max_lot_coverage = Some(40.0);
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let mut params = base();
        params.max_density_units_per_acre = Some(25.0);
        params.far = Some(1.0);
        params.transect_family = Some("T4".to_string());

        let json = serde_json::to_string(&params).unwrap();
        let back: ZoningParameterSet = serde_json::from_str(&json).unwrap();
        assert_eq!(params, back);
    }
}
