//! Parcel geometry and site context

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Waterfront status of a parcel
///
/// Affects the rear setback: the buildable envelope must keep a minimum
/// distance from the mean high-water line, reduced where a seawall exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waterfront {
    OpenShore,
    Seawalled,
}

/// Lot area, dimensions, and site context for one parcel
///
/// Width and depth are optional but travel together; the width x depth ≈ area
/// consistency is assumed pre-validated by the caller and is not reconciled
/// here. `plat_date` and `abuts_lower_density_zone` feed the setback rule
/// table (`calc::envelope`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParcelGeometry {
    pub lot_area_sqft: f64,
    pub lot_width_ft: Option<f64>,
    pub lot_depth_ft: Option<f64>,
    pub waterfront: Option<Waterfront>,
    pub plat_date: Option<NaiveDate>,
    #[serde(default)]
    pub abuts_lower_density_zone: bool,
}

impl ParcelGeometry {
    pub fn validate(&self) -> Result<()> {
        if !self.lot_area_sqft.is_finite() || self.lot_area_sqft <= 0.0 {
            return Err(Error::Validation(format!(
                "lot_area_sqft: value {} out of range (must be finite and > 0)",
                self.lot_area_sqft
            )));
        }

        match (self.lot_width_ft, self.lot_depth_ft) {
            (None, None) => {}
            (Some(width), Some(depth)) => {
                for (name, v) in [("lot_width_ft", width), ("lot_depth_ft", depth)] {
                    if !v.is_finite() || v <= 0.0 {
                        return Err(Error::Validation(format!(
                            "{}: value {} out of range (must be finite and > 0)",
                            name, v
                        )));
                    }
                }
            }
            _ => {
                return Err(Error::Validation(
                    "lot_width_ft/lot_depth_ft: both must be present or both absent".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn dimensions(&self) -> Option<(f64, f64)> {
        match (self.lot_width_ft, self.lot_depth_ft) {
            (Some(width), Some(depth)) => Some((width, depth)),
            _ => None,
        }
    }

    /// Deterministic geometry-class string for result-cache keys.
    ///
    /// Dimensions are rounded to whole feet/sqft: parcels that differ below
    /// that resolution produce the same analysis anyway. Every field that can
    /// change the outcome (waterfront, plat date, adjacency) participates.
    pub fn fingerprint(&self) -> String {
        let dims = match self.dimensions() {
            Some((width, depth)) => format!("{:.0}x{:.0}", width, depth),
            None => "nodim".to_string(),
        };
        let waterfront = match self.waterfront {
            None => "dry",
            Some(Waterfront::OpenShore) => "wf",
            Some(Waterfront::Seawalled) => "wf-sw",
        };
        let plat = match self.plat_date {
            Some(date) => date.format("%Y%m%d").to_string(),
            None => "noplat".to_string(),
        };
        let adjacency = if self.abuts_lower_density_zone { "abuts" } else { "interior" };
        format!(
            "{:.0}sf:{}:{}:{}:{}",
            self.lot_area_sqft, dims, waterfront, plat, adjacency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_must_be_positive() {
        let geometry = ParcelGeometry {
            lot_area_sqft: 0.0,
            ..Default::default()
        };
        assert!(geometry.validate().is_err());

        let geometry = ParcelGeometry {
            lot_area_sqft: -100.0,
            ..Default::default()
        };
        assert!(geometry.validate().is_err());
    }

    #[test]
    fn test_width_and_depth_travel_together() {
        let geometry = ParcelGeometry {
            lot_area_sqft: 7500.0,
            lot_width_ft: Some(75.0),
            lot_depth_ft: None,
            ..Default::default()
        };
        assert!(geometry.validate().is_err());

        let geometry = ParcelGeometry {
            lot_area_sqft: 7500.0,
            lot_width_ft: Some(75.0),
            lot_depth_ft: Some(100.0),
            ..Default::default()
        };
        assert!(geometry.validate().is_ok());
    }

    #[test]
    fn test_fingerprint_is_stable_and_discriminating() {
        let geometry = ParcelGeometry {
            lot_area_sqft: 7500.0,
            lot_width_ft: Some(75.0),
            lot_depth_ft: Some(100.0),
            ..Default::default()
        };
        assert_eq!(geometry.fingerprint(), geometry.fingerprint());
        assert_eq!(geometry.fingerprint(), "7500sf:75x100:dry:noplat:interior");

        let mut waterfront = geometry.clone();
        waterfront.waterfront = Some(Waterfront::Seawalled);
        assert_ne!(geometry.fingerprint(), waterfront.fingerprint());

        let mut platted = geometry.clone();
        platted.plat_date = NaiveDate::from_ymd_opt(1957, 6, 1);
        assert_ne!(geometry.fingerprint(), platted.fingerprint());
    }
}
