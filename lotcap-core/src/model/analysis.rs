//! Analysis output types: per-constraint results and the final breakdown

use serde::{Deserialize, Serialize};

/// Regulatory axes the calculator evaluates
///
/// The wire names are stable identifiers consumed by reports and the API
/// layer, never free text. The enum order is also the fixed evaluation and
/// tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Density,
    Far,
    LotCoverage,
    Parking,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::Density => "density",
            ConstraintKind::Far => "far",
            ConstraintKind::LotCoverage => "lot_coverage",
            ConstraintKind::Parking => "parking",
        }
    }

    /// All kinds, in evaluation order
    pub fn all() -> &'static [ConstraintKind] {
        &[
            ConstraintKind::Density,
            ConstraintKind::Far,
            ConstraintKind::LotCoverage,
            ConstraintKind::Parking,
        ]
    }
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Confidence classification for an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        };
        write!(f, "{}", s)
    }
}

/// One constraint's contribution to the max-units calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintResult {
    pub kind: ConstraintKind,
    /// Unit capacity before flooring
    pub raw_units: f64,
    /// Floored unit capacity
    pub units: u32,
    /// Human-readable audit trail naming the inputs used
    pub formula: String,
    /// True for every constraint achieving the binding minimum (ties share it)
    pub governing: bool,
}

/// Max allowable units on a lot, with full constraint breakdown
///
/// Constructed once per (parameter set, geometry) pair and immutable after
/// construction; the cache stores it by that pair's key. `constraints` holds
/// every constraint that had sufficient inputs, in evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityAnalysis {
    pub max_units: u32,
    #[serde(with = "governing_serde")]
    pub governing_constraint: Option<ConstraintKind>,
    pub constraints: Vec<ConstraintResult>,
    pub lot_size_sqft: f64,
    pub buildable_area_sqft: Option<f64>,
    pub confidence: Confidence,
    /// Skipped constraints, applied overrides, infeasibility explanations
    pub notes: Vec<String>,
}

impl DensityAnalysis {
    /// Wire name of the governing constraint, `"none"` when nothing was
    /// evaluable.
    pub fn governing_label(&self) -> &'static str {
        match self.governing_constraint {
            Some(kind) => kind.as_str(),
            None => "none",
        }
    }
}

/// Serializes `governing_constraint` as the constraint name or `"none"`
/// rather than a JSON null, matching what report consumers expect.
mod governing_serde {
    use super::ConstraintKind;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<ConstraintKind>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(kind) => kind.serialize(serializer),
            None => "none".serialize(serializer),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ConstraintKind>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == "none" {
            return Ok(None);
        }
        serde_json::from_value(serde_json::Value::String(raw))
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(ConstraintKind::Density.as_str(), "density");
        assert_eq!(ConstraintKind::Far.as_str(), "far");
        assert_eq!(ConstraintKind::LotCoverage.as_str(), "lot_coverage");
        assert_eq!(ConstraintKind::Parking.as_str(), "parking");

        let json = serde_json::to_string(&ConstraintKind::LotCoverage).unwrap();
        assert_eq!(json, "\"lot_coverage\"");
    }

    #[test]
    fn test_governing_serializes_as_none_string() {
        let analysis = DensityAnalysis {
            max_units: 0,
            governing_constraint: None,
            constraints: vec![],
            lot_size_sqft: 7500.0,
            buildable_area_sqft: None,
            confidence: Confidence::Low,
            notes: vec![],
        };
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["governing_constraint"], "none");
        assert_eq!(json["confidence"], "low");

        let back: DensityAnalysis = serde_json::from_value(json).unwrap();
        assert_eq!(back.governing_constraint, None);
    }

    #[test]
    fn test_governing_round_trips_when_present() {
        let analysis = DensityAnalysis {
            max_units: 4,
            governing_constraint: Some(ConstraintKind::Density),
            constraints: vec![],
            lot_size_sqft: 7500.0,
            buildable_area_sqft: Some(2750.0),
            confidence: Confidence::High,
            notes: vec![],
        };
        let json = serde_json::to_string(&analysis).unwrap();
        let back: DensityAnalysis = serde_json::from_str(&json).unwrap();
        assert_eq!(back.governing_constraint, Some(ConstraintKind::Density));
        assert_eq!(back.governing_label(), "density");
    }
}
