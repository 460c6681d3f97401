//! # lotcap core library
//!
//! Deterministic maximum-allowable-units calculator for zoned parcels:
//! - Data model: validated zoning parameters and parcel geometry
//! - Constraint evaluators (density, FAR, lot coverage, parking)
//! - Buildable envelope resolution via an explicit setback rule table
//! - Transect (form-based) shared density caps
//! - Binding-constraint selection with confidence classification
//! - Single-flight result cache with a SQLite-backed parameter store
//!
//! The calculator is pure and thread-safe; the cache is the only
//! synchronization point. Obtaining zoning parameters (extraction,
//! geocoding, GIS lookups) is the caller's responsibility. This crate
//! consumes already-validated inputs and produces an auditable breakdown.

pub mod cache;
pub mod calc;
pub mod config;
pub mod error;
pub mod model;

pub use cache::{CacheStore, ResultCache};
pub use calc::Calculator;
pub use config::{CacheConfig, CalcConfig, FileConfig};
pub use error::{Error, Result};
pub use model::{
    Confidence, ConstraintKind, ConstraintResult, DensityAnalysis, DistrictKey, ParcelGeometry,
    Waterfront, ZoningParameterSet,
};
