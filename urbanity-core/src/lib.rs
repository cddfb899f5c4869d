//! Core domain types for the urbanity score engine.
//!
//! The pipeline fuses four independently sourced layers (nighttime light,
//! population, POI density, land price) into one 0–100 score per
//! municipality. This crate holds the types that flow between the stages:
//! municipality codes, raw layer tables, transformed layers, weight vectors
//! and composite scores. Constructors validate their inputs so downstream
//! stages can rely on the invariants instead of re-checking them.

#![forbid(unsafe_code)]

mod code;
mod layer;
mod score;
mod transform;
mod weights;

pub use code::{CODE_WIDTH, MunicipalityCode, MunicipalityCodeError};
pub use layer::{InvalidLayerValue, Layer, LayerSnapshot, LayerTable};
pub use score::{CompositeScores, LayerValue, MunicipalityScore, SCORE_MAX, SCORE_MIN};
pub use transform::{
    TransformError, TransformedLayer, TransformedLayers, log_transform, transform_snapshot,
};
pub use weights::{FallbackReason, WeightSource, WeightVector};
