//! Facade crate for the urbanity score engine.
//!
//! This crate re-exports the core domain types and the scoring pipeline, and
//! exposes the file readers and GeoJSON joiner behind the `geojson` feature.

#![forbid(unsafe_code)]

pub use urbanity_core::{
    CompositeScores, FallbackReason, Layer, LayerSnapshot, LayerTable, LayerValue,
    MunicipalityCode, MunicipalityCodeError, MunicipalityScore, SCORE_MAX, SCORE_MIN,
    TransformError, TransformedLayer, TransformedLayers, WeightSource, WeightVector,
};
pub use urbanity_scorer::{
    ScoreDistribution, ScoringError, estimate_weights, integrate, score_composites,
};

#[cfg(feature = "geojson")]
pub use urbanity_data::{
    ArtefactWriteError, BoundaryError, JoinOptions, LayerReadError, LayerSources, ScoreRecord,
    ScoreTable, join_scores, read_boundaries, read_snapshot, score_table, write_outputs,
};
