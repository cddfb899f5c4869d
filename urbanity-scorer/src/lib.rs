//! Weight estimation and composite scoring for municipality layers.
//!
//! The crate turns a [`LayerSnapshot`] into [`CompositeScores`] in three
//! steps:
//! - every layer is log-transformed (`ln(x + 1)`),
//! - [`estimate_weights`] derives one weight per layer from the first
//!   principal component of the transformed data, restricted to
//!   municipalities present in every layer,
//! - [`score_composites`] min-max rescales each layer to `0.0..=100.0` and
//!   combines the present layers with renormalised weights.
//!
//! [`ScoreDistribution`] summarises a finished score table for reporting.
//!
//! # Examples
//!
//! ```
//! use urbanity_core::{Layer, LayerSnapshot, LayerTable, MunicipalityCode};
//! use urbanity_scorer::integrate;
//!
//! let code = |raw: &str| MunicipalityCode::parse(raw).expect("valid code");
//! let table = |layer| {
//!     LayerTable::from_values(
//!         layer,
//!         [(code("01101"), 1.0), (code("01102"), 2.0), (code("01103"), 100.0)],
//!     )
//!     .expect("valid table")
//! };
//! let snapshot = Layer::ALL
//!     .into_iter()
//!     .fold(LayerSnapshot::new(), |snapshot, layer| snapshot.with_table(table(layer)));
//!
//! let scores = integrate(&snapshot).expect("integrate layers");
//! let top = scores.get(&code("01103")).and_then(|s| s.composite()).expect("score");
//! assert!((top - 100.0).abs() < 1e-9);
//! ```

#![deny(unsafe_code)]

mod composite;
mod distribution;
mod error;
mod estimator;
mod pca;

pub use composite::{DEGENERATE_SCALED_VALUE, LayerBounds, score_composites};
pub use distribution::{
    HISTOGRAM_BIN_WIDTH, HistogramBin, LEVEL_WIDTH, REPORTED_PERCENTILES, ScoreDistribution,
    ScoreLevel,
};
pub use error::ScoringError;
pub use estimator::{MIN_JOINED_MUNICIPALITIES, estimate_weights, joined_codes};

use log::debug;
use urbanity_core::{CompositeScores, LayerSnapshot, transform_snapshot};

/// Run the full scoring pipeline over `snapshot`.
///
/// # Errors
/// Returns [`ScoringError::NoLayers`] for an empty snapshot and
/// [`ScoringError::Transform`] when a raw value is outside the transform's
/// domain.
pub fn integrate(snapshot: &LayerSnapshot) -> Result<CompositeScores, ScoringError> {
    if snapshot.layers().next().is_none() {
        return Err(ScoringError::NoLayers);
    }
    let transformed = transform_snapshot(snapshot)?;
    debug!(
        "transformed {} layers covering {} municipalities",
        transformed.len(),
        snapshot.codes().len()
    );
    let weights = estimate_weights(&transformed);
    score_composites(snapshot, &transformed, &weights)
}
