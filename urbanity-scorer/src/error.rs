//! Error types raised while integrating layers into composite scores.

use thiserror::Error;
use urbanity_core::{Layer, TransformError};

/// Errors raised by the scoring pipeline.
///
/// Degenerate statistics are not errors: they fall back to equal weights and
/// are reported through [`urbanity_core::WeightSource`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoringError {
    /// A raw layer value could not be log-transformed.
    #[error(transparent)]
    Transform(#[from] TransformError),
    /// A layer present in the inputs has no weight.
    #[error("no weight was estimated for layer {layer}")]
    MissingWeight {
        /// Layer lacking a weight.
        layer: Layer,
    },
    /// No layer tables were supplied.
    #[error("at least one layer table is required to score municipalities")]
    NoLayers,
}
