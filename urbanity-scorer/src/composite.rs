//! Min-max rescaling and the weighted composite.

use std::collections::BTreeMap;

use log::warn;
use urbanity_core::{
    CompositeScores, Layer, LayerSnapshot, LayerValue, MunicipalityCode, MunicipalityScore,
    SCORE_MAX, SCORE_MIN, TransformedLayer, TransformedLayers, WeightVector,
};

use crate::ScoringError;

/// Scaled value used for every municipality when a layer has no spread.
pub const DEGENERATE_SCALED_VALUE: f64 = 50.0;

/// Observed range of one transformed layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerBounds {
    min: f64,
    max: f64,
}

impl LayerBounds {
    /// Smallest and largest transformed value in `layer`, or `None` when the
    /// layer is empty.
    #[must_use]
    pub fn from_layer(layer: &TransformedLayer) -> Option<Self> {
        layer.iter().fold(None, |bounds, (_, value)| {
            Some(match bounds {
                None => Self {
                    min: value,
                    max: value,
                },
                Some(Self { min, max }) => Self {
                    min: min.min(value),
                    max: max.max(value),
                },
            })
        })
    }

    /// Lower bound.
    #[must_use]
    pub const fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub const fn max(&self) -> f64 {
        self.max
    }

    /// Map `value` linearly onto `0.0..=100.0`.
    ///
    /// A layer whose minimum equals its maximum maps every value to
    /// [`DEGENERATE_SCALED_VALUE`].
    ///
    /// # Examples
    /// ```
    /// use urbanity_core::{Layer, MunicipalityCode, TransformedLayer};
    /// use urbanity_scorer::LayerBounds;
    ///
    /// let layer = TransformedLayer::from_raw(
    ///     Layer::LandPrice,
    ///     [
    ///         (MunicipalityCode::parse("01101").expect("code"), 0.0),
    ///         (MunicipalityCode::parse("01102").expect("code"), 9.0),
    ///     ],
    /// )
    /// .expect("transform");
    /// let bounds = LayerBounds::from_layer(&layer).expect("bounds");
    /// assert_eq!(bounds.rescale(bounds.max()), 100.0);
    /// assert_eq!(bounds.rescale(bounds.min()), 0.0);
    /// ```
    #[expect(
        clippy::float_arithmetic,
        reason = "min-max rescaling is floating-point"
    )]
    #[must_use]
    pub fn rescale(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return DEGENERATE_SCALED_VALUE;
        }
        ((value - self.min) / span * SCORE_MAX).clamp(SCORE_MIN, SCORE_MAX)
    }
}

/// Score every municipality that appears in at least one layer.
///
/// Each layer is rescaled with its own bounds. Missing layers drop out of a
/// municipality's weighted mean and the remaining weights are renormalised,
/// so absence never drags a score towards zero. A municipality whose present
/// layers all carry zero weight takes the unweighted mean of those layers.
/// Only a municipality with no layer at all gets no composite.
///
/// # Errors
/// Returns [`ScoringError::MissingWeight`] when a transformed layer has no
/// entry in `weights`.
pub fn score_composites(
    snapshot: &LayerSnapshot,
    transformed: &TransformedLayers,
    weights: &WeightVector,
) -> Result<CompositeScores, ScoringError> {
    let mut scaled_layers: Vec<(Layer, f64, &TransformedLayer, LayerBounds)> = Vec::new();
    for (layer, values) in transformed {
        let weight = weights
            .get(*layer)
            .ok_or(ScoringError::MissingWeight { layer: *layer })?;
        if let Some(bounds) = LayerBounds::from_layer(values) {
            scaled_layers.push((*layer, weight, values, bounds));
        }
    }

    let scores = snapshot
        .codes()
        .into_iter()
        .map(|code| {
            let mut layers = BTreeMap::new();
            let mut weighted = WeightedMean::default();
            for (layer, weight, values, bounds) in &scaled_layers {
                let Some(value) = values.get(&code) else {
                    continue;
                };
                let scaled = bounds.rescale(value);
                let raw = snapshot
                    .table(*layer)
                    .and_then(|table| table.get(&code))
                    .unwrap_or(value);
                layers.insert(
                    *layer,
                    LayerValue {
                        raw,
                        transformed: value,
                        scaled,
                    },
                );
                weighted.add(*weight, scaled);
            }
            let composite = weighted.finish(&code);
            (code, MunicipalityScore::new(composite, layers))
        })
        .collect();

    Ok(CompositeScores::new(scores, weights.clone()))
}

#[derive(Debug, Default)]
struct WeightedMean {
    total: f64,
    weight: f64,
    unweighted_total: f64,
    present: u32,
}

impl WeightedMean {
    #[expect(clippy::float_arithmetic, reason = "accumulates a weighted sum")]
    fn add(&mut self, weight: f64, value: f64) {
        self.total += weight * value;
        self.weight += weight;
        self.unweighted_total += value;
        self.present = self.present.saturating_add(1);
    }

    #[expect(clippy::float_arithmetic, reason = "divides by the present weight")]
    fn finish(&self, code: &MunicipalityCode) -> Option<f64> {
        if self.weight > 0.0 {
            return Some((self.total / self.weight).clamp(SCORE_MIN, SCORE_MAX));
        }
        if self.present == 0 {
            return None;
        }
        warn!(
            "{code}: the {} present layer(s) carry zero weight; using their unweighted mean",
            self.present
        );
        Some((self.unweighted_total / f64::from(self.present)).clamp(SCORE_MIN, SCORE_MAX))
    }
}
