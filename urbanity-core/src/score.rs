//! Composite urbanity scores and the per-layer values behind them.

use std::collections::BTreeMap;

use crate::{Layer, MunicipalityCode, WeightVector};

/// Lower bound of every rescaled score.
pub const SCORE_MIN: f64 = 0.0;
/// Upper bound of every rescaled score.
pub const SCORE_MAX: f64 = 100.0;

/// A single layer's contribution for one municipality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerValue {
    /// Value as supplied by the upstream reader.
    pub raw: f64,
    /// Value after `ln(x + 1)`.
    pub transformed: f64,
    /// Transformed value min-max rescaled to `0.0..=100.0`.
    pub scaled: f64,
}

/// Final score for a municipality plus every layer value that fed it.
#[derive(Debug, Clone, PartialEq)]
pub struct MunicipalityScore {
    composite: Option<f64>,
    layers: BTreeMap<Layer, LayerValue>,
}

impl MunicipalityScore {
    /// Bundle a composite with its layer values.
    #[must_use]
    pub const fn new(composite: Option<f64>, layers: BTreeMap<Layer, LayerValue>) -> Self {
        Self { composite, layers }
    }

    /// Composite urbanity score in `0.0..=100.0`, or `None` when no weighted
    /// layer was available.
    #[must_use]
    pub const fn composite(&self) -> Option<f64> {
        self.composite
    }

    /// Value for `layer`, if the municipality has one.
    #[must_use]
    pub fn layer(&self, layer: Layer) -> Option<&LayerValue> {
        self.layers.get(&layer)
    }

    /// Rescaled score for `layer`, if present.
    #[must_use]
    pub fn scaled(&self, layer: Layer) -> Option<f64> {
        self.layer(layer).map(|value| value.scaled)
    }

    /// Raw value for `layer`, if present.
    #[must_use]
    pub fn raw(&self, layer: Layer) -> Option<f64> {
        self.layer(layer).map(|value| value.raw)
    }

    /// Light-pollution score: the rescaled night-light layer on its own.
    #[must_use]
    pub fn light_pollution(&self) -> Option<f64> {
        self.scaled(Layer::NightLight)
    }

    /// Number of layers present for the municipality.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

/// Scores for every municipality in a run, with the weights used.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeScores {
    scores: BTreeMap<MunicipalityCode, MunicipalityScore>,
    weights: WeightVector,
}

impl CompositeScores {
    /// Bundle scores with the weight vector that produced them.
    #[must_use]
    pub const fn new(
        scores: BTreeMap<MunicipalityCode, MunicipalityScore>,
        weights: WeightVector,
    ) -> Self {
        Self { scores, weights }
    }

    /// Score record for `code`, if the municipality appeared in any layer.
    #[must_use]
    pub fn get(&self, code: &MunicipalityCode) -> Option<&MunicipalityScore> {
        self.scores.get(code)
    }

    /// Iterate over records in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&MunicipalityCode, &MunicipalityScore)> {
        self.scores.iter()
    }

    /// Weights used for the composite.
    #[must_use]
    pub const fn weights(&self) -> &WeightVector {
        &self.weights
    }

    /// Number of municipality records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Report whether no municipality was scored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Number of records whose composite is missing.
    #[must_use]
    pub fn no_data_count(&self) -> usize {
        self.scores
            .values()
            .filter(|score| score.composite().is_none())
            .count()
    }

    /// Smallest and largest composite, ignoring missing scores.
    #[must_use]
    pub fn composite_range(&self) -> Option<(f64, f64)> {
        self.scores
            .values()
            .filter_map(MunicipalityScore::composite)
            .fold(None, |range, value| match range {
                None => Some((value, value)),
                Some((low, high)) => Some((low.min(value), high.max(value))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FallbackReason;
    use rstest::rstest;

    fn code(raw: &str) -> MunicipalityCode {
        MunicipalityCode::parse(raw).expect("valid code")
    }

    fn value(scaled: f64) -> LayerValue {
        LayerValue {
            raw: 1.0,
            transformed: 1.0,
            scaled,
        }
    }

    #[rstest]
    fn light_pollution_mirrors_the_night_light_layer() {
        let score = MunicipalityScore::new(
            Some(40.0),
            BTreeMap::from([(Layer::NightLight, value(72.5)), (Layer::Population, value(10.0))]),
        );
        assert_eq!(score.light_pollution(), Some(72.5));
        assert_eq!(score.layer_count(), 2);
    }

    #[rstest]
    fn light_pollution_is_missing_without_night_light() {
        let score = MunicipalityScore::new(
            Some(10.0),
            BTreeMap::from([(Layer::Population, value(10.0))]),
        );
        assert_eq!(score.light_pollution(), None);
    }

    #[rstest]
    fn range_and_no_data_ignore_missing_composites() {
        let scores = CompositeScores::new(
            BTreeMap::from([
                (code("01101"), MunicipalityScore::new(Some(12.0), BTreeMap::new())),
                (code("01102"), MunicipalityScore::new(None, BTreeMap::new())),
                (code("01103"), MunicipalityScore::new(Some(88.0), BTreeMap::new())),
            ]),
            WeightVector::equal(Layer::ALL, FallbackReason::DegenerateLoadings),
        );
        assert_eq!(scores.composite_range(), Some((12.0, 88.0)));
        assert_eq!(scores.no_data_count(), 1);
        assert_eq!(scores.len(), 3);
    }
}
