//! Variance-driven layer weights from the first principal component.

use std::collections::{BTreeMap, BTreeSet};

use log::{info, warn};
use urbanity_core::{FallbackReason, Layer, MunicipalityCode, TransformedLayers, WeightVector};

use crate::pca::{covariance, leading_eigenpair, observation_matrix, trace};

/// Minimum number of fully observed municipalities for PCA.
pub const MIN_JOINED_MUNICIPALITIES: usize = 2;

/// Relative variance below which a layer counts as constant.
const CONSTANT_VARIANCE_TOLERANCE: f64 = 1e-12;

/// Estimate one weight per layer from the covariance of the transformed data.
///
/// Only municipalities present in every layer take part. When fewer than
/// [`MIN_JOINED_MUNICIPALITIES`] remain, a layer is constant, or the leading
/// eigenvector is unusable, equal weights are returned and the reason is
/// recorded on the vector.
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
/// use urbanity_core::{Layer, MunicipalityCode, TransformedLayer};
/// use urbanity_scorer::estimate_weights;
///
/// let code = MunicipalityCode::parse("13101").expect("valid code");
/// let layers = BTreeMap::from([(
///     Layer::Population,
///     TransformedLayer::from_raw(Layer::Population, [(code, 10.0)]).expect("transform"),
/// )]);
/// let weights = estimate_weights(&layers);
/// assert!(weights.is_fallback());
/// ```
#[must_use]
pub fn estimate_weights(layers: &TransformedLayers) -> WeightVector {
    let joined = joined_codes(layers);
    let found = joined.len();
    if found < MIN_JOINED_MUNICIPALITIES {
        return fallback(layers, FallbackReason::TooFewMunicipalities { found });
    }

    let columns: Vec<(Layer, Vec<f64>)> = layers
        .iter()
        .map(|(layer, values)| {
            let column = joined.iter().filter_map(|code| values.get(code)).collect();
            (*layer, column)
        })
        .collect();

    if let Some(layer) = columns
        .iter()
        .find(|(_, column)| is_constant(column))
        .map(|(layer, _)| *layer)
    {
        return fallback(layers, FallbackReason::ConstantLayer { layer });
    }

    let matrix_columns: Vec<Vec<f64>> = columns.iter().map(|(_, column)| column.clone()).collect();
    let Some((total_variance, eigenpair)) = observation_matrix(&matrix_columns)
        .and_then(|data| covariance(&data))
        .and_then(|matrix| leading_eigenpair(&matrix).map(|pair| (trace(&matrix), pair)))
    else {
        return fallback(layers, FallbackReason::DegenerateLoadings);
    };

    let loadings: BTreeMap<Layer, f64> = columns
        .iter()
        .map(|(layer, _)| *layer)
        .zip(eigenpair.vector.iter().copied())
        .collect();
    let Some(weights) = WeightVector::from_loadings(&loadings) else {
        return fallback(layers, FallbackReason::DegenerateLoadings);
    };

    info!(
        "estimated PCA weights over {found} municipalities: {weights}; first component explains {:.1}% of variance",
        explained_share(eigenpair.value, total_variance)
    );
    weights
}

/// Codes present in every layer, in code order.
#[must_use]
pub fn joined_codes(layers: &TransformedLayers) -> BTreeSet<MunicipalityCode> {
    let mut tables = layers.values();
    let Some(first) = tables.next() else {
        return BTreeSet::new();
    };
    let mut joined: BTreeSet<MunicipalityCode> = first.iter().map(|(code, _)| code.clone()).collect();
    for table in tables {
        joined.retain(|code| table.get(code).is_some());
    }
    joined
}

fn fallback(layers: &TransformedLayers, reason: FallbackReason) -> WeightVector {
    warn!("falling back to equal layer weights: {reason}");
    WeightVector::equal(layers.keys().copied(), reason)
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "variance is a floating-point average"
)]
fn is_constant(column: &[f64]) -> bool {
    if column.is_empty() {
        return true;
    }
    let count = column.len() as f64;
    let mean = column.iter().sum::<f64>() / count;
    let variance = column
        .iter()
        .map(|value| (value - mean) * (value - mean))
        .sum::<f64>()
        / count;
    variance <= CONSTANT_VARIANCE_TOLERANCE * (mean * mean).max(1.0)
}

#[expect(
    clippy::float_arithmetic,
    reason = "ratio of the leading eigenvalue to the trace"
)]
fn explained_share(leading: f64, total: f64) -> f64 {
    if total > 0.0 {
        leading / total * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use urbanity_core::TransformedLayer;

    fn code(raw: &str) -> MunicipalityCode {
        MunicipalityCode::parse(raw).expect("valid code")
    }

    fn layer(layer: Layer, values: &[(&str, f64)]) -> (Layer, TransformedLayer) {
        let transformed = TransformedLayer::from_raw(
            layer,
            values.iter().map(|(raw, value)| (code(raw), *value)),
        )
        .expect("transform");
        (layer, transformed)
    }

    #[rstest]
    fn joined_codes_intersect_every_layer() {
        let layers = TransformedLayers::from([
            layer(Layer::NightLight, &[("01101", 1.0), ("01102", 2.0), ("01103", 3.0)]),
            layer(Layer::Population, &[("01102", 2.0), ("01103", 3.0)]),
        ]);
        let joined: Vec<String> = joined_codes(&layers)
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(joined, vec!["01102", "01103"]);
    }

    #[rstest]
    fn zero_variance_is_detected_on_large_values() {
        assert!(is_constant(&[12.5, 12.5, 12.5]));
        assert!(!is_constant(&[12.5, 12.6, 12.5]));
    }

    #[rstest]
    fn single_joined_municipality_falls_back() {
        let layers = TransformedLayers::from([
            layer(Layer::NightLight, &[("01101", 1.0), ("01102", 2.0)]),
            layer(Layer::Population, &[("01101", 2.0)]),
        ]);
        let weights = estimate_weights(&layers);
        assert_eq!(
            weights.source(),
            &urbanity_core::WeightSource::EqualFallback(FallbackReason::TooFewMunicipalities {
                found: 1
            })
        );
        assert_eq!(weights.get(Layer::NightLight), Some(0.5));
    }

    #[rstest]
    fn explained_share_handles_zero_trace() {
        assert_eq!(explained_share(1.0, 0.0), 0.0);
        assert_eq!(explained_share(1.0, 2.0), 50.0);
    }
}
