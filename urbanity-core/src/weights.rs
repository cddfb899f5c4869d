//! Per-layer weights used by the composite scorer.

use std::collections::BTreeMap;
use std::fmt;

use crate::Layer;

/// Why the estimator fell back to equal weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// Fewer than two municipalities carry a value in every layer.
    TooFewMunicipalities {
        /// Municipalities left after the inner join.
        found: usize,
    },
    /// A layer has zero variance across the joined municipalities.
    ConstantLayer {
        /// The constant layer.
        layer: Layer,
    },
    /// The leading eigenvector had no usable magnitude.
    DegenerateLoadings,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewMunicipalities { found } => write!(
                f,
                "only {found} municipalities have every layer; at least 2 are required"
            ),
            Self::ConstantLayer { layer } => write!(f, "layer {layer} has zero variance"),
            Self::DegenerateLoadings => f.write_str("first principal component has no magnitude"),
        }
    }
}

/// Origin of a [`WeightVector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeightSource {
    /// Derived from the first principal component's loadings.
    Pca,
    /// Equal weights used because PCA was ill-defined.
    EqualFallback(FallbackReason),
}

impl WeightSource {
    /// Stable identifier written to output metadata.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pca => "pca",
            Self::EqualFallback(_) => "equal_fallback",
        }
    }
}

/// Non-negative layer weights summing to one.
///
/// # Examples
/// ```
/// use urbanity_core::{FallbackReason, Layer, WeightVector};
///
/// let weights = WeightVector::equal(Layer::ALL, FallbackReason::DegenerateLoadings);
/// assert_eq!(weights.get(Layer::LandPrice), Some(0.25));
/// assert!(weights.is_fallback());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector {
    weights: BTreeMap<Layer, f64>,
    source: WeightSource,
}

impl WeightVector {
    /// Equal weights over `layers`, tagged with the fallback reason.
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "equal weights divide one by the layer count"
    )]
    #[must_use]
    pub fn equal<I>(layers: I, reason: FallbackReason) -> Self
    where
        I: IntoIterator<Item = Layer>,
    {
        let selected: Vec<Layer> = layers.into_iter().collect();
        let share = if selected.is_empty() {
            0.0
        } else {
            1.0 / selected.len() as f64
        };
        Self {
            weights: selected.into_iter().map(|layer| (layer, share)).collect(),
            source: WeightSource::EqualFallback(reason),
        }
    }

    /// Normalise principal-component loadings into weights.
    ///
    /// Loadings are reduced to their magnitudes (PCA signs are arbitrary)
    /// and rescaled to sum to one. Returns `None` when the magnitudes sum to
    /// zero or are not finite.
    #[expect(
        clippy::float_arithmetic,
        reason = "normalising loadings divides by their total magnitude"
    )]
    #[must_use]
    pub fn from_loadings(loadings: &BTreeMap<Layer, f64>) -> Option<Self> {
        let total: f64 = loadings.values().map(|loading| loading.abs()).sum();
        if !total.is_finite() || total <= 0.0 {
            return None;
        }
        let weights = loadings
            .iter()
            .map(|(layer, loading)| (*layer, loading.abs() / total))
            .collect();
        Some(Self {
            weights,
            source: WeightSource::Pca,
        })
    }

    /// Weight assigned to `layer`, if any.
    #[must_use]
    pub fn get(&self, layer: Layer) -> Option<f64> {
        self.weights.get(&layer).copied()
    }

    /// Iterate over `(layer, weight)` pairs in layer order.
    pub fn iter(&self) -> impl Iterator<Item = (Layer, f64)> + '_ {
        self.weights.iter().map(|(layer, weight)| (*layer, *weight))
    }

    /// Sum of all weights; one within floating-point tolerance.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// How the weights were obtained.
    #[must_use]
    pub const fn source(&self) -> &WeightSource {
        &self.source
    }

    /// Report whether the equal-weight fallback was used.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self.source, WeightSource::EqualFallback(_))
    }
}

impl fmt::Display for WeightVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (layer, weight) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{layer}={weight:.4}")?;
        }
        write!(f, " ({})", self.source.as_str())
    }
}
