//! The `ln(x + 1)` transform applied to every raw layer before fusion.
//!
//! The offset keeps the transform defined at zero and preserves ordering
//! within a layer. Layers are not comparable with each other until the
//! composite scorer rescales them.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{Layer, LayerSnapshot, LayerTable, MunicipalityCode};

/// Transformed layers keyed by layer name.
pub type TransformedLayers = BTreeMap<Layer, TransformedLayer>;

/// Errors raised when a raw value falls outside the transform's domain.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    /// The raw value was negative or not finite.
    #[error("cannot log-transform {layer} value {value} for {code}: expected a finite value >= 0")]
    OutOfDomain {
        /// Layer being transformed.
        layer: Layer,
        /// Municipality whose value was rejected.
        code: MunicipalityCode,
        /// Offending raw value.
        value: f64,
    },
}

/// A layer after the `ln(x + 1)` transform, keyed by municipality.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedLayer {
    layer: Layer,
    values: BTreeMap<MunicipalityCode, f64>,
}

impl TransformedLayer {
    /// Transform raw `(code, value)` pairs.
    ///
    /// # Errors
    /// Returns [`TransformError::OutOfDomain`] for the first negative or
    /// non-finite input instead of producing `NaN`.
    pub fn from_raw<I>(layer: Layer, raw: I) -> Result<Self, TransformError>
    where
        I: IntoIterator<Item = (MunicipalityCode, f64)>,
    {
        let values = raw
            .into_iter()
            .map(|(code, value)| {
                let transformed = log1p(layer, &code, value)?;
                Ok((code, transformed))
            })
            .collect::<Result<_, TransformError>>()?;
        Ok(Self { layer, values })
    }

    /// Layer this data came from.
    #[must_use]
    pub const fn layer(&self) -> Layer {
        self.layer
    }

    /// Transformed value for `code`, if the layer has one.
    #[must_use]
    pub fn get(&self, code: &MunicipalityCode) -> Option<f64> {
        self.values.get(code).copied()
    }

    /// Iterate over `(code, value)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&MunicipalityCode, f64)> {
        self.values.iter().map(|(code, value)| (code, *value))
    }

    /// Number of municipalities with a value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Report whether the layer holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Apply `ln(x + 1)` to every value of a raw table.
///
/// # Errors
/// Propagates [`TransformError`] when a value is out of domain.
///
/// # Examples
/// ```
/// use urbanity_core::{Layer, LayerTable, MunicipalityCode, log_transform};
///
/// let code = MunicipalityCode::parse("13101").expect("valid code");
/// let table = LayerTable::from_values(Layer::Population, [(code.clone(), 0.0)])
///     .expect("valid table");
/// let transformed = log_transform(&table).expect("transform");
/// assert_eq!(transformed.get(&code), Some(0.0));
/// ```
pub fn log_transform(table: &LayerTable) -> Result<TransformedLayer, TransformError> {
    TransformedLayer::from_raw(
        table.layer(),
        table.iter().map(|(code, value)| (code.clone(), value)),
    )
}

/// Transform every table in a snapshot.
///
/// # Errors
/// Propagates the first [`TransformError`] encountered.
pub fn transform_snapshot(snapshot: &LayerSnapshot) -> Result<TransformedLayers, TransformError> {
    snapshot
        .tables()
        .map(|table| Ok((table.layer(), log_transform(table)?)))
        .collect()
}

fn log1p(layer: Layer, code: &MunicipalityCode, value: f64) -> Result<f64, TransformError> {
    if !value.is_finite() || value < 0.0 {
        return Err(TransformError::OutOfDomain {
            layer,
            code: code.clone(),
            value,
        });
    }
    Ok(value.ln_1p())
}
