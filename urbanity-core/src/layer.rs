//! Named proxy layers and their per-municipality raw values.
//!
//! The four layers are a fixed design constant, but downstream stages operate
//! on [`LayerSnapshot`] maps keyed by [`Layer`] so they never assume a
//! positional slot per layer.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::MunicipalityCode;

/// One of the independently sourced urbanity proxies.
///
/// # Examples
/// ```
/// use urbanity_core::Layer;
///
/// assert_eq!(Layer::PoiDensity.as_str(), "poi_density");
/// assert_eq!(Layer::ALL.len(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Mean nighttime-light radiance.
    NightLight,
    /// Resident population count.
    Population,
    /// Weighted point-of-interest density.
    PoiDensity,
    /// Average published land price.
    LandPrice,
}

impl Layer {
    /// Every layer in canonical order.
    pub const ALL: [Self; 4] = [
        Self::NightLight,
        Self::Population,
        Self::PoiDensity,
        Self::LandPrice,
    ];

    /// Return the layer's `snake_case` identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NightLight => "night_light",
            Self::Population => "population",
            Self::PoiDensity => "poi_density",
            Self::LandPrice => "land_price",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|layer| layer.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown layer '{s}'"))
    }
}

/// Reasons a raw layer value is rejected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidLayerValue {
    /// The value was NaN or infinite.
    #[error("{layer} value for {code} is not finite ({value})")]
    NonFinite {
        /// Layer the value belongs to.
        layer: Layer,
        /// Municipality the value belongs to.
        code: MunicipalityCode,
        /// Offending value.
        value: f64,
    },
    /// The value was below zero.
    #[error("{layer} value for {code} is negative ({value})")]
    Negative {
        /// Layer the value belongs to.
        layer: Layer,
        /// Municipality the value belongs to.
        code: MunicipalityCode,
        /// Offending value.
        value: f64,
    },
    /// A value for the municipality was already recorded.
    #[error("{layer} already holds a value for {code}")]
    Duplicate {
        /// Layer the value belongs to.
        layer: Layer,
        /// Municipality the value belongs to.
        code: MunicipalityCode,
    },
}

/// Raw scalar values of a single layer keyed by municipality.
///
/// Every stored value is finite and non-negative and each code appears at
/// most once.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerTable {
    layer: Layer,
    values: BTreeMap<MunicipalityCode, f64>,
}

impl LayerTable {
    /// Create an empty table for `layer`.
    #[must_use]
    pub const fn new(layer: Layer) -> Self {
        Self {
            layer,
            values: BTreeMap::new(),
        }
    }

    /// Build a table from `(code, value)` pairs, failing on the first
    /// rejected value.
    ///
    /// # Errors
    /// Returns [`InvalidLayerValue`] when a value is negative, non-finite, or
    /// duplicates an existing code.
    pub fn from_values<I>(layer: Layer, values: I) -> Result<Self, InvalidLayerValue>
    where
        I: IntoIterator<Item = (MunicipalityCode, f64)>,
    {
        let mut table = Self::new(layer);
        for (code, value) in values {
            table.insert(code, value)?;
        }
        Ok(table)
    }

    /// Record a raw value for `code`.
    ///
    /// # Errors
    /// Returns [`InvalidLayerValue`] and leaves the table unchanged when the
    /// value is out of domain or the code is already present.
    pub fn insert(&mut self, code: MunicipalityCode, value: f64) -> Result<(), InvalidLayerValue> {
        let layer = self.layer;
        if !value.is_finite() {
            return Err(InvalidLayerValue::NonFinite { layer, code, value });
        }
        if value < 0.0 {
            return Err(InvalidLayerValue::Negative { layer, code, value });
        }
        if self.values.contains_key(&code) {
            return Err(InvalidLayerValue::Duplicate { layer, code });
        }
        self.values.insert(code, value);
        Ok(())
    }

    /// Layer this table describes.
    #[must_use]
    pub const fn layer(&self) -> Layer {
        self.layer
    }

    /// Return the raw value for `code`, if present.
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

    /// Report whether the table holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Immutable set of layer tables handed from the readers to the scorer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerSnapshot {
    tables: BTreeMap<Layer, LayerTable>,
}

impl LayerSnapshot {
    /// Create an empty snapshot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
        }
    }

    /// Add a table while consuming `self`, replacing any table for the same layer.
    #[must_use]
    pub fn with_table(mut self, table: LayerTable) -> Self {
        self.tables.insert(table.layer(), table);
        self
    }

    /// Return the table for `layer`, if loaded.
    #[must_use]
    pub fn table(&self, layer: Layer) -> Option<&LayerTable> {
        self.tables.get(&layer)
    }

    /// Iterate over loaded tables in layer order.
    pub fn tables(&self) -> impl Iterator<Item = &LayerTable> {
        self.tables.values()
    }

    /// Layers present in the snapshot.
    pub fn layers(&self) -> impl Iterator<Item = Layer> + '_ {
        self.tables.keys().copied()
    }

    /// Union of municipality codes across every table.
    #[must_use]
    pub fn codes(&self) -> BTreeSet<MunicipalityCode> {
        self.tables
            .values()
            .flat_map(|table| table.iter().map(|(code, _)| code.clone()))
            .collect()
    }
}
