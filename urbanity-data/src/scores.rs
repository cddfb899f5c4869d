//! The flat score table written beside the enriched boundaries.

use std::collections::BTreeMap;
use std::io;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use urbanity_core::{CompositeScores, Layer, MunicipalityCode, MunicipalityScore};

use crate::ScoreTableError;

/// Decimal places used for 0–100 scores unless configured otherwise.
pub const DEFAULT_PRECISION: u32 = 1;

/// Largest precision honoured; beyond this `f64` has nothing left to round.
pub const MAX_PRECISION: u32 = 12;

/// Score table keyed by municipality code.
pub type ScoreTable = BTreeMap<MunicipalityCode, ScoreRecord>;

/// Raw layer values as read from the inputs, before any transform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawLayerValues {
    /// Nighttime-light radiance.
    pub night_light: Option<f64>,
    /// Population count.
    pub population: Option<f64>,
    /// Point-of-interest density.
    pub poi_density: Option<f64>,
    /// Land price.
    pub land_price: Option<f64>,
}

/// One municipality's row in the score table.
///
/// Layer fields hold the rescaled 0–100 score of that layer; `None`
/// serialises as JSON `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreRecord {
    /// Composite urbanity score.
    pub urbanity: Option<f64>,
    /// Night-light score on its own.
    pub light_pollution: Option<f64>,
    /// Rescaled night-light score.
    pub night_light: Option<f64>,
    /// Rescaled population score.
    pub population: Option<f64>,
    /// Rescaled POI density score.
    pub poi_density: Option<f64>,
    /// Rescaled land price score.
    pub land_price: Option<f64>,
    /// Unscaled input values.
    pub raw: RawLayerValues,
}

impl ScoreRecord {
    /// Build a record, rounding 0–100 scores to `precision` decimal places.
    #[must_use]
    pub fn from_score(score: &MunicipalityScore, precision: u32) -> Self {
        let scaled = |layer| score.scaled(layer).map(|value| round_score(value, precision));
        Self {
            urbanity: score.composite().map(|value| round_score(value, precision)),
            light_pollution: score
                .light_pollution()
                .map(|value| round_score(value, precision)),
            night_light: scaled(Layer::NightLight),
            population: scaled(Layer::Population),
            poi_density: scaled(Layer::PoiDensity),
            land_price: scaled(Layer::LandPrice),
            raw: RawLayerValues {
                night_light: score.raw(Layer::NightLight),
                population: score.raw(Layer::Population),
                poi_density: score.raw(Layer::PoiDensity),
                land_price: score.raw(Layer::LandPrice),
            },
        }
    }

    /// Rescaled score for `layer`.
    #[must_use]
    pub const fn layer_score(&self, layer: Layer) -> Option<f64> {
        match layer {
            Layer::NightLight => self.night_light,
            Layer::Population => self.population,
            Layer::PoiDensity => self.poi_density,
            Layer::LandPrice => self.land_price,
        }
    }
}

/// Round `value` half away from zero to `precision` decimal places.
///
/// # Examples
/// ```
/// use urbanity_data::round_score;
///
/// assert_eq!(round_score(72.349, 1), 72.3);
/// assert_eq!(round_score(72.35, 0), 72.0);
/// ```
#[expect(
    clippy::float_arithmetic,
    reason = "decimal rounding scales by a power of ten"
)]
#[must_use]
pub fn round_score(value: f64, precision: u32) -> f64 {
    let exponent = i32::try_from(precision.min(MAX_PRECISION)).unwrap_or(0);
    let factor = 10_f64.powi(exponent);
    (value * factor).round() / factor
}

/// Convert a finished run into the flat score table.
#[must_use]
pub fn score_table(scores: &CompositeScores, precision: u32) -> ScoreTable {
    scores
        .iter()
        .map(|(code, score)| (code.clone(), ScoreRecord::from_score(score, precision)))
        .collect()
}

/// Read a score table written by an earlier run.
///
/// # Errors
/// Returns [`ScoreTableError`] when the file is missing, unreadable or not
/// a score table.
pub fn read_score_table(path: &Utf8Path) -> Result<ScoreTable, ScoreTableError> {
    let text = urbanity_fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ScoreTableError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            ScoreTableError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    serde_json::from_str(&text).map_err(|source| ScoreTableError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
