//! Boundary polygons and the join that attaches scores to them.
//!
//! Geometry is never touched: the joiner only adds properties to each
//! feature and a metadata member to the collection.

use std::io;

use camino::Utf8Path;
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use log::{info, warn};
use serde_json::json;
use urbanity_core::{CompositeScores, Layer, MunicipalityCode, WeightSource};

use crate::{BoundaryError, ScoreRecord};

/// Property names searched, in order, for the municipality code.
pub const CODE_PROPERTY_CANDIDATES: [&str; 4] = ["N03_007", "code", "id", "JCODE"];

/// Foreign member on the collection holding run metadata.
pub const METADATA_MEMBER: &str = "urbanity_metadata";

/// Feature property carrying the composite score.
pub const URBANITY_PROPERTY: &str = "urbanity";

/// Feature property carrying the night-light score on its own.
pub const LIGHT_POLLUTION_PROPERTY: &str = "light_pollution";

/// Feature property name for a layer's rescaled score.
#[must_use]
pub const fn layer_property(layer: Layer) -> &'static str {
    match layer {
        Layer::NightLight => "night_light_score",
        Layer::Population => "population_score",
        Layer::PoiDensity => "poi_density_score",
        Layer::LandPrice => "land_price_score",
    }
}

/// How scores are attached to boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOptions {
    /// Property holding the municipality code; detected when `None`.
    pub code_property: Option<String>,
    /// Decimal places for the 0–100 scores.
    pub precision: u32,
}

/// Boundaries with scores attached, plus join statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedBoundaries {
    /// The enriched collection, one feature per input feature.
    pub collection: FeatureCollection,
    /// Property the codes were read from.
    pub code_property: String,
    /// Features that received a score record.
    pub matched: usize,
    /// Features emitted with null scores.
    pub unmatched: usize,
}

/// Read a GeoJSON `FeatureCollection` from `path`.
///
/// # Errors
/// Returns [`BoundaryError::MissingSourceFile`] when the file does not
/// exist, and the other variants when it cannot be read or parsed.
pub fn read_boundaries(path: &Utf8Path) -> Result<FeatureCollection, BoundaryError> {
    let text = urbanity_fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            BoundaryError::MissingSourceFile {
                path: path.to_path_buf(),
            }
        } else {
            BoundaryError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let document: GeoJson = text.parse().map_err(|source| BoundaryError::Parse {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;
    match document {
        GeoJson::FeatureCollection(collection) => {
            info!("read {} boundary features from {path}", collection.features.len());
            Ok(collection)
        }
        GeoJson::Feature(_) | GeoJson::Geometry(_) => Err(BoundaryError::NotAFeatureCollection {
            path: path.to_path_buf(),
        }),
    }
}

/// First candidate property present on any feature.
///
/// # Errors
/// Returns [`BoundaryError::CodePropertyNotFound`] when no feature carries
/// any candidate.
pub fn detect_code_property(collection: &FeatureCollection) -> Result<String, BoundaryError> {
    CODE_PROPERTY_CANDIDATES
        .iter()
        .find(|candidate| {
            collection
                .features
                .iter()
                .any(|feature| feature.contains_property(candidate))
        })
        .map(|candidate| (*candidate).to_owned())
        .ok_or_else(|| BoundaryError::CodePropertyNotFound {
            candidates: CODE_PROPERTY_CANDIDATES
                .iter()
                .map(|candidate| (*candidate).to_owned())
                .collect(),
        })
}

/// Attach every score to the matching boundary feature.
///
/// Every input feature is emitted. Features whose code is missing,
/// unparseable or unscored receive null score properties.
///
/// # Errors
/// Returns [`BoundaryError::CodePropertyNotFound`] when no code property is
/// configured and none can be detected.
pub fn join_scores(
    mut collection: FeatureCollection,
    scores: &CompositeScores,
    options: &JoinOptions,
) -> Result<EnrichedBoundaries, BoundaryError> {
    let code_property = match &options.code_property {
        Some(property) => property.clone(),
        None => detect_code_property(&collection)?,
    };

    let mut matched = 0;
    let mut unmatched = 0;
    for (index, feature) in collection.features.iter_mut().enumerate() {
        let code = feature_code(feature, &code_property);
        let record = code.as_ref().and_then(|found| scores.get(found)).map(|score| {
            ScoreRecord::from_score(score, options.precision)
        });
        match (&code, &record) {
            (Some(_), Some(_)) => matched += 1,
            (Some(found), None) => {
                unmatched += 1;
                warn!("boundary feature {found} has no score; emitting null scores");
            }
            (None, _) => {
                unmatched += 1;
                warn!(
                    "boundary feature #{index} has no usable {code_property} property; emitting null scores"
                );
            }
        }
        attach_scores(feature, record.as_ref());
    }

    let metadata = run_metadata(scores, matched, unmatched);
    collection
        .foreign_members
        .get_or_insert_with(JsonObject::new)
        .insert(METADATA_MEMBER.to_owned(), metadata);

    info!("joined scores onto {matched} boundary features ({unmatched} without scores)");
    Ok(EnrichedBoundaries {
        collection,
        code_property,
        matched,
        unmatched,
    })
}

/// Parse the municipality code held in `property`, if any.
#[must_use]
pub fn feature_code(feature: &Feature, property: &str) -> Option<MunicipalityCode> {
    match feature.property(property)? {
        JsonValue::String(raw) => MunicipalityCode::parse(raw).ok(),
        JsonValue::Number(number) => {
            integral_code(number).and_then(|value| MunicipalityCode::from_integer(value).ok())
        }
        _ => None,
    }
}

/// Largest numeric code with at most five digits.
const MAX_NUMERIC_CODE: f64 = 99_999.0;

/// Integer value of a numeric code, accepting floats such as `13101.0`.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "the float is integral and within 0..=99999"
)]
fn integral_code(number: &serde_json::Number) -> Option<u64> {
    if let Some(value) = number.as_u64() {
        return Some(value);
    }
    let value = number.as_f64()?;
    if value.fract() == 0.0 && (0.0..=MAX_NUMERIC_CODE).contains(&value) {
        Some(value as u64)
    } else {
        None
    }
}

fn attach_scores(feature: &mut Feature, record: Option<&ScoreRecord>) {
    let value = |score: Option<f64>| score.map_or(JsonValue::Null, JsonValue::from);
    feature.set_property(URBANITY_PROPERTY, value(record.and_then(|r| r.urbanity)));
    feature.set_property(
        LIGHT_POLLUTION_PROPERTY,
        value(record.and_then(|r| r.light_pollution)),
    );
    for layer in Layer::ALL {
        feature.set_property(
            layer_property(layer),
            value(record.and_then(|r| r.layer_score(layer))),
        );
    }
}

fn run_metadata(scores: &CompositeScores, matched: usize, unmatched: usize) -> JsonValue {
    let weights: JsonObject = scores
        .weights()
        .iter()
        .map(|(layer, weight)| (layer.as_str().to_owned(), JsonValue::from(weight)))
        .collect();
    let fallback_reason = match scores.weights().source() {
        WeightSource::Pca => JsonValue::Null,
        WeightSource::EqualFallback(reason) => JsonValue::from(reason.to_string()),
    };
    let no_data = scores.no_data_count();
    json!({
        "weights": weights,
        "weight_source": scores.weights().source().as_str(),
        "fallback_reason": fallback_reason,
        "scored": scores.len().saturating_sub(no_data),
        "no_data": no_data,
        "matched_features": matched,
        "unmatched_features": unmatched,
    })
}
