//! Readers for per-municipality layer tables.
//!
//! A layer file is a JSON object mapping municipality codes to values.
//! Values may be numbers or numeric strings; anything unusable is dropped
//! with a warning so one bad row never aborts a run. Keys repeated in the
//! file text are seen individually, so a repeated code is counted and
//! reported like any other duplicate.

use std::collections::BTreeMap;
use std::fmt;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use log::{info, warn};
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value;
use serde_json::error::Category;
use urbanity_core::{Layer, LayerSnapshot, LayerTable, MunicipalityCode};

use crate::LayerReadError;

/// Where each layer's table lives on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerSources {
    paths: BTreeMap<Layer, Utf8PathBuf>,
}

impl LayerSources {
    /// An empty set of sources.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            paths: BTreeMap::new(),
        }
    }

    /// Register the file for `layer`, replacing any earlier entry.
    #[must_use]
    pub fn with(mut self, layer: Layer, path: impl Into<Utf8PathBuf>) -> Self {
        self.paths.insert(layer, path.into());
        self
    }

    /// Path configured for `layer`.
    #[must_use]
    pub fn path(&self, layer: Layer) -> Option<&Utf8Path> {
        self.paths.get(&layer).map(Utf8PathBuf::as_path)
    }

    /// Iterate over `(layer, path)` pairs in layer order.
    pub fn iter(&self) -> impl Iterator<Item = (Layer, &Utf8Path)> {
        self.paths.iter().map(|(layer, path)| (*layer, path.as_path()))
    }
}

/// Load every configured layer into a snapshot.
///
/// # Errors
/// Returns the first [`LayerReadError`]; a missing file is fatal.
pub fn read_snapshot(sources: &LayerSources) -> Result<LayerSnapshot, LayerReadError> {
    sources
        .iter()
        .try_fold(LayerSnapshot::new(), |snapshot, (layer, path)| {
            Ok(snapshot.with_table(read_layer_table(layer, path)?))
        })
}

/// Load one layer table from `path`.
///
/// # Errors
/// Returns [`LayerReadError::MissingSourceFile`] when the file does not
/// exist, and the other variants when it cannot be read or is not a JSON
/// object.
pub fn read_layer_table(layer: Layer, path: &Utf8Path) -> Result<LayerTable, LayerReadError> {
    let text = urbanity_fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            LayerReadError::MissingSourceFile {
                layer,
                path: path.to_path_buf(),
            }
        } else {
            LayerReadError::Read {
                layer,
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let entries: RawEntries = serde_json::from_str(&text).map_err(|source| {
        if source.classify() == Category::Data {
            LayerReadError::NotAnObject {
                layer,
                path: path.to_path_buf(),
            }
        } else {
            LayerReadError::Parse {
                layer,
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let total = entries.0.len();
    let table = table_from_entries(layer, entries.iter());
    let dropped = total.saturating_sub(table.len());
    info!(
        "read {} {layer} values from {path} ({dropped} dropped)",
        table.len()
    );
    Ok(table)
}

/// Every member of a JSON object in document order, repeated keys included.
#[derive(Debug)]
struct RawEntries(Vec<(String, Value)>);

impl RawEntries {
    fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter().map(|(key, value)| (key, value))
    }
}

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RawEntriesVisitor)
    }
}

struct RawEntriesVisitor;

impl<'de> Visitor<'de> for RawEntriesVisitor {
    type Value = RawEntries;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a JSON object keyed by municipality code")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry::<String, serde_json::Value>()? {
            entries.push(entry);
        }
        Ok(RawEntries(entries))
    }
}

/// Build a table from raw JSON entries, dropping anything unusable.
fn table_from_entries<'a, I>(layer: Layer, entries: I) -> LayerTable
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    let mut table = LayerTable::new(layer);
    for (key, raw) in entries {
        let code = match MunicipalityCode::parse(key) {
            Ok(code) => code,
            Err(err) => {
                warn!("dropping {layer} entry with key {key:?}: {err}");
                continue;
            }
        };
        let value = match parse_value(raw) {
            ParsedValue::Number(value) => value,
            ParsedValue::Null => {
                warn!("{layer} value for {code} is null; treating it as missing");
                continue;
            }
            ParsedValue::Invalid => {
                warn!("dropping {layer} value {raw} for {code}: not a number");
                continue;
            }
        };
        if let Err(err) = table.insert(code, value) {
            warn!("dropping {layer} value: {err}");
        }
    }
    table
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ParsedValue {
    Number(f64),
    Null,
    Invalid,
}

fn parse_value(raw: &Value) -> ParsedValue {
    match raw {
        Value::Null => ParsedValue::Null,
        Value::Number(number) => number.as_f64().map_or(ParsedValue::Invalid, ParsedValue::Number),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map_or(ParsedValue::Invalid, ParsedValue::Number),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => ParsedValue::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn entries(document: &Value) -> &serde_json::Map<String, Value> {
        document.as_object().expect("object fixture")
    }

    fn code(raw: &str) -> MunicipalityCode {
        MunicipalityCode::parse(raw).expect("valid code")
    }

    #[rstest]
    #[case(json!(12.5), ParsedValue::Number(12.5))]
    #[case(json!(" 7 "), ParsedValue::Number(7.0))]
    #[case(json!(null), ParsedValue::Null)]
    #[case(json!("n/a"), ParsedValue::Invalid)]
    #[case(json!(true), ParsedValue::Invalid)]
    #[case(json!([1]), ParsedValue::Invalid)]
    fn parses_numbers_and_numeric_strings(#[case] raw: Value, #[case] expected: ParsedValue) {
        assert_eq!(parse_value(&raw), expected);
    }

    #[rstest]
    fn drops_invalid_rows_and_keeps_the_rest() {
        let document = json!({
            "1101": 10.0,
            "01102": "25",
            "01103": -4.0,
            "01104": null,
            "abc": 3.0,
            "01105": "NaN",
        });
        let table = table_from_entries(Layer::Population, entries(&document));

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&code("01101")), Some(10.0));
        assert_eq!(table.get(&code("01102")), Some(25.0));
        assert_eq!(table.get(&code("01103")), None);
    }

    #[rstest]
    fn duplicate_codes_keep_the_first_key() {
        let document = json!({ "01101": 1.0, "1101": 2.0 });
        let table = table_from_entries(Layer::LandPrice, entries(&document));

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&code("01101")), Some(1.0));
    }

    #[rstest]
    fn repeated_keys_in_the_file_text_are_all_seen() {
        let raw: RawEntries =
            serde_json::from_str(r#"{ "01101": 1.0, "01102": 3.0, "01101": 2.0 }"#)
                .expect("object");
        assert_eq!(raw.0.len(), 3);

        let table = table_from_entries(Layer::NightLight, raw.iter());
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&code("01101")), Some(1.0));
    }

    #[rstest]
    #[case("[1, 2]")]
    #[case("42")]
    #[case("\"01101\"")]
    fn documents_other_than_objects_are_rejected(#[case] text: &str) {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("layer.json")).expect("utf8 path");
        std::fs::write(&path, text).expect("write layer");

        let err = read_layer_table(Layer::PoiDensity, &path).expect_err("not an object");
        assert!(matches!(err, LayerReadError::NotAnObject { layer: Layer::PoiDensity, .. }));
    }

    #[rstest]
    fn malformed_json_is_a_parse_error() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("layer.json")).expect("utf8 path");
        std::fs::write(&path, r#"{ "01101": 1.0, "#).expect("write layer");

        let err = read_layer_table(Layer::PoiDensity, &path).expect_err("truncated");
        assert!(matches!(err, LayerReadError::Parse { .. }));
    }

    #[rstest]
    fn sources_iterate_in_layer_order() {
        let sources = LayerSources::new()
            .with(Layer::LandPrice, "land.json")
            .with(Layer::NightLight, "light.json");
        let layers: Vec<Layer> = sources.iter().map(|(layer, _)| layer).collect();
        assert_eq!(layers, vec![Layer::NightLight, Layer::LandPrice]);
        assert_eq!(
            sources.path(Layer::LandPrice),
            Some(Utf8Path::new("land.json"))
        );
    }
}
