//! Fixture inputs for exercising the CLI against real files.

use crate::integrate::IntegrateArgs;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// Write `contents` to `path`, creating parent directories.
pub(super) fn write_utf8(path: &Utf8Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directories");
    }
    fs::write(path, contents).expect("write fixture file");
}

/// Four layer tables and a boundary file for four municipalities.
///
/// Chuo (13101) leads on every layer and Naha (47201) trails on every layer,
/// so the composite pins them to 100 and 0 whatever the weights.
pub(super) struct PipelineInputs {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl PipelineInputs {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        let inputs = Self { _dir: dir, root };
        write_utf8(
            &inputs.night_light(),
            r#"{"13101": 61.5, "13102": 32.0, "1101": 11.2, "47201": 1.4}"#,
        );
        write_utf8(
            &inputs.population(),
            r#"{"13101": 201000, "13102": 160000, "01101": 91000, "47201": 3200}"#,
        );
        write_utf8(
            &inputs.poi_density(),
            r#"{"13101": 910.0, "13102": 402.5, "01101": "155", "47201": 6.0}"#,
        );
        write_utf8(
            &inputs.land_price(),
            r#"{"13101": 3050000, "13102": 1480000, "01101": 310000, "47201": 21000}"#,
        );
        write_utf8(&inputs.boundaries(), BOUNDARIES);
        inputs
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn night_light(&self) -> Utf8PathBuf {
        self.root.join("night_light.json")
    }

    pub(super) fn population(&self) -> Utf8PathBuf {
        self.root.join("population.json")
    }

    pub(super) fn poi_density(&self) -> Utf8PathBuf {
        self.root.join("poi_density.json")
    }

    pub(super) fn land_price(&self) -> Utf8PathBuf {
        self.root.join("land_price.json")
    }

    pub(super) fn boundaries(&self) -> Utf8PathBuf {
        self.root.join("municipalities.geojson")
    }

    pub(super) fn output_dir(&self) -> Utf8PathBuf {
        self.root.join("out")
    }

    /// Arguments naming every input and writing into [`Self::output_dir`].
    pub(super) fn args(&self) -> IntegrateArgs {
        IntegrateArgs {
            night_light: Some(self.night_light()),
            population: Some(self.population()),
            poi_density: Some(self.poi_density()),
            land_price: Some(self.land_price()),
            boundaries: Some(self.boundaries()),
            output_dir: Some(self.output_dir()),
            ..IntegrateArgs::default()
        }
    }
}

const BOUNDARIES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"N03_004": "Chuo", "N03_007": "13101"},
     "geometry": {"type": "Point", "coordinates": [139.7724, 35.6701]}},
    {"type": "Feature", "properties": {"N03_004": "Minato", "N03_007": "13102"},
     "geometry": {"type": "Point", "coordinates": [139.7516, 35.6581]}},
    {"type": "Feature", "properties": {"N03_004": "Sapporo", "N03_007": "01101"},
     "geometry": {"type": "Point", "coordinates": [141.3544, 43.0621]}},
    {"type": "Feature", "properties": {"N03_004": "Naha", "N03_007": "47201"},
     "geometry": {"type": "Point", "coordinates": [127.6792, 26.2124]}},
    {"type": "Feature", "properties": {"N03_004": "Offshore"}, "geometry": null}
  ]
}"#;
