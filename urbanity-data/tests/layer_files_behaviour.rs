//! Behavioural coverage for layer readers and the artefact writer.

use std::cell::RefCell;
use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;
use urbanity_core::{
    CompositeScores, FallbackReason, Layer, LayerTable, LayerValue, MunicipalityCode,
    MunicipalityScore, WeightVector,
};
use urbanity_data::{
    JoinOptions, LayerReadError, ScoreTable, join_scores, read_boundaries, read_layer_table,
    score_table, write_outputs,
};

type ReadResult = RefCell<Option<Result<LayerTable, LayerReadError>>>;

/// Scratch directory for each scenario.
pub struct Workspace {
    dir: TempDir,
    root: Utf8PathBuf,
}

/// Temporary directory holding inputs and outputs.
#[fixture]
pub fn workspace() -> Workspace {
    let dir = TempDir::new().unwrap_or_else(|err| panic!("create temporary directory: {err}"));
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .unwrap_or_else(|path| panic!("temporary directory is not UTF-8: {}", path.display()));
    Workspace { dir, root }
}

/// Input file under test.
#[fixture]
pub fn input_path() -> RefCell<Option<Utf8PathBuf>> {
    RefCell::new(None)
}

/// Outcome of reading a layer.
#[fixture]
pub fn read_result() -> ReadResult {
    RefCell::new(None)
}

fn code(raw: &str) -> MunicipalityCode {
    MunicipalityCode::parse(raw).unwrap_or_else(|err| panic!("valid code {raw}: {err}"))
}

fn write(workspace: &Workspace, name: &str, contents: &str) -> Utf8PathBuf {
    let path = workspace.root.join(name);
    std::fs::write(&path, contents).unwrap_or_else(|err| panic!("write {path}: {err}"));
    path
}

fn current_path(input_path: &RefCell<Option<Utf8PathBuf>>) -> Utf8PathBuf {
    input_path
        .borrow()
        .clone()
        .unwrap_or_else(|| panic!("input path must be initialised"))
}

#[given("a population file with padded, invalid and null entries")]
fn population_file(workspace: &Workspace, input_path: &RefCell<Option<Utf8PathBuf>>) {
    let path = write(
        workspace,
        "population.json",
        r#"{"1101": 1973395, "13101": "141183", "13102": -5, "13103": null, "tokyo": 9}"#,
    );
    input_path.replace(Some(path));
}

#[given("a land price path that does not exist")]
fn missing_land_price(workspace: &Workspace, input_path: &RefCell<Option<Utf8PathBuf>>) {
    input_path.replace(Some(workspace.root.join("land_price.json")));
}

#[when("I read the population layer")]
fn read_population(input_path: &RefCell<Option<Utf8PathBuf>>, read_result: &ReadResult) {
    let path = current_path(input_path);
    read_result.replace(Some(read_layer_table(Layer::Population, &path)));
}

#[when("I read the land price layer")]
fn read_land_price(input_path: &RefCell<Option<Utf8PathBuf>>, read_result: &ReadResult) {
    let path = current_path(input_path);
    read_result.replace(Some(read_layer_table(Layer::LandPrice, &path)));
}

#[then("the layer holds the two usable municipalities")]
fn two_usable(read_result: &ReadResult) {
    let binding = read_result.borrow();
    match binding.as_ref() {
        Some(Ok(table)) => {
            assert_eq!(table.len(), 2);
            assert_eq!(table.get(&code("01101")), Some(1_973_395.0));
            assert_eq!(table.get(&code("13101")), Some(141_183.0));
        }
        Some(Err(err)) => panic!("reading should succeed, got {err}"),
        None => panic!("read result must be recorded"),
    }
}

#[then("reading fails naming the missing file")]
fn missing_file_error(read_result: &ReadResult, input_path: &RefCell<Option<Utf8PathBuf>>) {
    let binding = read_result.borrow();
    match binding.as_ref() {
        Some(Err(LayerReadError::MissingSourceFile { layer, path })) => {
            assert_eq!(*layer, Layer::LandPrice);
            assert_eq!(*path, current_path(input_path));
        }
        Some(Err(other)) => panic!("unexpected error: {other}"),
        Some(Ok(_)) => panic!("reading a missing file must fail"),
        None => panic!("read result must be recorded"),
    }
}

#[given("boundaries for three municipalities and scores for one")]
fn three_boundaries(workspace: &Workspace, input_path: &RefCell<Option<Utf8PathBuf>>) {
    let path = write(
        workspace,
        "boundaries.geojson",
        r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"code": "13101"}, "geometry": {"type": "Point", "coordinates": [139.7, 35.6]}},
            {"type": "Feature", "properties": {"code": "13102"}, "geometry": {"type": "Point", "coordinates": [139.8, 35.7]}},
            {"type": "Feature", "properties": {"name": "unknown"}, "geometry": null}
        ]}"#,
    );
    input_path.replace(Some(path));
}

fn single_score() -> CompositeScores {
    let layers = BTreeMap::from([(
        Layer::Population,
        LayerValue {
            raw: 141_183.0,
            transformed: 141_183.0_f64.ln_1p(),
            scaled: 64.0,
        },
    )]);
    CompositeScores::new(
        BTreeMap::from([(code("13101"), MunicipalityScore::new(Some(64.0), layers))]),
        WeightVector::equal([Layer::Population], FallbackReason::TooFewMunicipalities { found: 1 }),
    )
}

#[when("I join and write the outputs")]
fn join_and_write(workspace: &Workspace, input_path: &RefCell<Option<Utf8PathBuf>>) {
    let boundaries = read_boundaries(&current_path(input_path))
        .unwrap_or_else(|err| panic!("read boundaries: {err}"));
    let scores = single_score();
    let options = JoinOptions {
        code_property: None,
        precision: 1,
    };
    let enriched = join_scores(boundaries, &scores, &options)
        .unwrap_or_else(|err| panic!("join scores: {err}"));
    write_outputs(
        &workspace.root.join("out/urbanity-scores.json"),
        &score_table(&scores, 1),
        &workspace.root.join("out/municipalities-with-scores.geojson"),
        &enriched.collection,
    )
    .unwrap_or_else(|err| panic!("write outputs: {err}"));
}

#[then("both output files exist")]
fn outputs_exist(workspace: &Workspace) {
    assert!(workspace.root.join("out/urbanity-scores.json").is_file());
    assert!(workspace.root.join("out/municipalities-with-scores.geojson").is_file());
}

#[then("the enriched file keeps all three features")]
fn three_features(workspace: &Workspace) {
    let enriched = read_boundaries(&workspace.root.join("out/municipalities-with-scores.geojson"))
        .unwrap_or_else(|err| panic!("re-read enriched boundaries: {err}"));
    assert_eq!(enriched.features.len(), 3);
    let urbanity: Vec<Option<f64>> = enriched
        .features
        .iter()
        .map(|feature| feature.property("urbanity").and_then(serde_json::Value::as_f64))
        .collect();
    assert_eq!(urbanity, vec![Some(64.0), None, None]);
}

#[then("the score table lists the scored municipality")]
fn table_lists_score(workspace: &Workspace) {
    let text = std::fs::read_to_string(workspace.root.join("out/urbanity-scores.json"))
        .unwrap_or_else(|err| panic!("read score table: {err}"));
    let table: ScoreTable =
        serde_json::from_str(&text).unwrap_or_else(|err| panic!("parse score table: {err}"));
    let record = table
        .get(&code("13101"))
        .unwrap_or_else(|| panic!("13101 should be listed"));
    assert_eq!(record.urbanity, Some(64.0));
    assert_eq!(record.raw.population, Some(141_183.0));
    assert_eq!(table.len(), 1);
}

#[scenario(path = "tests/features/layer_files.feature", index = 0)]
fn unusable_rows_dropped(
    workspace: Workspace,
    input_path: RefCell<Option<Utf8PathBuf>>,
    read_result: ReadResult,
) {
    let _ = (workspace.dir, input_path, read_result);
}

#[scenario(path = "tests/features/layer_files.feature", index = 1)]
fn missing_layer_fatal(
    workspace: Workspace,
    input_path: RefCell<Option<Utf8PathBuf>>,
    read_result: ReadResult,
) {
    let _ = (workspace.dir, input_path, read_result);
}

#[scenario(path = "tests/features/layer_files.feature", index = 2)]
fn boundaries_published(workspace: Workspace, input_path: RefCell<Option<Utf8PathBuf>>) {
    let _ = (workspace.dir, input_path);
}
