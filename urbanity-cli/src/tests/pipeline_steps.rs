//! Behavioural coverage for the end-to-end integrate command.

use super::helpers::PipelineInputs;
use super::*;
use crate::integrate::{
    DEFAULT_GEOJSON_FILE, DEFAULT_SCORES_FILE, IntegrateArgs, IntegrateOutcome,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;
use std::cell::RefCell;
use urbanity_data::{read_boundaries, read_score_table};

struct PipelineWorld {
    inputs: PipelineInputs,
    args: RefCell<Option<IntegrateArgs>>,
    outcome: RefCell<Option<Result<IntegrateOutcome, CliError>>>,
}

impl PipelineWorld {
    fn new() -> Self {
        Self {
            inputs: PipelineInputs::new(),
            args: RefCell::new(None),
            outcome: RefCell::new(None),
        }
    }

    fn with_outcome<T>(&self, check: impl FnOnce(&Result<IntegrateOutcome, CliError>) -> T) -> T {
        let borrowed = self.outcome.borrow();
        check(borrowed.as_ref().expect("outcome should exist"))
    }
}

#[fixture]
fn pipeline_world() -> PipelineWorld {
    PipelineWorld::new()
}

#[given("layer tables and boundaries for four municipalities")]
fn complete_inputs(#[from(pipeline_world)] world: &PipelineWorld) {
    world.args.replace(Some(world.inputs.args()));
}

#[given("the land price table is missing")]
fn missing_land_price(#[from(pipeline_world)] world: &PipelineWorld) {
    let mut guard = world.args.borrow_mut();
    let args = guard.as_mut().expect("arguments should be initialised");
    args.land_price = Some(world.inputs.root().join("absent-land-price.json"));
}

#[when("I run the integrate command")]
fn run_pipeline(#[from(pipeline_world)] world: &PipelineWorld) {
    let args = world
        .args
        .borrow()
        .clone()
        .expect("arguments should be initialised");
    world.outcome.replace(Some(run_integrate(args)));
}

#[then("the score table and enriched boundaries are written")]
fn outputs_written(#[from(pipeline_world)] world: &PipelineWorld) {
    let output_dir = world.inputs.output_dir();
    world.with_outcome(|outcome| {
        let outcome = outcome.as_ref().expect("pipeline should succeed");
        assert_eq!(
            outcome.written,
            vec![
                output_dir.join(DEFAULT_SCORES_FILE),
                output_dir.join(DEFAULT_GEOJSON_FILE)
            ]
        );
        assert_eq!(outcome.scored, 4);
        assert_eq!(outcome.no_data, 0);
        assert_eq!((outcome.matched, outcome.unmatched), (4, 1));
        assert!(!outcome.weights.is_fallback(), "expected PCA weights");
    });
}

#[then("the leading municipality scores 100 and the trailing one scores 0")]
fn extremes_pinned(#[from(pipeline_world)] world: &PipelineWorld) {
    let table = read_score_table(&world.inputs.output_dir().join(DEFAULT_SCORES_FILE))
        .expect("score table should parse");
    let urbanity = |raw: &str| {
        let code = urbanity_core::MunicipalityCode::parse(raw).expect("valid code");
        table.get(&code).and_then(|record| record.urbanity)
    };
    assert_eq!(table.len(), 4);
    assert_eq!(urbanity("13101"), Some(100.0));
    assert_eq!(urbanity("47201"), Some(0.0));
    assert!(urbanity("01101").is_some_and(|score| score > 0.0 && score < 100.0));
}

#[then("the unmatched boundary feature keeps null scores")]
fn unmatched_null(#[from(pipeline_world)] world: &PipelineWorld) {
    let collection = read_boundaries(&world.inputs.output_dir().join(DEFAULT_GEOJSON_FILE))
        .expect("enriched boundaries should parse");
    assert_eq!(collection.features.len(), 5);
    let offshore = collection.features.last().expect("offshore feature");
    assert_eq!(offshore.property("urbanity"), Some(&Value::Null));
    assert_eq!(offshore.property("N03_004"), Some(&Value::from("Offshore")));
    let chuo = collection.features.first().expect("first feature");
    assert_eq!(chuo.property("urbanity"), Some(&Value::from(100.0)));
}

#[then("the CLI reports the missing land price table")]
fn reports_missing_land_price(#[from(pipeline_world)] world: &PipelineWorld) {
    world.with_outcome(|outcome| match outcome {
        Err(CliError::MissingSourceFile { field, path }) => {
            assert_eq!(*field, ARG_LAND_PRICE);
            assert_eq!(*path, world.inputs.root().join("absent-land-price.json"));
        }
        Err(other) => panic!("unexpected error {other:?}"),
        Ok(_) => panic!("pipeline should fail"),
    });
}

#[then("no output files are written")]
fn nothing_written(#[from(pipeline_world)] world: &PipelineWorld) {
    assert!(!world.inputs.output_dir().exists());
}

#[scenario(
    path = "tests/features/integrate_pipeline.feature",
    name = "scoring municipalities from complete inputs"
)]
fn score_complete_inputs(#[from(pipeline_world)] world: PipelineWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/integrate_pipeline.feature",
    name = "failing when the land price table is missing"
)]
fn missing_land_price_table(#[from(pipeline_world)] world: PipelineWorld) {
    let _ = world;
}
