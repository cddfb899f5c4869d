//! `integrate` command: read inputs, score, join and write both artefacts.

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use urbanity_core::{Layer, WeightVector};
use urbanity_data::{
    DEFAULT_PRECISION, JoinOptions, LayerSources, MAX_PRECISION, join_scores, read_boundaries,
    read_snapshot, score_table, write_outputs,
};

use crate::{
    ARG_BOUNDARIES, ARG_CODE_PROPERTY, ARG_GEOJSON_FILE, ARG_LAND_PRICE, ARG_NIGHT_LIGHT,
    ARG_OUTPUT_DIR, ARG_POI_DENSITY, ARG_POPULATION, ARG_PRECISION, ARG_SCORES_FILE, CliError,
    ENV_BOUNDARIES, ENV_LAND_PRICE, ENV_NIGHT_LIGHT, ENV_POI_DENSITY, ENV_POPULATION,
    require_existing,
};

/// File name of the score table inside the output directory.
pub(crate) const DEFAULT_SCORES_FILE: &str = "urbanity-scores.json";
/// File name of the enriched boundaries inside the output directory.
pub(crate) const DEFAULT_GEOJSON_FILE: &str = "municipalities-with-scores.geojson";

/// CLI arguments for the `integrate` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Score every municipality from the four layer tables and \
                 join the result onto the municipal boundaries. Paths can \
                 come from CLI flags, configuration files, or environment \
                 variables.",
    about = "Compute urbanity scores and enrich the boundaries"
)]
#[ortho_config(prefix = "URBANITY")]
pub(crate) struct IntegrateArgs {
    /// Path to the nighttime-light radiance table (JSON object by code).
    #[arg(long = ARG_NIGHT_LIGHT, value_name = "path")]
    #[serde(default)]
    pub(crate) night_light: Option<Utf8PathBuf>,
    /// Path to the population table.
    #[arg(long = ARG_POPULATION, value_name = "path")]
    #[serde(default)]
    pub(crate) population: Option<Utf8PathBuf>,
    /// Path to the POI density table.
    #[arg(long = ARG_POI_DENSITY, value_name = "path")]
    #[serde(default)]
    pub(crate) poi_density: Option<Utf8PathBuf>,
    /// Path to the land price table.
    #[arg(long = ARG_LAND_PRICE, value_name = "path")]
    #[serde(default)]
    pub(crate) land_price: Option<Utf8PathBuf>,
    /// Path to the municipal boundaries (GeoJSON FeatureCollection).
    #[arg(long = ARG_BOUNDARIES, value_name = "path")]
    #[serde(default)]
    pub(crate) boundaries: Option<Utf8PathBuf>,
    /// Directory receiving both outputs (defaults to the current directory).
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Override the score table path.
    #[arg(long = ARG_SCORES_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) scores_file: Option<Utf8PathBuf>,
    /// Override the enriched GeoJSON path.
    #[arg(long = ARG_GEOJSON_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) geojson_file: Option<Utf8PathBuf>,
    /// Feature property holding the municipality code (auto-detected if unset).
    #[arg(long = ARG_CODE_PROPERTY, value_name = "name")]
    #[serde(default)]
    pub(crate) code_property: Option<String>,
    /// Decimal places kept for 0–100 scores in the outputs.
    #[arg(long = ARG_PRECISION, value_name = "digits")]
    #[serde(default)]
    pub(crate) precision: Option<u32>,
}

impl IntegrateArgs {
    pub(crate) fn into_config(self) -> Result<IntegrateConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        IntegrateConfig::try_from(merged)
    }
}

/// Resolved `integrate` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IntegrateConfig {
    pub(crate) night_light: Utf8PathBuf,
    pub(crate) population: Utf8PathBuf,
    pub(crate) poi_density: Utf8PathBuf,
    pub(crate) land_price: Utf8PathBuf,
    pub(crate) boundaries: Utf8PathBuf,
    pub(crate) output_dir: Utf8PathBuf,
    pub(crate) scores_file: Utf8PathBuf,
    pub(crate) geojson_file: Utf8PathBuf,
    pub(crate) code_property: Option<String>,
    pub(crate) precision: u32,
}

impl IntegrateConfig {
    /// Check every input before anything is read.
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.night_light, ARG_NIGHT_LIGHT)?;
        require_existing(&self.population, ARG_POPULATION)?;
        require_existing(&self.poi_density, ARG_POI_DENSITY)?;
        require_existing(&self.land_price, ARG_LAND_PRICE)?;
        require_existing(&self.boundaries, ARG_BOUNDARIES)?;
        self.validate_output_dir()
    }

    fn validate_output_dir(&self) -> Result<(), CliError> {
        match urbanity_fs::is_directory(&self.output_dir) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::OutputDirectoryNotDirectory {
                path: self.output_dir.clone(),
            }),
            // Created on write.
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CliError::InspectOutputDirectory {
                path: self.output_dir.clone(),
                source,
            }),
        }
    }

    pub(crate) fn layer_sources(&self) -> LayerSources {
        LayerSources::new()
            .with(Layer::NightLight, self.night_light.clone())
            .with(Layer::Population, self.population.clone())
            .with(Layer::PoiDensity, self.poi_density.clone())
            .with(Layer::LandPrice, self.land_price.clone())
    }

    fn join_options(&self) -> JoinOptions {
        JoinOptions {
            code_property: self.code_property.clone(),
            precision: self.precision,
        }
    }
}

impl TryFrom<IntegrateArgs> for IntegrateConfig {
    type Error = CliError;

    fn try_from(args: IntegrateArgs) -> Result<Self, Self::Error> {
        let night_light = args.night_light.ok_or(CliError::MissingArgument {
            field: ARG_NIGHT_LIGHT,
            env: ENV_NIGHT_LIGHT,
        })?;
        let population = args.population.ok_or(CliError::MissingArgument {
            field: ARG_POPULATION,
            env: ENV_POPULATION,
        })?;
        let poi_density = args.poi_density.ok_or(CliError::MissingArgument {
            field: ARG_POI_DENSITY,
            env: ENV_POI_DENSITY,
        })?;
        let land_price = args.land_price.ok_or(CliError::MissingArgument {
            field: ARG_LAND_PRICE,
            env: ENV_LAND_PRICE,
        })?;
        let boundaries = args.boundaries.ok_or(CliError::MissingArgument {
            field: ARG_BOUNDARIES,
            env: ENV_BOUNDARIES,
        })?;

        let precision = args.precision.unwrap_or(DEFAULT_PRECISION);
        if precision > MAX_PRECISION {
            return Err(CliError::PrecisionOutOfRange {
                value: precision,
                max: MAX_PRECISION,
            });
        }

        let output_dir = args.output_dir.unwrap_or_else(|| Utf8PathBuf::from("."));
        let scores_file = args
            .scores_file
            .unwrap_or_else(|| output_dir.join(DEFAULT_SCORES_FILE));
        let geojson_file = args
            .geojson_file
            .unwrap_or_else(|| output_dir.join(DEFAULT_GEOJSON_FILE));

        Ok(Self {
            night_light,
            population,
            poi_density,
            land_price,
            boundaries,
            output_dir,
            scores_file,
            geojson_file,
            code_property: args.code_property,
            precision,
        })
    }
}

/// What a completed `integrate` run produced.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IntegrateOutcome {
    pub(crate) written: Vec<Utf8PathBuf>,
    pub(crate) scored: usize,
    pub(crate) no_data: usize,
    pub(crate) range: Option<(f64, f64)>,
    pub(crate) weights: WeightVector,
    pub(crate) matched: usize,
    pub(crate) unmatched: usize,
}

impl IntegrateOutcome {
    fn log_summary(&self) {
        info!(
            "scored {} municipalities; {} had no usable data",
            self.scored, self.no_data
        );
        if let Some((low, high)) = self.range {
            info!("composite range {low:.2}..{high:.2}");
        }
        info!("weights: {}", self.weights);
        info!(
            "joined {} boundary features; {} without a score",
            self.matched, self.unmatched
        );
    }
}

pub(crate) fn run_integrate(args: IntegrateArgs) -> Result<IntegrateOutcome, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    execute_integrate(&config)
}

pub(crate) fn execute_integrate(config: &IntegrateConfig) -> Result<IntegrateOutcome, CliError> {
    let snapshot = read_snapshot(&config.layer_sources())?;
    let boundaries = read_boundaries(&config.boundaries)?;
    let scores = urbanity_scorer::integrate(&snapshot)?;
    let enriched = join_scores(boundaries, &scores, &config.join_options())?;
    let table = score_table(&scores, config.precision);
    let written = write_outputs(
        &config.scores_file,
        &table,
        &config.geojson_file,
        &enriched.collection,
    )?;

    let no_data = scores.no_data_count();
    let outcome = IntegrateOutcome {
        written,
        scored: scores.len().saturating_sub(no_data),
        no_data,
        range: scores.composite_range(),
        weights: scores.weights().clone(),
        matched: enriched.matched,
        unmatched: enriched.unmatched,
    };
    outcome.log_summary();
    Ok(outcome)
}
