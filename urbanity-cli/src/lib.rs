//! Command-line interface for the urbanity score pipeline.
//!
//! `integrate` reads the four layer tables and the municipal boundaries,
//! scores every municipality, and writes the score table and the enriched
//! GeoJSON. `summary` describes the distribution of an existing score table.
#![forbid(unsafe_code)]

use camino::Utf8Path;
use clap::{Parser, Subcommand};

mod error;
mod integrate;
mod summary;

pub use error::CliError;

use integrate::{IntegrateArgs, run_integrate};
use summary::{SummaryArgs, run_summary};

const ARG_NIGHT_LIGHT: &str = "night-light";
const ARG_POPULATION: &str = "population";
const ARG_POI_DENSITY: &str = "poi-density";
const ARG_LAND_PRICE: &str = "land-price";
const ARG_BOUNDARIES: &str = "boundaries";
const ARG_OUTPUT_DIR: &str = "output-dir";
const ARG_SCORES_FILE: &str = "scores-file";
const ARG_GEOJSON_FILE: &str = "geojson-file";
const ARG_CODE_PROPERTY: &str = "code-property";
const ARG_PRECISION: &str = "precision";
const ARG_SUMMARY_SCORES: &str = "scores";
const ARG_SUMMARY_TOP: &str = "top";
const ENV_NIGHT_LIGHT: &str = "URBANITY_CMDS_INTEGRATE_NIGHT_LIGHT";
const ENV_POPULATION: &str = "URBANITY_CMDS_INTEGRATE_POPULATION";
const ENV_POI_DENSITY: &str = "URBANITY_CMDS_INTEGRATE_POI_DENSITY";
const ENV_LAND_PRICE: &str = "URBANITY_CMDS_INTEGRATE_LAND_PRICE";
const ENV_BOUNDARIES: &str = "URBANITY_CMDS_INTEGRATE_BOUNDARIES";
const ENV_SUMMARY_SCORES: &str = "URBANITY_CMDS_SUMMARY_SCORES_PATH";

/// Run the urbanity CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when argument parsing, configuration, input
/// validation, scoring or output fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Integrate(args) => {
            run_integrate(args)?;
        }
        Command::Summary(args) => run_summary(args)?,
    }
    Ok(())
}

/// Require `path` to name an existing regular file.
fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match urbanity_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "urbanity",
    about = "Fuse nighttime light, population, POI density and land price into an urbanity score",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score every municipality and join the scores onto its boundary.
    Integrate(IntegrateArgs),
    /// Describe the score distribution of an existing score table.
    Summary(SummaryArgs),
}

#[cfg(test)]
mod tests;
