//! Error types surfaced by the urbanity CLI.

use camino::Utf8PathBuf;
use std::sync::Arc;
use thiserror::Error;
use urbanity_data::{ArtefactWriteError, BoundaryError, LayerReadError, ScoreTableError};
use urbanity_scorer::ScoringError;

/// Errors emitted by the urbanity CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name without the leading dashes.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag that named the path.
        field: &'static str,
        /// Path that was not found.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag that named the path.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag that named the path.
        field: &'static str,
        /// Path being inspected.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The output directory exists but is not a directory.
    #[error("output directory {path:?} is not a directory")]
    OutputDirectoryNotDirectory {
        /// Configured output directory.
        path: Utf8PathBuf,
    },
    /// The output directory could not be inspected.
    #[error("failed to inspect output directory {path:?}: {source}")]
    InspectOutputDirectory {
        /// Configured output directory.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The requested output precision exceeds what `f64` can represent.
    #[error("precision {value} exceeds the maximum of {max} decimal places")]
    PrecisionOutOfRange {
        /// Requested decimal places.
        value: u32,
        /// Largest accepted value.
        max: u32,
    },
    /// Reading a layer table failed.
    #[error(transparent)]
    ReadLayer(#[from] LayerReadError),
    /// Reading or joining the boundaries failed.
    #[error(transparent)]
    Boundaries(#[from] BoundaryError),
    /// Weight estimation or scoring failed.
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    /// Writing the output artefacts failed.
    #[error(transparent)]
    WriteArtefacts(#[from] ArtefactWriteError),
    /// Reading a score table for `summary` failed.
    #[error(transparent)]
    ReadScoreTable(#[from] ScoreTableError),
    /// The score table holds no composite scores to summarise.
    #[error("score table {path:?} has no urbanity scores")]
    EmptyScoreTable {
        /// Score table that was read.
        path: Utf8PathBuf,
    },
    /// Writing the summary report failed.
    #[error("failed to write summary: {0}")]
    WriteSummary(#[source] std::io::Error),
}
