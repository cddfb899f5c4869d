//! Error types for reading pipeline inputs and writing artefacts.

use camino::Utf8PathBuf;
use thiserror::Error;
use urbanity_core::Layer;

/// Errors raised while loading a layer table.
#[derive(Debug, Error)]
pub enum LayerReadError {
    /// The configured layer file does not exist.
    #[error("{layer} source file not found at {path}")]
    MissingSourceFile {
        /// Layer being read.
        layer: Layer,
        /// Configured path.
        path: Utf8PathBuf,
    },
    /// Reading the file failed.
    #[error("failed to read {layer} source file at {path}")]
    Read {
        /// Layer being read.
        layer: Layer,
        /// Configured path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid JSON.
    #[error("failed to parse {layer} source file at {path}")]
    Parse {
        /// Layer being read.
        layer: Layer,
        /// Configured path.
        path: Utf8PathBuf,
        /// Source error from `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// The JSON document is not an object keyed by municipality code.
    #[error("{layer} source file at {path} must contain a JSON object keyed by municipality code")]
    NotAnObject {
        /// Layer being read.
        layer: Layer,
        /// Configured path.
        path: Utf8PathBuf,
    },
}

/// Errors raised while reading boundaries or joining scores onto them.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// The boundary file does not exist.
    #[error("boundary file not found at {path}")]
    MissingSourceFile {
        /// Configured path.
        path: Utf8PathBuf,
    },
    /// Reading the file failed.
    #[error("failed to read boundary file at {path}")]
    Read {
        /// Configured path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid GeoJSON.
    #[error("failed to parse GeoJSON boundaries at {path}")]
    Parse {
        /// Configured path.
        path: Utf8PathBuf,
        /// Source error from `geojson`.
        #[source]
        source: Box<geojson::Error>,
    },
    /// The GeoJSON document is not a `FeatureCollection`.
    #[error("boundary file at {path} must contain a FeatureCollection")]
    NotAFeatureCollection {
        /// Configured path.
        path: Utf8PathBuf,
    },
    /// No feature carries any of the candidate code properties.
    #[error("no feature carries a municipality code property (tried {})", .candidates.join(", "))]
    CodePropertyNotFound {
        /// Property names that were searched for.
        candidates: Vec<String>,
    },
}

/// Errors raised while reading a previously written score table.
#[derive(Debug, Error)]
pub enum ScoreTableError {
    /// The score table does not exist.
    #[error("score table not found at {path}")]
    Missing {
        /// Requested path.
        path: Utf8PathBuf,
    },
    /// Reading the file failed.
    #[error("failed to read score table at {path}")]
    Read {
        /// Requested path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// The file does not match the score table layout.
    #[error("failed to parse score table at {path}")]
    Parse {
        /// Requested path.
        path: Utf8PathBuf,
        /// Source error from `serde_json`.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while staging or committing output artefacts.
#[derive(Debug, Error)]
pub enum ArtefactWriteError {
    /// The destination directory could not be created.
    #[error("failed to create output directory {path}")]
    CreateDir {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Serialising an artefact failed.
    #[error("failed to serialise artefact for {path}")]
    Serialise {
        /// Destination path.
        path: Utf8PathBuf,
        /// Source error from `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// Writing the temporary file failed.
    #[error("failed to stage artefact for {path}")]
    Stage {
        /// Destination path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Renaming the staged file into place failed.
    #[error("failed to move staged artefact into {path}")]
    Commit {
        /// Destination path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
}
