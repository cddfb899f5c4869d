//! File formats and I/O for the urbanity pipeline.
//!
//! Responsibilities:
//! - Read the per-layer JSON tables into a [`LayerSnapshot`](urbanity_core::LayerSnapshot).
//! - Read GeoJSON boundaries and join composite scores onto them.
//! - Shape the flat score table and write both artefacts atomically.
//!
//! Boundaries:
//! - No statistics live here; weighting and scoring belong to
//!   `urbanity-scorer`.
//! - Recoverable data problems are logged and skipped, never raised.

#![forbid(unsafe_code)]

mod artefacts;
mod boundaries;
mod error;
mod layers;
mod scores;

pub use artefacts::{ArtefactWriter, StagedArtefact};
pub use boundaries::{
    CODE_PROPERTY_CANDIDATES, EnrichedBoundaries, JoinOptions, LIGHT_POLLUTION_PROPERTY,
    METADATA_MEMBER, URBANITY_PROPERTY, detect_code_property, feature_code, join_scores,
    layer_property, read_boundaries,
};
pub use error::{ArtefactWriteError, BoundaryError, LayerReadError, ScoreTableError};
pub use layers::{LayerSources, read_layer_table, read_snapshot};
pub use scores::{
    DEFAULT_PRECISION, MAX_PRECISION, RawLayerValues, ScoreRecord, ScoreTable, read_score_table,
    round_score, score_table,
};

use camino::{Utf8Path, Utf8PathBuf};
use geojson::FeatureCollection;

/// Write the score table and enriched boundaries together.
///
/// Neither file appears unless both were staged successfully, and a failed
/// rename rolls the other destination back to its previous contents.
///
/// # Errors
/// Returns [`ArtefactWriteError`] from staging or committing.
pub fn write_outputs(
    scores_path: &Utf8Path,
    table: &ScoreTable,
    geojson_path: &Utf8Path,
    collection: &FeatureCollection,
) -> Result<Vec<Utf8PathBuf>, ArtefactWriteError> {
    let mut writer = ArtefactWriter::new();
    writer.stage_json(scores_path, table, true)?;
    writer.stage_json(geojson_path, collection, false)?;
    writer.commit()
}
