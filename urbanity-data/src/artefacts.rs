//! All-or-nothing output of the score table and enriched boundaries.
//!
//! Each artefact is written to a temporary file beside its destination and
//! synced. Only when every artefact has been staged are they renamed into
//! place, so a failed run never leaves a new partial file behind. Files being
//! replaced are set aside until the whole commit succeeds; a failed rename
//! puts every earlier destination back the way it was.

use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use log::{info, warn};
use serde::Serialize;
use tempfile::{NamedTempFile, TempPath};

use crate::ArtefactWriteError;

/// An artefact written to a temporary file, waiting to be committed.
#[derive(Debug)]
pub struct StagedArtefact {
    destination: Utf8PathBuf,
    file: NamedTempFile,
}

impl StagedArtefact {
    /// Where the artefact will land on commit.
    #[must_use]
    pub fn destination(&self) -> &Utf8Path {
        &self.destination
    }
}

/// Collects artefacts and commits them together.
#[derive(Debug, Default)]
pub struct ArtefactWriter {
    staged: Vec<StagedArtefact>,
}

impl ArtefactWriter {
    /// A writer with nothing staged.
    #[must_use]
    pub const fn new() -> Self {
        Self { staged: Vec::new() }
    }

    /// Serialise `value` as JSON into a temporary file next to `destination`.
    ///
    /// # Errors
    /// Returns [`ArtefactWriteError`] when the directory cannot be created,
    /// serialisation fails, or the temporary file cannot be written.
    pub fn stage_json<T>(
        &mut self,
        destination: &Utf8Path,
        value: &T,
        pretty: bool,
    ) -> Result<(), ArtefactWriteError>
    where
        T: Serialize + ?Sized,
    {
        let bytes = if pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        }
        .map_err(|source| ArtefactWriteError::Serialise {
            path: destination.to_path_buf(),
            source,
        })?;
        self.stage_bytes(destination, &bytes)
    }

    /// Write `bytes` into a temporary file next to `destination`.
    ///
    /// # Errors
    /// Returns [`ArtefactWriteError`] when the directory cannot be created or
    /// the temporary file cannot be written and synced.
    pub fn stage_bytes(
        &mut self,
        destination: &Utf8Path,
        bytes: &[u8],
    ) -> Result<(), ArtefactWriteError> {
        let parent = urbanity_fs::parent_dir(destination);
        urbanity_fs::ensure_dir(&parent).map_err(|source| ArtefactWriteError::CreateDir {
            path: parent.clone(),
            source,
        })?;
        let stage_error = |source| ArtefactWriteError::Stage {
            path: destination.to_path_buf(),
            source,
        };
        let mut file = NamedTempFile::new_in(parent.as_std_path()).map_err(stage_error)?;
        file.write_all(bytes).map_err(stage_error)?;
        file.flush().map_err(stage_error)?;
        file.as_file().sync_all().map_err(stage_error)?;
        self.staged.push(StagedArtefact {
            destination: destination.to_path_buf(),
            file,
        });
        Ok(())
    }

    /// Artefacts staged so far.
    #[must_use]
    pub fn staged(&self) -> &[StagedArtefact] {
        &self.staged
    }

    /// Move every staged artefact into place, returning the destinations.
    ///
    /// # Errors
    /// Returns [`ArtefactWriteError::Commit`] when a rename fails. Artefacts
    /// already moved are rolled back to their previous contents, and those
    /// not yet renamed are discarded with their temporary files.
    pub fn commit(self) -> Result<Vec<Utf8PathBuf>, ArtefactWriteError> {
        let mut committed: Vec<Committed> = Vec::with_capacity(self.staged.len());
        for artefact in self.staged {
            match commit_one(artefact) {
                Ok(done) => committed.push(done),
                Err(err) => {
                    for done in committed.into_iter().rev() {
                        restore(&done.destination, done.previous);
                    }
                    return Err(err);
                }
            }
        }
        Ok(committed
            .into_iter()
            .map(|done| {
                info!("wrote {}", done.destination);
                done.destination
            })
            .collect())
    }
}

/// A destination now holding its new artefact. The file it replaced, if any,
/// is removed when `previous` drops.
struct Committed {
    destination: Utf8PathBuf,
    previous: Option<TempPath>,
}

fn commit_one(artefact: StagedArtefact) -> Result<Committed, ArtefactWriteError> {
    let StagedArtefact { destination, file } = artefact;
    let commit_error = |source| ArtefactWriteError::Commit {
        path: destination.clone(),
        source,
    };
    let previous = if destination.is_file() {
        Some(set_aside(&destination).map_err(commit_error)?)
    } else {
        None
    };
    if let Err(err) = file.persist(destination.as_std_path()) {
        let error = commit_error(err.error);
        if let Some(backup) = previous {
            restore(&destination, Some(backup));
        }
        return Err(error);
    }
    Ok(Committed {
        destination,
        previous,
    })
}

/// Rename the current `destination` to a temporary path beside it.
fn set_aside(destination: &Utf8Path) -> io::Result<TempPath> {
    let parent = urbanity_fs::parent_dir(destination);
    let backup = tempfile::Builder::new()
        .prefix(".urbanity-previous")
        .tempfile_in(parent.as_std_path())?
        .into_temp_path();
    std::fs::rename(destination, &backup)?;
    Ok(backup)
}

/// Return `destination` to its state before the commit.
fn restore(destination: &Utf8Path, previous: Option<TempPath>) {
    let outcome = match previous {
        Some(backup) => backup
            .persist(destination.as_std_path())
            .map_err(|err| err.error),
        None => std::fs::remove_file(destination),
    };
    if let Err(err) = outcome {
        warn!("failed to roll back {destination}: {err}");
    }
}
