//! Text artifacts written by the pipeline actions.
//!
//! Every artifact is a plain tab-separated (or `key value`) text file named
//! `<prefix>.<extension>`, see [`Artifact::extension`].
//!
//! | Artifact | Content |
//! |---|---|
//! | predictions | `id  target  score` per sample, input order |
//! | profile | `sample_index  position  margin` per profiled position |
//! | has | `id  position  margin  window` per high-affinity site |
//! | cv_results | per-fold metrics, their mean and the objective |
//! | params | `key value` lines, loadable by `train` |
//! | motifs | position-frequency tables |
//!
//! Models are JSON, see [`Model::save`](crate::learner::Model::save).
//!
//! ## Examples
//!
//! ```rust
//! use graphprot_core::config::ParameterSet;
//! use graphprot_core::output::{read_params_format, write_params_format};
//! use graphprot_core::types::Task;
//! use std::io::Cursor;
//!
//! let mut buffer = Vec::new();
//! write_params_format(&mut buffer, Task::Classification, &ParameterSet::default())?;
//!
//! let (task, params) = read_params_format(Cursor::new(buffer))?;
//! assert_eq!(task, Some(Task::Classification));
//! assert_eq!(params, ParameterSet::default());
//! # Ok::<(), graphprot_core::types::GraphProtError>(())
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::types::GraphProtError;

mod formats {
    pub mod cv_results;
    pub mod has;
    pub mod motif;
    pub mod params;
    pub mod predictions;
    pub mod profile;
}

pub use formats::{
    cv_results::write_cv_results_format,
    has::write_has_format,
    motif::write_motif_format,
    params::{read_params_format, write_params_format},
    predictions::write_predictions_format,
    profile::write_profile_format,
};

/// Kinds of files the actions produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Model,
    Params,
    Predictions,
    Profile,
    HighAffinitySites,
    CvResults,
    SequenceMotif,
    StructureMotif,
    PairedUnpairedMotif,
}

impl Artifact {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Params => "params",
            Self::Predictions => "predictions",
            Self::Profile => "profile",
            Self::HighAffinitySites => "has",
            Self::CvResults => "cv_results",
            Self::SequenceMotif => "sequence_motif",
            Self::StructureMotif => "structure_motif",
            Self::PairedUnpairedMotif => "structure_motif_pairedunpaired",
        }
    }

    /// `<prefix>.<extension>`
    #[must_use]
    pub fn path_for(self, prefix: &str) -> PathBuf {
        PathBuf::from(format!("{prefix}.{}", self.extension()))
    }
}

/// Create `path` and hand a buffered writer to `write`, flushing at the end.
pub fn write_file<P, F>(path: P, write: F) -> Result<(), GraphProtError>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<File>) -> Result<(), GraphProtError>,
{
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write(&mut writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParameterSet;
    use crate::types::Task;

    #[test]
    fn test_artifact_paths() {
        assert_eq!(
            Artifact::PairedUnpairedMotif.path_for("out/run"),
            PathBuf::from("out/run.structure_motif_pairedunpaired")
        );
        assert_eq!(Artifact::HighAffinitySites.extension(), "has");
    }

    #[test]
    fn test_write_file_creates_and_flushes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.params");
        write_file(&path, |w| {
            write_params_format(w, Task::Regression, &ParameterSet::default())
        })
        .unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("mode regression\nR 1\n"));
    }
}
