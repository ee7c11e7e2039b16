//! Provides input/output for models, trajectories and result matrices.
//!
//! Models are read through the [`traits::ModelFile`] interface (Tinker XYZ and
//! PDB), trajectories through [`traits::Trajectory`] (Tinker ARC on disk or a
//! [`series::FrameSeries`] in memory), and analysis results are written as
//! plain-text matrices by [`ascii`].

pub mod ascii;
pub mod pdb;
pub mod series;
pub mod tinker;
pub mod traits;

use crate::core::models::structure::Structure;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Tinker(#[from] tinker::TinkerError),
    #[error(transparent)]
    Pdb(#[from] pdb::PdbError),
    #[error("Unrecognized model format for '{0}' (expected .pdb or .xyz)")]
    UnknownFormat(String),
}

/// Reads a model, choosing the reader from the file extension.
pub fn read_model<P: AsRef<Path>>(path: P) -> Result<Structure, ModelError> {
    use traits::ModelFile;

    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdb") => Ok(pdb::PdbFile::read_from_path(path)?),
        Some("xyz") | Some("txyz") => Ok(tinker::TinkerXyzFile::read_from_path(path)?),
        _ => Err(ModelError::UnknownFormat(path.display().to_string())),
    }
}
