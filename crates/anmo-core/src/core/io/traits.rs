use crate::core::models::structure::Structure;
use nalgebra::Point3;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

use super::tinker::TinkerError;

/// Defines the interface for reading a molecular model from a file format.
pub trait ModelFile {
    /// The error type for I/O and parse failures.
    type Error: Error + From<io::Error>;

    /// Reads a structure from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the reader fails.
    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error>;

    /// Reads a structure from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Structure, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }
}

#[derive(Debug, Error)]
pub enum TrajectoryError {
    #[error("Requested trajectory frame {index} is out of range (trajectory has {frames} frames)")]
    FrameOutOfRange { index: usize, frames: usize },
    #[error("Atom index {index} is out of bounds for a frame of {atoms} atoms")]
    AtomOutOfRange { index: usize, atoms: usize },
    #[error("No frame has been read yet")]
    NoFrame,
    #[error(transparent)]
    Tinker(#[from] TinkerError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A sequence of coordinate frames sharing one atom ordering.
///
/// Reading is cursor based: [`Trajectory::read_frame`] loads the frame at the
/// cursor and advances it, returning `false` once the end is reached, and
/// [`Trajectory::seek_frame`] repositions the cursor so the next read loads
/// the requested frame.
pub trait Trajectory {
    /// Total number of frames.
    fn frame_count(&self) -> usize;

    /// Number of atoms in every frame.
    fn atom_count(&self) -> usize;

    /// Positions the cursor so that the next read loads frame `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TrajectoryError::FrameOutOfRange`] if `index` is not a frame.
    fn seek_frame(&mut self, index: usize) -> Result<(), TrajectoryError>;

    /// Loads the frame at the cursor. Returns `Ok(false)` at the end.
    fn read_frame(&mut self) -> Result<bool, TrajectoryError>;

    /// Coordinates of the most recently read frame.
    fn current_frame(&self) -> Option<&[Point3<f64>]>;

    /// Copies coordinates of the current frame into `structure`, using each
    /// atom's source index.
    ///
    /// # Errors
    ///
    /// Fails if no frame has been read or an atom index lies past the frame.
    fn update_coords(&self, structure: &mut Structure) -> Result<(), TrajectoryError> {
        let frame = self.current_frame().ok_or(TrajectoryError::NoFrame)?;
        for atom in structure.atoms_mut() {
            atom.position = *frame.get(atom.index).ok_or(TrajectoryError::AtomOutOfRange {
                index: atom.index,
                atoms: frame.len(),
            })?;
        }
        Ok(())
    }
}
