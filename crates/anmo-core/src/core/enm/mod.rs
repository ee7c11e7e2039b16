//! # Elastic Network Model
//!
//! Builds anisotropic elastic network models from atom coordinates and
//! extracts their normal modes.
//!
//! - [`springs`] - Spring functions mapping a contact distance to a stiffness
//! - [`topology`] - The fixed contact network built once from the model
//! - [`hessian`] - Assembly of the 3N×3N stiffness matrix for one frame
//! - [`spectrum`] - Diagonalization into ascending eigenpairs
//! - [`overlap`] - Covariance overlap between two weighted mode sets
//!
//! For a connected network the six lowest modes are rigid-body motions, so the
//! first internal ("dominant") mode sits at index 6.

pub mod hessian;
pub mod overlap;
pub mod spectrum;
pub mod springs;
pub mod topology;

use thiserror::Error;

/// Index of the first non-rigid-body mode.
pub const FIRST_INTERNAL_MODE: usize = 6;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum EnmError {
    #[error("Expected coordinates for {expected} nodes, got {found}")]
    SizeMismatch { expected: usize, found: usize },
}
