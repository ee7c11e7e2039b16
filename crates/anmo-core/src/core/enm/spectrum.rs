use super::EnmError;
use super::hessian::build_hessian;
use super::springs::SpringSet;
use super::topology::Topology;
use nalgebra::{DMatrix, DVector, Point3, SymmetricEigen};
use std::cmp::Ordering;
use tracing::trace;

/// Normal modes of one frame: eigenvalues in ascending order and the
/// matching unit eigenvectors as columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub eigenvalues: DVector<f64>,
    pub eigenvectors: DMatrix<f64>,
}

impl Spectrum {
    /// Diagonalizes a symmetric Hessian and sorts the eigenpairs ascending.
    pub fn from_hessian(hessian: DMatrix<f64>) -> Self {
        let eigen = SymmetricEigen::new(hessian);

        let mut order: Vec<usize> = (0..eigen.eigenvalues.len()).collect();
        order.sort_by(|&a, &b| {
            eigen.eigenvalues[a]
                .partial_cmp(&eigen.eigenvalues[b])
                .unwrap_or(Ordering::Equal)
        });

        let eigenvalues = DVector::from_iterator(order.len(), order.iter().map(|&k| eigen.eigenvalues[k]));
        let eigenvectors = eigen.eigenvectors.select_columns(order.iter());

        Self {
            eigenvalues,
            eigenvectors,
        }
    }

    /// Number of modes (3N).
    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }
}

/// Builds and diagonalizes the Hessian of a fixed topology for successive
/// frames.
#[derive(Debug, Clone)]
pub struct SpectrumBuilder {
    topology: Topology,
    springs: SpringSet,
}

impl SpectrumBuilder {
    pub fn new(topology: Topology, springs: SpringSet) -> Self {
        Self { topology, springs }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn springs(&self) -> &SpringSet {
        &self.springs
    }

    /// Computes the spectrum of the network at `coords`.
    ///
    /// # Errors
    ///
    /// Returns [`EnmError::SizeMismatch`] if `coords` does not hold one
    /// position per node.
    pub fn solve(&self, coords: &[Point3<f64>]) -> Result<Spectrum, EnmError> {
        solve(&self.topology, &self.springs, coords)
    }
}

/// One-shot form of [`SpectrumBuilder::solve`].
pub fn solve(
    topology: &Topology,
    springs: &SpringSet,
    coords: &[Point3<f64>],
) -> Result<Spectrum, EnmError> {
    let hessian = build_hessian(topology, springs, coords)?;
    trace!(dof = hessian.nrows(), "Diagonalizing Hessian");
    Ok(Spectrum::from_hessian(hessian))
}
