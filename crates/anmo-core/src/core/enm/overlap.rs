use super::spectrum::Spectrum;
use nalgebra::{DMatrix, DVector};

/// A window of non-trivial modes weighted by their compliances (`1/λ`).
#[derive(Debug, Clone, PartialEq)]
pub struct ModeSet {
    pub compliances: DVector<f64>,
    pub modes: DMatrix<f64>,
}

impl ModeSet {
    /// Takes modes `first..first + count` of `spectrum`.
    ///
    /// The caller guarantees the window lies inside the spectrum.
    pub fn from_spectrum(spectrum: &Spectrum, first: usize, count: usize) -> Self {
        let compliances = spectrum.eigenvalues.rows(first, count).map(|l| 1.0 / l);
        let modes = spectrum.eigenvectors.columns(first, count).into_owned();
        Self { compliances, modes }
    }

    pub fn len(&self) -> usize {
        self.compliances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compliances.is_empty()
    }
}

/// Covariance overlap between two compliance-weighted mode sets.
///
/// ```text
/// S = Σλa + Σλb
/// C = Σi Σj sqrt(λa_i λb_j) (a_i · b_j)²
/// O = 1 - sqrt(|S - 2C| / S)
/// ```
///
/// Returns 0 when either set is empty or `S` is zero. Identical inputs give 1
/// up to rounding.
pub fn covariance_overlap(a: &ModeSet, b: &ModeSet) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let total = a.compliances.sum() + b.compliances.sum();
    if total == 0.0 {
        return 0.0;
    }

    let dots = a.modes.transpose() * &b.modes;
    let mut cross = 0.0;
    for j in 0..b.len() {
        for i in 0..a.len() {
            let d = dots[(i, j)];
            cross += (a.compliances[i] * b.compliances[j]).sqrt() * d * d;
        }
    }

    1.0 - ((total - 2.0 * cross).abs() / total).sqrt()
}
