//! Similarity strategies comparing frame spectra across a trajectory.
//!
//! A strategy sees every frame once through [`Analyzer::accumulate`] and
//! produces its artifacts once through [`Analyzer::finalize`], which consumes
//! it. Both strategies record the `(timestep, λ6, λ7)` eigenvalue table; they
//! differ in what they keep per frame and how the F×F similarity matrix is
//! computed.

mod coverlap;
mod dot;

pub use coverlap::CovarianceOverlapAnalyzer;
pub use dot::DotProductAnalyzer;

use super::config::{AnalysisMethod, AnmoConfig, ConfigError};
use super::error::EngineError;
use super::progress::ProgressReporter;
use crate::core::enm::FIRST_INTERNAL_MODE;
use crate::core::enm::spectrum::Spectrum;
use crate::core::io::ascii::write_ascii_matrix;
use nalgebra::DMatrix;
use tracing::info;

/// Fewest modes a frame must have: the six rigid-body modes plus λ6 and λ7.
pub const MIN_MODES: usize = FIRST_INTERNAL_MODE + 2;

/// Tag of the eigenvalue table artifact.
pub const EIGENVALUE_TAG: &str = "s";

pub trait Analyzer {
    /// Records one frame.
    fn accumulate(&mut self, timestep: usize, spectrum: &Spectrum) -> Result<(), EngineError>;

    /// Number of frames accumulated so far.
    fn frames(&self) -> usize;

    /// The `(timestep, λ6, λ7)` table, one row per frame.
    fn eigenvalue_table(&self) -> DMatrix<f64>;

    /// Suffix of the similarity artifact.
    fn tag(&self) -> &'static str;

    /// Computes the F×F similarity matrix.
    fn similarity(self, reporter: &ProgressReporter) -> Result<DMatrix<f64>, EngineError>
    where
        Self: Sized;

    /// Computes all results without writing anything.
    fn analyze(self, reporter: &ProgressReporter) -> Result<AnalysisReport, EngineError>
    where
        Self: Sized,
    {
        let eigenvalues = self.eigenvalue_table();
        let tag = self.tag();
        let similarity = self.similarity(reporter)?;
        Ok(AnalysisReport {
            eigenvalues,
            similarity,
            tag,
        })
    }

    /// Writes `<prefix>_s.asc`, then computes and writes the similarity
    /// matrix to `<prefix>_<tag>.asc`.
    fn finalize(
        self,
        prefix: &str,
        header: &str,
        reporter: &ProgressReporter,
    ) -> Result<AnalysisReport, EngineError>
    where
        Self: Sized,
    {
        let eigenvalues = self.eigenvalue_table();
        write_artifact(prefix, EIGENVALUE_TAG, &eigenvalues, header)?;
        let tag = self.tag();
        let similarity = self.similarity(reporter)?;
        write_artifact(prefix, tag, &similarity, header)?;
        Ok(AnalysisReport {
            eigenvalues,
            similarity,
            tag,
        })
    }
}

/// Results of one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    /// F×3: timestep, λ6, λ7.
    pub eigenvalues: DMatrix<f64>,
    /// F×F, symmetric.
    pub similarity: DMatrix<f64>,
    /// `D` for dot products, `O` for covariance overlaps.
    pub tag: &'static str,
}

impl AnalysisReport {
    pub fn frames(&self) -> usize {
        self.eigenvalues.nrows()
    }

    /// Writes both artifacts and returns their paths.
    pub fn write(&self, prefix: &str, header: &str) -> Result<Vec<String>, EngineError> {
        Ok(vec![
            write_artifact(prefix, EIGENVALUE_TAG, &self.eigenvalues, header)?,
            write_artifact(prefix, self.tag, &self.similarity, header)?,
        ])
    }
}

pub fn artifact_path(prefix: &str, tag: &str) -> String {
    format!("{}_{}.asc", prefix, tag)
}

fn write_artifact(
    prefix: &str,
    tag: &str,
    matrix: &DMatrix<f64>,
    header: &str,
) -> Result<String, EngineError> {
    let path = artifact_path(prefix, tag);
    write_ascii_matrix(&path, matrix, header).map_err(|source| EngineError::Output {
        path: path.clone(),
        source,
    })?;
    info!(path = %path, rows = matrix.nrows(), cols = matrix.ncols(), "Wrote matrix");
    Ok(path)
}

/// Rows of `(timestep, λ6, λ7)`.
#[derive(Debug, Clone, Default)]
struct EigenvalueTable {
    rows: Vec<[f64; 3]>,
}

impl EigenvalueTable {
    fn push(&mut self, timestep: usize, spectrum: &Spectrum) -> Result<(), EngineError> {
        if spectrum.len() < MIN_MODES {
            return Err(EngineError::TooFewModes {
                required: MIN_MODES,
                found: spectrum.len(),
            });
        }
        self.rows.push([
            timestep as f64,
            spectrum.eigenvalues[FIRST_INTERNAL_MODE],
            spectrum.eigenvalues[FIRST_INTERNAL_MODE + 1],
        ]);
        Ok(())
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.rows.len(), 3, |r, c| self.rows[r][c])
    }
}

/// The configured similarity strategy.
pub enum SimilarityStrategy {
    DotProduct(DotProductAnalyzer),
    CovarianceOverlap(CovarianceOverlapAnalyzer),
}

impl SimilarityStrategy {
    /// Creates the strategy for a network with `dof` degrees of freedom.
    ///
    /// # Errors
    ///
    /// Fails when more overlap modes are requested than the network has, or
    /// when no worker threads are configured.
    pub fn from_config(config: &AnmoConfig, dof: usize) -> Result<Self, ConfigError> {
        Ok(match config.method {
            AnalysisMethod::DotProduct => SimilarityStrategy::DotProduct(DotProductAnalyzer::new()),
            AnalysisMethod::CovarianceOverlap {
                threads,
                partial_modes,
            } => SimilarityStrategy::CovarianceOverlap(
                CovarianceOverlapAnalyzer::new(dof, threads, partial_modes)?
                    .report_progress(config.report_progress),
            ),
        })
    }
}

impl Analyzer for SimilarityStrategy {
    fn accumulate(&mut self, timestep: usize, spectrum: &Spectrum) -> Result<(), EngineError> {
        match self {
            SimilarityStrategy::DotProduct(a) => a.accumulate(timestep, spectrum),
            SimilarityStrategy::CovarianceOverlap(a) => a.accumulate(timestep, spectrum),
        }
    }

    fn frames(&self) -> usize {
        match self {
            SimilarityStrategy::DotProduct(a) => a.frames(),
            SimilarityStrategy::CovarianceOverlap(a) => a.frames(),
        }
    }

    fn eigenvalue_table(&self) -> DMatrix<f64> {
        match self {
            SimilarityStrategy::DotProduct(a) => a.eigenvalue_table(),
            SimilarityStrategy::CovarianceOverlap(a) => a.eigenvalue_table(),
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            SimilarityStrategy::DotProduct(a) => a.tag(),
            SimilarityStrategy::CovarianceOverlap(a) => a.tag(),
        }
    }

    fn similarity(self, reporter: &ProgressReporter) -> Result<DMatrix<f64>, EngineError> {
        match self {
            SimilarityStrategy::DotProduct(a) => a.similarity(reporter),
            SimilarityStrategy::CovarianceOverlap(a) => a.similarity(reporter),
        }
    }
}
