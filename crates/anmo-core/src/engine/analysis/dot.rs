use super::{Analyzer, EigenvalueTable};
use crate::core::enm::FIRST_INTERNAL_MODE;
use crate::core::enm::spectrum::Spectrum;
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use nalgebra::{DMatrix, DVector};
use tracing::{debug, instrument};

/// Compares frames by `|v_a · v_b|` of their dominant eigenvectors.
#[derive(Debug, Clone, Default)]
pub struct DotProductAnalyzer {
    table: EigenvalueTable,
    dominant: Vec<DVector<f64>>,
}

impl DotProductAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Analyzer for DotProductAnalyzer {
    fn accumulate(&mut self, timestep: usize, spectrum: &Spectrum) -> Result<(), EngineError> {
        self.table.push(timestep, spectrum)?;
        self.dominant
            .push(spectrum.eigenvectors.column(FIRST_INTERNAL_MODE).into_owned());
        Ok(())
    }

    fn frames(&self) -> usize {
        self.table.len()
    }

    fn eigenvalue_table(&self) -> DMatrix<f64> {
        self.table.to_matrix()
    }

    fn tag(&self) -> &'static str {
        "D"
    }

    #[instrument(skip_all, name = "dot_product_matrix", fields(frames = self.dominant.len()))]
    fn similarity(self, _reporter: &ProgressReporter) -> Result<DMatrix<f64>, EngineError> {
        if self.dominant.is_empty() {
            return Ok(DMatrix::zeros(0, 0));
        }
        let modes = DMatrix::from_columns(&self.dominant);
        debug!(rows = modes.nrows(), cols = modes.ncols(), "Multiplying mode matrix");
        Ok((modes.transpose() * &modes).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum_with_dominant(dominant: [f64; 8]) -> Spectrum {
        let mut eigenvectors = DMatrix::<f64>::identity(8, 8);
        eigenvectors.set_column(FIRST_INTERNAL_MODE, &DVector::from_column_slice(&dominant));
        Spectrum {
            eigenvalues: DVector::from_fn(8, |k, _| k as f64),
            eigenvectors,
        }
    }

    #[test]
    fn similarity_is_absolute_gram_matrix_of_dominant_modes() {
        let s = 0.5f64.sqrt();
        let mut a = DotProductAnalyzer::new();
        a.accumulate(0, &spectrum_with_dominant([1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]))
            .unwrap();
        a.accumulate(1, &spectrum_with_dominant([-s, s, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]))
            .unwrap();
        a.accumulate(2, &spectrum_with_dominant([0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 0.0]))
            .unwrap();
        assert_eq!(a.frames(), 3);

        let d = a.similarity(&ProgressReporter::new()).unwrap();
        assert_eq!(d.shape(), (3, 3));
        assert!((d[(0, 1)] - s).abs() < 1e-12);
        assert_eq!(d[(0, 2)], 0.0);
        for i in 0..3 {
            assert!((d[(i, i)] - 1.0).abs() < 1e-12);
        }
        assert_eq!(d, d.transpose());
        assert!(d.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn table_rows_carry_timesteps_in_accumulation_order() {
        let mut a = DotProductAnalyzer::new();
        let dominant = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        a.accumulate(5, &spectrum_with_dominant(dominant)).unwrap();
        a.accumulate(6, &spectrum_with_dominant(dominant)).unwrap();
        let table = a.eigenvalue_table();
        assert_eq!(table, DMatrix::from_row_slice(2, 3, &[5.0, 6.0, 7.0, 6.0, 6.0, 7.0]));
    }

    #[test]
    fn no_frames_gives_empty_matrices() {
        let a = DotProductAnalyzer::new();
        let report = a.analyze(&ProgressReporter::new()).unwrap();
        assert_eq!(report.eigenvalues.shape(), (0, 3));
        assert_eq!(report.similarity.shape(), (0, 0));
    }
}
