use super::{Analyzer, EigenvalueTable};
use crate::core::enm::FIRST_INTERNAL_MODE;
use crate::core::enm::overlap::{ModeSet, covariance_overlap};
use crate::core::enm::spectrum::Spectrum;
use crate::engine::config::ConfigError;
use crate::engine::error::EngineError;
use crate::engine::pool::PairwiseEngine;
use crate::engine::progress::ProgressReporter;
use nalgebra::DMatrix;
use tracing::{info, instrument};

/// Compares frames by the covariance overlap of their first `modes`
/// internal modes, computed on a pool of worker threads.
#[derive(Debug, Clone)]
pub struct CovarianceOverlapAnalyzer {
    table: EigenvalueTable,
    archive: Vec<ModeSet>,
    modes: usize,
    threads: usize,
    report_progress: bool,
}

impl CovarianceOverlapAnalyzer {
    /// `partial_modes == 0` keeps all `dof - 6` internal modes.
    ///
    /// # Errors
    ///
    /// Fails for a zero thread count or when `partial_modes` exceeds the
    /// number of internal modes.
    pub fn new(dof: usize, threads: usize, partial_modes: usize) -> Result<Self, ConfigError> {
        if threads == 0 {
            return Err(ConfigError::NoWorkerThreads);
        }
        let available = dof.saturating_sub(FIRST_INTERNAL_MODE);
        if partial_modes > available {
            return Err(ConfigError::TooManyModes {
                requested: partial_modes,
                available,
            });
        }
        let modes = if partial_modes == 0 {
            available
        } else {
            partial_modes
        };
        Ok(Self {
            table: EigenvalueTable::default(),
            archive: Vec::new(),
            modes,
            threads,
            report_progress: false,
        })
    }

    /// Enables periodic ETA lines while the matrix is computed.
    pub fn report_progress(mut self, enabled: bool) -> Self {
        self.report_progress = enabled;
        self
    }

    /// Modes kept per frame.
    pub fn modes(&self) -> usize {
        self.modes
    }
}

impl Analyzer for CovarianceOverlapAnalyzer {
    fn accumulate(&mut self, timestep: usize, spectrum: &Spectrum) -> Result<(), EngineError> {
        let needed = FIRST_INTERNAL_MODE + self.modes;
        if spectrum.len() < needed {
            return Err(EngineError::TooFewModes {
                required: needed,
                found: spectrum.len(),
            });
        }
        // The table rejects short spectra before it grows, so a failure here
        // leaves the table and the archive the same length.
        self.table.push(timestep, spectrum)?;
        self.archive
            .push(ModeSet::from_spectrum(spectrum, FIRST_INTERNAL_MODE, self.modes));
        Ok(())
    }

    fn frames(&self) -> usize {
        self.archive.len()
    }

    fn eigenvalue_table(&self) -> DMatrix<f64> {
        self.table.to_matrix()
    }

    fn tag(&self) -> &'static str {
        "O"
    }

    #[instrument(skip_all, name = "covariance_overlap_matrix", fields(frames = self.archive.len(), modes = self.modes))]
    fn similarity(self, reporter: &ProgressReporter) -> Result<DMatrix<f64>, EngineError> {
        let mut engine = PairwiseEngine::new(self.threads)?;
        if self.report_progress {
            engine = engine.with_reporter(reporter);
        }

        let started = std::time::Instant::now();
        let archive = &self.archive;
        let mut matrix = engine.compute(archive.len(), |i, j| {
            covariance_overlap(&archive[i], &archive[j])
        })?;
        matrix.fill_diagonal(1.0);

        info!(
            seconds = started.elapsed().as_secs(),
            threads = engine.threads(),
            "Covariance overlap matrix complete."
        );
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::enm::springs::SpringSet;
    use crate::core::enm::spectrum::SpectrumBuilder;
    use crate::core::enm::topology::Topology;
    use nalgebra::Point3;

    fn frames() -> Vec<Vec<Point3<f64>>> {
        (0..6)
            .map(|f| {
                let w = 0.15 * f as f64;
                vec![
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(3.8, 0.1 * w, 0.0),
                    Point3::new(1.9, 3.3, w),
                    Point3::new(1.9 - w, 1.1, 3.1),
                    Point3::new(5.2, 2.9 + w, 1.4),
                ]
            })
            .collect()
    }

    fn run(threads: usize, partial: usize) -> DMatrix<f64> {
        let builder = SpectrumBuilder::new(Topology::fully_connected(5), SpringSet::default());
        let mut a = CovarianceOverlapAnalyzer::new(15, threads, partial).unwrap();
        for (t, coords) in frames().iter().enumerate() {
            a.accumulate(t, &builder.solve(coords).unwrap()).unwrap();
        }
        a.similarity(&ProgressReporter::new()).unwrap()
    }

    #[test]
    fn zero_partial_keeps_every_internal_mode() {
        assert_eq!(CovarianceOverlapAnalyzer::new(15, 1, 0).unwrap().modes(), 9);
        assert_eq!(CovarianceOverlapAnalyzer::new(15, 1, 3).unwrap().modes(), 3);
    }

    #[test]
    fn invalid_mode_or_thread_counts_are_config_errors() {
        assert_eq!(
            CovarianceOverlapAnalyzer::new(15, 1, 10).unwrap_err(),
            ConfigError::TooManyModes {
                requested: 10,
                available: 9
            }
        );
        assert_eq!(
            CovarianceOverlapAnalyzer::new(15, 0, 0).unwrap_err(),
            ConfigError::NoWorkerThreads
        );
    }

    #[test]
    fn overlap_matrix_is_symmetric_with_unit_diagonal() {
        let o = run(2, 0);
        assert_eq!(o.shape(), (6, 6));
        for i in 0..6 {
            assert_eq!(o[(i, i)], 1.0);
            for j in 0..6 {
                assert_eq!(o[(i, j)], o[(j, i)]);
                assert!(o[(i, j)] > -1e-9 && o[(i, j)] < 1.0 + 1e-9);
            }
        }
    }

    #[test]
    fn similar_frames_overlap_more_than_distant_ones() {
        let o = run(1, 0);
        assert!(o[(0, 1)] > o[(0, 5)]);
    }

    #[test]
    fn thread_count_does_not_change_the_result() {
        assert_eq!(run(1, 3), run(4, 3));
    }

    #[test]
    fn archive_holds_requested_window() {
        let builder = SpectrumBuilder::new(Topology::fully_connected(5), SpringSet::default());
        let spectrum = builder.solve(&frames()[0]).unwrap();
        let mut a = CovarianceOverlapAnalyzer::new(15, 1, 2).unwrap();
        a.accumulate(0, &spectrum).unwrap();
        let kept = &a.archive[0];
        assert_eq!(kept.modes.shape(), (15, 2));
        assert_eq!(kept.compliances[0], 1.0 / spectrum.eigenvalues[6]);
        assert_eq!(kept.compliances[1], 1.0 / spectrum.eigenvalues[7]);
    }

    #[test]
    fn rejected_frame_leaves_table_and_archive_in_step() {
        let small = SpectrumBuilder::new(Topology::fully_connected(4), SpringSet::default());
        let full = SpectrumBuilder::new(Topology::fully_connected(5), SpringSet::default());
        let mut a = CovarianceOverlapAnalyzer::new(15, 1, 9).unwrap();

        let short = small.solve(&frames()[0][..4]).unwrap();
        assert_eq!(short.len(), 12);
        assert!(matches!(
            a.accumulate(0, &short),
            Err(EngineError::TooFewModes {
                required: 15,
                found: 12
            })
        ));
        assert_eq!(a.eigenvalue_table().nrows(), 0);
        assert_eq!(a.frames(), 0);

        a.accumulate(1, &full.solve(&frames()[1]).unwrap()).unwrap();
        assert_eq!(a.eigenvalue_table().nrows(), 1);
        assert_eq!(a.frames(), 1);
        assert_eq!(a.eigenvalue_table()[(0, 0)], 1.0);
    }
}
