use crate::core::enm::FIRST_INTERNAL_MODE;
use crate::core::enm::spectrum::SpectrumBuilder;
use crate::core::enm::topology::Topology;
use crate::core::io::traits::{Trajectory, TrajectoryError};
use crate::core::models::structure::Structure;
use crate::engine::analysis::{AnalysisReport, Analyzer, SimilarityStrategy};
use crate::engine::config::AnmoConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{debug, info, instrument, trace};

/// Analyzes `trajectory` over the atoms of `subset` and writes the
/// eigenvalue table and similarity matrix under the configured prefix.
///
/// Each atom of `subset` takes its coordinates from the frame position given
/// by its `index`. Timesteps in the results count from the first analyzed
/// frame's position in the trajectory, i.e. they start at `config.skip`.
#[instrument(skip_all, name = "traj_workflow")]
pub fn run<T: Trajectory + ?Sized>(
    subset: &Structure,
    trajectory: &mut T,
    config: &AnmoConfig,
    header: &str,
    reporter: &ProgressReporter,
) -> Result<AnalysisReport, EngineError> {
    let strategy = accumulate(subset, trajectory, config, reporter)?;

    reporter.report(Progress::PhaseStart {
        name: "Similarity Matrix",
    });
    let report = strategy.finalize(&config.output_prefix, header, reporter)?;
    reporter.report(Progress::PhaseFinish);

    info!(frames = report.frames(), "Trajectory analysis complete.");
    Ok(report)
}

/// Same as [`run`] but keeps the results in memory.
#[instrument(skip_all, name = "traj_analysis")]
pub fn analyze<T: Trajectory + ?Sized>(
    subset: &Structure,
    trajectory: &mut T,
    config: &AnmoConfig,
    reporter: &ProgressReporter,
) -> Result<AnalysisReport, EngineError> {
    let strategy = accumulate(subset, trajectory, config, reporter)?;
    reporter.report(Progress::PhaseStart {
        name: "Similarity Matrix",
    });
    let report = strategy.analyze(reporter)?;
    reporter.report(Progress::PhaseFinish);
    Ok(report)
}

fn accumulate<T: Trajectory + ?Sized>(
    subset: &Structure,
    trajectory: &mut T,
    config: &AnmoConfig,
    reporter: &ProgressReporter,
) -> Result<SimilarityStrategy, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let topology = Topology::from_structure(subset, config.springs.bound.is_some())?;
    info!(
        nodes = topology.size(),
        contacts = topology.contacts().len(),
        bonded = topology.bonded_count(),
        spring = %config.springs.contact,
        "Built elastic network topology."
    );
    let dof = topology.dof();
    let builder = SpectrumBuilder::new(topology, config.springs);
    let mut strategy = SimilarityStrategy::from_config(config, dof)?;
    debug!(method = config.method.tag(), dof, "Selected similarity strategy.");

    let frames = trajectory.frame_count();
    if config.skip > frames {
        return Err(TrajectoryError::FrameOutOfRange {
            index: config.skip,
            frames,
        }
        .into());
    }
    let remaining = frames - config.skip;
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Frame Analysis",
    });
    reporter.report(Progress::TaskStart {
        total: remaining as u64,
    });

    if remaining > 0 {
        trajectory.seek_frame(config.skip)?;
        let mut working = subset.clone();
        let mut timestep = config.skip;
        while trajectory.read_frame()? {
            trajectory.update_coords(&mut working)?;
            let spectrum = builder.solve(&working.positions())?;
            trace!(timestep, lambda6 = ?spectrum.eigenvalues.get(FIRST_INTERNAL_MODE), "Solved frame");
            strategy.accumulate(timestep, &spectrum)?;
            timestep += 1;
            reporter.report(Progress::TaskIncrement);
        }
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);
    info!(
        frames = strategy.frames(),
        skipped = config.skip,
        "Accumulated frame spectra."
    );
    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::enm::springs::Spring;
    use crate::core::io::ascii::read_ascii_matrix;
    use crate::core::io::series::FrameSeries;
    use crate::core::models::atom::Atom;
    use crate::engine::config::{AnalysisMethod, AnmoConfigBuilder};
    use nalgebra::{DMatrix, Point3};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const BASE: [[f64; 3]; 5] = [
        [0.0, 0.0, 0.0],
        [3.8, 0.0, 0.0],
        [1.9, 3.3, 0.0],
        [1.9, 1.1, 3.1],
        [5.2, 2.9, 1.4],
    ];

    fn subset() -> Structure {
        Structure::new(
            BASE.iter()
                .enumerate()
                .map(|(i, p)| Atom::new(i, i + 1, "CA", Point3::new(p[0], p[1], p[2])))
                .collect(),
        )
    }

    fn jittered_series(frames: usize, seed: u64) -> FrameSeries {
        let mut rng = StdRng::seed_from_u64(seed);
        FrameSeries::new(
            (0..frames)
                .map(|_| {
                    BASE.iter()
                        .map(|p| {
                            Point3::new(
                                p[0] + rng.gen_range(-0.3..0.3),
                                p[1] + rng.gen_range(-0.3..0.3),
                                p[2] + rng.gen_range(-0.3..0.3),
                            )
                        })
                        .collect()
                })
                .collect(),
        )
    }

    fn config(method: AnalysisMethod) -> AnmoConfig {
        AnmoConfigBuilder::new()
            .method(method)
            .report_progress(false)
            .build()
            .unwrap()
    }

    fn assert_symmetric(m: &DMatrix<f64>) {
        assert_eq!(m.nrows(), m.ncols());
        for i in 0..m.nrows() {
            for j in 0..m.ncols() {
                assert!((m[(i, j)] - m[(j, i)]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn dot_product_over_ten_frames() {
        let mut traj = jittered_series(10, 11);
        let report = analyze(
            &subset(),
            &mut traj,
            &config(AnalysisMethod::DotProduct),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(report.tag, "D");
        assert_eq!(report.eigenvalues.shape(), (10, 3));
        for t in 0..10 {
            assert_eq!(report.eigenvalues[(t, 0)], t as f64);
            assert!(report.eigenvalues[(t, 1)] > 0.0);
            assert!(report.eigenvalues[(t, 1)] <= report.eigenvalues[(t, 2)]);
        }

        let d = &report.similarity;
        assert_eq!(d.shape(), (10, 10));
        assert_symmetric(d);
        for i in 0..10 {
            assert!((d[(i, i)] - 1.0).abs() < 1e-9);
        }
        assert!(d.iter().all(|&v| (0.0..=1.0 + 1e-9).contains(&v)));
    }

    #[test]
    fn covariance_overlap_is_identical_for_one_and_four_threads() {
        let overlap = |threads| {
            let mut traj = jittered_series(12, 23);
            analyze(
                &subset(),
                &mut traj,
                &config(AnalysisMethod::CovarianceOverlap {
                    threads,
                    partial_modes: 3,
                }),
                &ProgressReporter::new(),
            )
            .unwrap()
        };
        let one = overlap(1);
        let four = overlap(4);
        assert_eq!(one, four);

        let o = &four.similarity;
        assert_eq!(o.shape(), (12, 12));
        assert_symmetric(o);
        for i in 0..12 {
            assert_eq!(o[(i, i)], 1.0);
        }
        assert!(o.iter().all(|&v| v > -1e-9 && v < 1.0 + 1e-9));
    }

    #[test]
    fn skipped_frames_offset_the_timesteps() {
        let mut traj = jittered_series(6, 5);
        let cfg = AnmoConfigBuilder::new()
            .method(AnalysisMethod::DotProduct)
            .skip(4)
            .build()
            .unwrap();
        let report = analyze(&subset(), &mut traj, &cfg, &ProgressReporter::new()).unwrap();
        assert_eq!(report.eigenvalues.column(0).iter().copied().collect::<Vec<_>>(), vec![4.0, 5.0]);
    }

    #[test]
    fn skipping_every_frame_writes_empty_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("empty").to_string_lossy().into_owned();
        let cfg = AnmoConfigBuilder::new()
            .method(AnalysisMethod::CovarianceOverlap {
                threads: 2,
                partial_modes: 0,
            })
            .skip(3)
            .output_prefix(prefix.clone())
            .build()
            .unwrap();
        let mut traj = jittered_series(3, 1);

        let report = run(&subset(), &mut traj, &cfg, "anmo test", &ProgressReporter::new()).unwrap();
        assert_eq!(report.frames(), 0);
        assert_eq!(read_ascii_matrix(format!("{}_s.asc", prefix)).unwrap().shape(), (0, 3));
        assert_eq!(read_ascii_matrix(format!("{}_O.asc", prefix)).unwrap().shape(), (0, 0));
    }

    #[test]
    fn skipping_past_the_end_is_an_error() {
        let mut traj = jittered_series(3, 1);
        let cfg = AnmoConfigBuilder::new()
            .method(AnalysisMethod::DotProduct)
            .skip(4)
            .build()
            .unwrap();
        let err = analyze(&subset(), &mut traj, &cfg, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Trajectory(TrajectoryError::FrameOutOfRange { index: 4, frames: 3 })
        ));
    }

    #[test]
    fn run_writes_artifacts_that_match_the_report() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("dot").to_string_lossy().into_owned();
        let cfg = AnmoConfigBuilder::new()
            .method(AnalysisMethod::DotProduct)
            .output_prefix(prefix.clone())
            .build()
            .unwrap();
        let mut traj = jittered_series(4, 9);

        let report = run(&subset(), &mut traj, &cfg, "anmo traj test", &ProgressReporter::new()).unwrap();
        assert_eq!(read_ascii_matrix(format!("{}_s.asc", prefix)).unwrap(), report.eigenvalues);
        assert_eq!(read_ascii_matrix(format!("{}_D.asc", prefix)).unwrap(), report.similarity);
        let text = std::fs::read_to_string(format!("{}_D.asc", prefix)).unwrap();
        assert!(text.starts_with("# anmo traj test\n"));
    }

    #[test]
    fn bound_spring_requires_connectivity() {
        let mut traj = jittered_series(2, 3);
        let cfg = AnmoConfigBuilder::new()
            .method(AnalysisMethod::DotProduct)
            .bound_spring(Some(Spring::Constant { k: 100.0 }))
            .build()
            .unwrap();
        let err = analyze(&subset(), &mut traj, &cfg, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(err, EngineError::Topology(_)));
    }

    #[test]
    fn bound_spring_uses_subset_bonds() {
        let atoms = subset().atoms().to_vec();
        let bonded = Structure::with_bonds(atoms, (1..5).map(|i| (i - 1, i))).unwrap();
        let mut traj = jittered_series(3, 3);
        let cfg = AnmoConfigBuilder::new()
            .method(AnalysisMethod::DotProduct)
            .bound_spring(Some(Spring::Constant { k: 100.0 }))
            .build()
            .unwrap();
        let report = analyze(&bonded, &mut traj, &cfg, &ProgressReporter::new()).unwrap();
        assert_eq!(report.frames(), 3);
    }

    #[test]
    fn too_few_atoms_for_two_internal_modes_is_rejected() {
        let two = Structure::new(vec![
            Atom::new(0, 1, "CA", Point3::origin()),
            Atom::new(1, 2, "CA", Point3::new(3.8, 0.0, 0.0)),
        ]);
        let mut traj = FrameSeries::new(vec![vec![Point3::origin(), Point3::new(3.8, 0.0, 0.0)]]);
        let err = analyze(&two, &mut traj, &config(AnalysisMethod::DotProduct), &ProgressReporter::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::TooFewModes { required: 8, found: 6 }));
    }

    #[test]
    fn progress_counts_every_analyzed_frame() {
        use std::sync::Mutex;
        let increments = Mutex::new(0u64);
        let total = Mutex::new(0u64);
        let reporter = ProgressReporter::with_callback(Box::new(|e| match e {
            Progress::TaskStart { total: t } => *total.lock().unwrap() = t,
            Progress::TaskIncrement => *increments.lock().unwrap() += 1,
            _ => {}
        }));
        let mut traj = jittered_series(5, 2);
        analyze(&subset(), &mut traj, &config(AnalysisMethod::DotProduct), &reporter).unwrap();
        drop(reporter);
        assert_eq!(total.into_inner().unwrap(), 5);
        assert_eq!(increments.into_inner().unwrap(), 5);
    }
}
