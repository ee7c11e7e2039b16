use super::config::ConfigError;
use super::distributor::RowDistributor;
use super::error::EngineError;
use super::progress::ProgressReporter;
use nalgebra::DMatrix;
use tracing::{debug, instrument};

type Row = (usize, Vec<f64>);

/// Fills a symmetric pairwise matrix on a fixed pool of worker threads.
///
/// Every pool thread runs one worker. Workers claim rows from a shared
/// [`RowDistributor`]; for row `i` a worker evaluates `pair(i, j)` for all
/// `j < i` and keeps the row to itself. Once all workers have joined, the
/// rows are mirrored into the matrix, so the result does not depend on the
/// number of threads or on claim order.
pub struct PairwiseEngine<'a> {
    threads: usize,
    reporter: Option<&'a ProgressReporter<'a>>,
}

impl<'a> PairwiseEngine<'a> {
    /// # Errors
    ///
    /// Returns [`ConfigError::NoWorkerThreads`] for a zero thread count.
    pub fn new(threads: usize) -> Result<Self, ConfigError> {
        if threads == 0 {
            return Err(ConfigError::NoWorkerThreads);
        }
        Ok(Self {
            threads,
            reporter: None,
        })
    }

    pub fn with_reporter(mut self, reporter: &'a ProgressReporter<'a>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Computes the `size`×`size` matrix with `pair(i, j)` at `(i, j)` and
    /// `(j, i)` for every `j < i`. The diagonal is left at zero.
    ///
    /// A panic inside `pair` propagates to the caller.
    #[instrument(skip_all, name = "pairwise_engine", fields(size = size, threads = self.threads))]
    pub fn compute<F>(&self, size: usize, pair: F) -> Result<DMatrix<f64>, EngineError>
    where
        F: Fn(usize, usize) -> f64 + Sync,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("anmo-worker-{}", i))
            .build()?;

        let mut distributor = RowDistributor::new(size);
        if let Some(reporter) = self.reporter {
            distributor = distributor.with_reporter(reporter);
        }

        let per_worker: Vec<Vec<Row>> =
            pool.broadcast(|ctx| run_worker(ctx.index(), &distributor, &pair));
        debug!(rows = distributor.claimed(), "All workers joined");

        // Rows are held until the join and copied out afterwards, so the lower
        // triangle briefly exists twice (about 1.5x the matrix at peak). Each
        // row is dropped as soon as it has been mirrored.
        let mut matrix = DMatrix::<f64>::zeros(size, size);
        for (i, row) in per_worker.into_iter().flatten() {
            for (j, value) in row.into_iter().enumerate() {
                matrix[(i, j)] = value;
                matrix[(j, i)] = value;
            }
        }
        Ok(matrix)
    }
}

fn run_worker<F>(worker: usize, distributor: &RowDistributor<'_>, pair: &F) -> Vec<Row>
where
    F: Fn(usize, usize) -> f64 + Sync,
{
    let mut rows = Vec::new();
    while let Some(i) = distributor.claim() {
        rows.push((i, (0..i).map(|j| pair(i, j)).collect()));
    }
    debug!(worker, rows = rows.len(), "Worker finished");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pattern(i: usize, j: usize) -> f64 {
        ((i * 31 + j * 17) % 97) as f64 / 97.0
    }

    #[test]
    fn zero_threads_is_a_config_error() {
        assert_eq!(PairwiseEngine::new(0).err(), Some(ConfigError::NoWorkerThreads));
    }

    #[test]
    fn fills_lower_triangle_and_mirrors_it() {
        let engine = PairwiseEngine::new(3).unwrap();
        let m = engine.compute(7, pattern).unwrap();
        for i in 0..7 {
            assert_eq!(m[(i, i)], 0.0);
            for j in 0..i {
                assert_eq!(m[(i, j)], pattern(i, j));
                assert_eq!(m[(j, i)], pattern(i, j));
            }
        }
    }

    #[test]
    fn each_pair_is_evaluated_once() {
        let calls = AtomicUsize::new(0);
        let engine = PairwiseEngine::new(4).unwrap();
        engine
            .compute(50, |i, j| {
                calls.fetch_add(1, Ordering::Relaxed);
                (i + j) as f64
            })
            .unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 50 * 49 / 2);
    }

    #[test]
    fn result_is_independent_of_thread_count() {
        let f = |i: usize, j: usize| ((i as f64).sin() * (j as f64 + 0.5).cos()).abs();
        let single = PairwiseEngine::new(1).unwrap().compute(120, f).unwrap();
        for threads in [2, 4, 8] {
            let many = PairwiseEngine::new(threads).unwrap().compute(120, f).unwrap();
            assert_eq!(single, many);
        }
    }

    #[test]
    fn degenerate_sizes_give_empty_or_zero_matrices() {
        let engine = PairwiseEngine::new(2).unwrap();
        assert_eq!(engine.compute(0, pattern).unwrap().nrows(), 0);
        assert_eq!(engine.compute(1, pattern).unwrap(), DMatrix::<f64>::zeros(1, 1));
    }

    #[test]
    #[should_panic]
    fn worker_panics_propagate() {
        let engine = PairwiseEngine::new(2).unwrap();
        let _ = engine.compute(10, |i, _| if i == 7 { panic!("boom") } else { 0.0 });
    }
}
