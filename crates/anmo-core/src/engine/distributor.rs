use super::progress::{Progress, ProgressReporter};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::info;

/// Claims between two status lines.
pub const REPORT_INTERVAL: usize = 100;

#[derive(Debug)]
struct DistributorState {
    next: usize,
    started: Instant,
}

/// Hands out the rows of a square pairwise matrix, each exactly once.
///
/// All bookkeeping happens in [`RowDistributor::claim`] under one lock, which
/// also serializes the periodic status line.
pub struct RowDistributor<'a> {
    rows: usize,
    state: Mutex<DistributorState>,
    reporter: Option<&'a ProgressReporter<'a>>,
}

impl<'a> RowDistributor<'a> {
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            state: Mutex::new(DistributorState {
                next: 0,
                started: Instant::now(),
            }),
            reporter: None,
        }
    }

    /// Enables the status line every [`REPORT_INTERVAL`] claims.
    pub fn with_reporter(mut self, reporter: &'a ProgressReporter<'a>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Rows handed out so far.
    pub fn claimed(&self) -> usize {
        self.lock().next
    }

    /// Returns the next unclaimed row, or `None` when every row is taken.
    pub fn claim(&self) -> Option<usize> {
        let mut state = self.lock();
        if state.next >= self.rows {
            return None;
        }
        let row = state.next;
        state.next += 1;

        if let Some(reporter) = self.reporter {
            if state.next % REPORT_INTERVAL == 0 {
                let elapsed = state.started.elapsed();
                let line = match estimate_remaining(elapsed, state.next - 1, self.rows) {
                    Some(remaining) => format!(
                        "Row = {:>8}\tElapsed = {:>10} s\tEstimated Remain = {}",
                        state.next,
                        elapsed.as_secs(),
                        format_hms(remaining)
                    ),
                    None => format!("Row = {:>8}\tElapsed = {:>10} s", state.next, elapsed.as_secs()),
                };
                info!("{}", line);
                reporter.report(Progress::Message(line));
            }
        }

        Some(row)
    }

    // A panicking worker aborts the run anyway; the counter itself is never
    // left half-updated.
    fn lock(&self) -> MutexGuard<'_, DistributorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Number of pairs `(i, j)` with `j < i < rows`.
pub fn pair_count(rows: usize) -> usize {
    rows * rows.saturating_sub(1) / 2
}

/// `elapsed * total / done - elapsed`, where `done` counts the pairs of the
/// first `finished_rows` rows. `None` before any pair is done.
pub fn estimate_remaining(elapsed: Duration, finished_rows: usize, rows: usize) -> Option<Duration> {
    let done = pair_count(finished_rows);
    if done == 0 {
        return None;
    }
    let total = pair_count(rows) as f64;
    let secs = elapsed.as_secs_f64() * total / done as f64 - elapsed.as_secs_f64();
    Some(Duration::from_secs_f64(secs.max(0.0)))
}

fn format_hms(d: Duration) -> String {
    let secs = d.as_secs();
    let (hrs, mins, secs) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hrs > 0 {
        format!("{}h {:02}m {:02}s", hrs, mins, secs)
    } else {
        format!("{:02}m {:02}s", mins, secs)
    }
}
