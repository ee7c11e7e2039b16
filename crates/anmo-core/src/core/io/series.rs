use super::traits::{Trajectory, TrajectoryError};
use nalgebra::Point3;

/// An in-memory trajectory.
#[derive(Debug, Clone, Default)]
pub struct FrameSeries {
    frames: Vec<Vec<Point3<f64>>>,
    cursor: usize,
    current: Option<usize>,
}

impl FrameSeries {
    /// Creates a series from frames that all hold the same number of atoms.
    pub fn new(frames: Vec<Vec<Point3<f64>>>) -> Self {
        Self {
            frames,
            cursor: 0,
            current: None,
        }
    }

    pub fn frames(&self) -> &[Vec<Point3<f64>>] {
        &self.frames
    }
}

impl Trajectory for FrameSeries {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn atom_count(&self) -> usize {
        self.frames.first().map_or(0, Vec::len)
    }

    fn seek_frame(&mut self, index: usize) -> Result<(), TrajectoryError> {
        if index >= self.frames.len() {
            return Err(TrajectoryError::FrameOutOfRange {
                index,
                frames: self.frames.len(),
            });
        }
        self.cursor = index;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<bool, TrajectoryError> {
        if self.cursor >= self.frames.len() {
            return Ok(false);
        }
        self.current = Some(self.cursor);
        self.cursor += 1;
        Ok(true)
    }

    fn current_frame(&self) -> Option<&[Point3<f64>]> {
        self.current.map(|i| self.frames[i].as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: usize) -> FrameSeries {
        FrameSeries::new(
            (0..n)
                .map(|f| vec![Point3::new(f as f64, 0.0, 0.0); 2])
                .collect(),
        )
    }

    #[test]
    fn reads_every_frame_then_stops() {
        let mut s = series(3);
        let mut count = 0;
        while s.read_frame().unwrap() {
            assert_eq!(s.current_frame().unwrap()[0].x, count as f64);
            count += 1;
        }
        assert_eq!(count, 3);
        assert_eq!(s.frame_count(), 3);
        assert_eq!(s.atom_count(), 2);
    }

    #[test]
    fn seek_then_read_loads_requested_frame() {
        let mut s = series(4);
        s.seek_frame(2).unwrap();
        assert!(s.read_frame().unwrap());
        assert_eq!(s.current_frame().unwrap()[1].x, 2.0);
    }

    #[test]
    fn seek_past_end_is_out_of_range() {
        let mut s = series(1);
        assert!(matches!(
            s.seek_frame(1),
            Err(TrajectoryError::FrameOutOfRange {
                index: 1,
                frames: 1
            })
        ));
    }

    #[test]
    fn empty_series_has_no_frames() {
        let mut s = FrameSeries::default();
        assert_eq!(s.atom_count(), 0);
        assert!(!s.read_frame().unwrap());
        assert!(s.current_frame().is_none());
    }
}
