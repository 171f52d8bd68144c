//! Bounded rolling time-series buffer, one per chart feed.

use std::collections::VecDeque;

use crate::sample::TimedPoint;

/// Three hours of one-per-second samples.
pub const DEFAULT_MAX_POINTS: usize = 3 * 60 * 60;

/// A sliding window of the most recent points, in arrival order.
///
/// Appending past the bound evicts the oldest entry (FIFO). The buffer
/// makes no ordering or dedup promises beyond arrival order: the stream
/// is trusted to be roughly monotonic, and out-of-order or duplicate
/// samples are appended as-is.
#[derive(Debug, Clone)]
pub struct RollingBuffer {
    points: VecDeque<TimedPoint>,
    max_points: usize,
}

impl Default for RollingBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POINTS)
    }
}

impl RollingBuffer {
    pub fn new(max_points: usize) -> Self {
        Self {
            points: VecDeque::new(),
            max_points,
        }
    }

    /// Append one point, evicting from the front when the bound is hit.
    pub fn push(&mut self, point: TimedPoint) {
        self.points.push_back(point);
        while self.points.len() > self.max_points {
            self.points.pop_front();
        }
    }

    /// Wholesale replacement, used when a snapshot fetch lands. Keeps the
    /// most recent `max_points` entries if the snapshot is larger.
    pub fn replace<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = TimedPoint>,
    {
        self.points = points.into_iter().collect();
        while self.points.len() > self.max_points {
            self.points.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn max_points(&self) -> usize {
        self.max_points
    }

    /// Most recently appended point.
    #[inline]
    pub fn last(&self) -> Option<&TimedPoint> {
        self.points.back()
    }

    #[inline]
    pub fn oldest(&self) -> Option<&TimedPoint> {
        self.points.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimedPoint> {
        self.points.iter()
    }

    /// Project the buffer to `[unix_seconds, value]` pairs for plotting.
    pub fn xy(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(TimedPoint::xy).collect()
    }
}
