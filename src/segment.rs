use crate::math::{try_normalize, CubicBezier3d, ParametricCurve3d, Point3d, Vector3d};
use crate::point::{ControlPoint, HandleKind};
use cgmath::prelude::*;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// The number of samples taken along each segment unless configured otherwise.
pub const DEFAULT_SAMPLE_COUNT: usize = 10;

/// A segment always has samples at both of its anchors.
pub const MIN_SAMPLE_COUNT: usize = 2;

/// Distances shorter than this are considered fully consumed.
pub(crate) const DISTANCE_EPSILON: f64 = 1e-9;

/// The direction of travel along a curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// The direction in which a signed distance travels.
    pub fn of(distance: f64) -> Self {
        if distance < 0.0 {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }

    /// `1.0` forwards, `-1.0` backwards.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }

    /// The opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    fn step(self, index: usize) -> Option<usize> {
        match self {
            Direction::Forward => index.checked_add(1),
            Direction::Backward => index.checked_sub(1),
        }
    }
}

/// A single cubic bezier piece between two adjacent control points, along
/// with a table of samples used to approximate its arc length.
#[derive(Clone, Debug)]
pub struct CurveSegment {
    /// Index of the control point the segment leaves.
    start: usize,
    /// Index of the control point the segment arrives at.
    end: usize,
    /// The requested number of samples.
    sample_count: usize,
    /// The control polygon as of the last rebuild.
    bezier: CubicBezier3d,
    /// Positions at uniform steps of the curve parameter.
    samples: Vec<Point3d>,
    /// Polyline distance from the first sample to each sample.
    distances: Vec<f64>,
}

impl CurveSegment {
    /// Creates the segment from `points[start]` to `points[end]` and builds its samples.
    pub fn new(start: usize, end: usize, sample_count: usize, points: &[ControlPoint]) -> Self {
        let mut segment = Self {
            start,
            end,
            sample_count: sample_count.max(MIN_SAMPLE_COUNT),
            bezier: CubicBezier3d::line(Point3d::origin(), Point3d::origin()),
            samples: vec![],
            distances: vec![],
        };
        segment.rebuild_samples(points);
        segment
    }

    /// Index of the control point the segment starts at.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Index of the control point the segment ends at.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Gets the number of samples in the table.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Changes the resolution used by the next [CurveSegment::rebuild_samples].
    pub fn set_sample_count(&mut self, sample_count: usize) {
        self.sample_count = sample_count.max(MIN_SAMPLE_COUNT);
    }

    /// Gets the sampled positions, from the start anchor to the end anchor.
    pub fn samples(&self) -> &[Point3d] {
        &self.samples
    }

    /// Gets a sampled position by index.
    pub fn sample(&self, index: usize) -> Point3d {
        debug_assert!(self.within_segment(index), "sample {} out of range", index);
        self.samples[index]
    }

    /// Gets the control polygon as of the last rebuild.
    pub fn bezier(&self) -> &CubicBezier3d {
        &self.bezier
    }

    /// The approximate arc length of the segment.
    pub fn length(&self) -> f64 {
        self.distances.last().copied().unwrap_or(0.0)
    }

    /// The polyline distance from the start of the segment to a sample.
    pub fn distance_at(&self, index: usize) -> f64 {
        debug_assert!(self.within_segment(index), "sample {} out of range", index);
        self.distances[index]
    }

    /// Recomputes the samples and length from the current control point positions.
    pub fn rebuild_samples(&mut self, points: &[ControlPoint]) {
        let (from, to) = (&points[self.start], &points[self.end]);
        self.bezier = CubicBezier3d::new(&[
            from.position(),
            from.handle(HandleKind::Outgoing).position(),
            to.handle(HandleKind::Incoming).position(),
            to.position(),
        ]);

        let n = self.sample_count;
        let step = 1.0 / (n - 1) as f64;
        let mut samples = (0..n)
            .map(|i| self.bezier.sample(i as f64 * step))
            .collect::<Vec<_>>();
        samples[0] = from.position();
        samples[n - 1] = to.position();

        let distances = std::iter::once(0.0)
            .chain(
                samples
                    .iter()
                    .tuple_windows()
                    .scan(0.0, |acc, (a, b)| {
                        *acc += a.distance(*b);
                        Some(*acc)
                    }),
            )
            .collect();

        self.samples = samples;
        self.distances = distances;
    }

    /// Evaluates the bezier directly at parameter `t`.
    pub fn position_at(&self, t: f64) -> Point3d {
        self.bezier.sample(t)
    }

    /// The unnormalised tangent of the bezier at parameter `t`.
    pub fn velocity_at(&self, t: f64) -> Vector3d {
        self.bezier.sample_dt(t)
    }

    /// Maps a fraction of the segment's length to the bezier parameter at that distance.
    pub fn map_uniform_distance(&self, fraction: f64) -> f64 {
        let fraction = fraction.clamp(0.0, 1.0);
        let length = self.length();
        if length <= DISTANCE_EPSILON {
            return fraction;
        }

        let target = fraction * length;
        let last = self.samples.len() - 1;
        let idx = self
            .distances
            .partition_point(|d| *d < target)
            .clamp(1, last);
        let (d0, d1) = (self.distances[idx - 1], self.distances[idx]);
        let f = if d1 - d0 > DISTANCE_EPSILON {
            (target - d0) / (d1 - d0)
        } else {
            0.0
        };
        ((idx - 1) as f64 + f) / last as f64
    }

    /// The bezier parameter of a point `offset` units past sample `index`,
    /// measured along the chord to the next sample (or the previous one when negative).
    pub fn parameter_at(&self, index: usize, offset: f64) -> f64 {
        let last = (self.samples.len() - 1) as f64;
        let dir = Direction::of(offset);
        let fraction = match self.step_length(index, dir) {
            Some(len) if len > DISTANCE_EPSILON => (offset.abs() / len).min(1.0),
            _ => 0.0,
        };
        ((index as f64 + dir.sign() * fraction) / last).clamp(0.0, 1.0)
    }

    /// Steps from sample `from` in `direction`, consuming whole sample-to-sample
    /// distances from `remaining` while they fit.
    ///
    /// Returns the sample reached. On return `remaining` holds the leftover
    /// distance, which is shorter than the next step unless the end of the
    /// segment was reached first.
    pub fn find_sample_index_for_distance(
        &self,
        from: usize,
        remaining: &mut f64,
        direction: Direction,
    ) -> usize {
        debug_assert!(self.within_segment(from), "sample {} out of range", from);
        let mut idx = from;
        while *remaining > DISTANCE_EPSILON {
            let Some(next) = direction.step(idx).filter(|i| self.within_segment(*i)) else {
                break;
            };
            let step = self.samples[idx].distance(self.samples[next]);
            if step > *remaining + DISTANCE_EPSILON {
                break;
            }
            *remaining = f64::max(*remaining - step, 0.0);
            idx = next;
        }
        idx
    }

    /// Whether `index` addresses a sample of this segment.
    pub fn within_segment(&self, index: usize) -> bool {
        index < self.samples.len()
    }

    /// Whether no further samples follow `index` in `direction`.
    pub fn is_boundary(&self, index: usize, direction: Direction) -> bool {
        match direction {
            Direction::Forward => index + 1 >= self.samples.len(),
            Direction::Backward => index == 0,
        }
    }

    /// The sample at which travel in `direction` enters the segment.
    pub fn entry_sample(&self, direction: Direction) -> usize {
        match direction {
            Direction::Forward => 0,
            Direction::Backward => self.samples.len() - 1,
        }
    }

    /// The distance from sample `index` to its neighbour in `direction`.
    pub fn step_length(&self, index: usize, direction: Direction) -> Option<f64> {
        let next = direction.step(index).filter(|i| self.within_segment(*i))?;
        Some(self.samples[index].distance(self.samples[next]))
    }

    /// The unit vector from sample `index` towards its neighbour in `direction`.
    pub fn step_direction(&self, index: usize, direction: Direction) -> Option<Vector3d> {
        let next = direction.step(index).filter(|i| self.within_segment(*i))?;
        try_normalize(self.samples[next] - self.samples[index])
    }

    /// A unit tangent at parameter `t`, or `None` where the tangent vanishes.
    pub fn tangent_at(&self, t: f64) -> Option<Vector3d> {
        try_normalize(self.velocity_at(t))
    }
}
