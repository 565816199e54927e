use crate::math::{Point3d, Quat, Vector3d};
use crate::point::{ControlPoint, HandleKind, Transform};
use crate::segment::{
    CurveSegment, Direction, DEFAULT_SAMPLE_COUNT, DISTANCE_EPSILON, MIN_SAMPLE_COUNT,
};
use cgmath::prelude::*;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// The attributes of a curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveAttributes {
    /// Whether an extra segment joins the last control point back to the first.
    pub auto_connect: bool,
    /// The number of samples taken along each segment.
    pub sample_count: usize,
    /// The placement of the curve, which control points are relative to.
    pub transform: Transform,
}

impl Default for CurveAttributes {
    fn default() -> Self {
        Self {
            auto_connect: false,
            sample_count: DEFAULT_SAMPLE_COUNT,
            transform: Transform::default(),
        }
    }
}

/// A location on a curve: a sample of a segment plus a small positional offset from it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cursor {
    /// The segment index.
    pub segment: usize,
    /// The sample index within the segment.
    pub sample: usize,
    /// The offset from the sample towards its neighbour in `towards`.
    pub offset: Vector3d,
    /// Which neighbouring sample `offset` points at.
    pub towards: Direction,
}

impl Cursor {
    /// A cursor exactly on a sample.
    pub fn new(segment: usize, sample: usize) -> Self {
        Self {
            segment,
            sample,
            offset: Vector3d::zero(),
            towards: Direction::Forward,
        }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// The segments entered during a traversal, in the order they were entered.
pub type Crossings = SmallVec<[usize; 4]>;

/// The result of [Curve::resolve_distance].
#[derive(Clone, Debug, PartialEq)]
pub struct Traversal {
    /// Where the traversal ended up.
    pub cursor: Cursor,
    /// Every segment boundary crossed, recorded as the index of the segment entered.
    pub crossed: Crossings,
    /// Whether the traversal ran into the end of an open curve.
    pub reached_end: bool,
}

/// A piecewise cubic bezier curve through an ordered list of control points.
#[derive(Clone, Debug)]
pub struct Curve {
    /// The control points, in traversal order.
    points: Vec<ControlPoint>,
    /// One segment per consecutive pair of points.
    segments: Vec<CurveSegment>,
    /// The distance from the head of the curve to the start of each segment.
    segment_starts: Vec<f64>,
    /// The sum of all segment lengths.
    total_length: f64,
    /// Whether the curve is a closed loop.
    auto_connect: bool,
    /// The number of samples taken along each segment.
    sample_count: usize,
    /// The placement of the curve in the world.
    transform: Transform,
    /// Points edited since the last refresh.
    dirty: Vec<usize>,
}

impl Curve {
    /// Creates an empty curve.
    pub fn new(attributes: &CurveAttributes) -> Self {
        Self {
            points: vec![],
            segments: vec![],
            segment_starts: vec![],
            total_length: 0.0,
            auto_connect: attributes.auto_connect,
            sample_count: attributes.sample_count.max(MIN_SAMPLE_COUNT),
            transform: attributes.transform,
            dirty: vec![],
        }
    }

    /// Creates a curve through the given points, whose poses are relative to the curve.
    pub fn with_points(attributes: &CurveAttributes, points: Vec<ControlPoint>) -> Self {
        let mut curve = Self::new(attributes);
        curve.load_points(points);
        curve
    }

    /// Gets the control points, in traversal order.
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Gets a control point by index.
    pub fn point(&self, index: usize) -> &ControlPoint {
        &self.points[index]
    }

    /// Gets the segments, one per consecutive pair of points.
    pub fn segments(&self) -> &[CurveSegment] {
        &self.segments
    }

    /// Gets a segment by index.
    pub fn segment(&self, index: usize) -> &CurveSegment {
        &self.segments[index]
    }

    /// The total length of the curve, as of the last refresh.
    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    /// Whether the last control point joins back to the first.
    pub fn is_auto_connect(&self) -> bool {
        self.auto_connect
    }

    /// Gets the number of samples taken along each segment.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Gets the placement of the curve in the world.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// The attributes the curve is currently configured with.
    pub fn attributes(&self) -> CurveAttributes {
        CurveAttributes {
            auto_connect: self.auto_connect,
            sample_count: self.sample_count,
            transform: self.transform,
        }
    }

    /// Appends a control point to the curve, returning its index.
    pub fn add_point(&mut self, point: ControlPoint) -> usize {
        let index = self.points.len();
        self.points.push(point);
        self.points[index].update_world(&self.transform);
        self.rebuild_segments_incremental(index);
        index
    }

    /// Inserts a control point before `index`.
    pub fn insert_point(&mut self, index: usize, point: ControlPoint) {
        self.points.insert(index, point);
        self.points[index].update_world(&self.transform);
        self.rebuild_segments();
    }

    /// Removes a control point along with the segments attached to it.
    pub fn remove_point(&mut self, index: usize) -> ControlPoint {
        let point = self.points.remove(index);
        self.rebuild_segments();
        point
    }

    /// Removes every control point.
    pub fn clear(&mut self) {
        self.points.clear();
        self.rebuild_segments();
    }

    /// Replaces all control points, e.g. after loading a saved path.
    pub fn load_points(&mut self, points: Vec<ControlPoint>) {
        self.points = points;
        for point in &mut self.points {
            point.update_world(&self.transform);
        }
        self.rebuild_segments();
    }

    /// Opens or closes the loop.
    pub fn set_auto_connect(&mut self, auto_connect: bool) {
        if self.auto_connect != auto_connect {
            self.auto_connect = auto_connect;
            self.rebuild_segments();
        }
    }

    /// Moves the whole curve. Takes effect on the next [Curve::commit].
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        for point in &mut self.points {
            point.update_world(&transform);
        }
        self.dirty = (0..self.points.len()).collect();
    }

    /// Changes the per-segment resolution and resamples every segment.
    pub fn set_sample_count(&mut self, sample_count: usize) {
        self.sample_count = sample_count.max(MIN_SAMPLE_COUNT);
        for segment in &mut self.segments {
            segment.set_sample_count(self.sample_count);
        }
        self.force_update_all();
    }

    /// Shares a total sample budget evenly between the control points.
    pub fn set_sample_budget(&mut self, total_samples: usize) {
        let per_point = total_samples / self.points.len().max(1);
        self.set_sample_count(per_point);
    }

    /// Moves a control point's anchor to a world position.
    pub fn set_point_position(&mut self, index: usize, position: Point3d) {
        let transform = self.transform;
        self.points[index].set_position(position, &transform);
        self.mark_dirty(index);
    }

    /// Moves a control point's anchor to a position relative to the curve.
    pub fn set_point_local_position(&mut self, index: usize, position: Point3d) {
        let transform = self.transform;
        self.points[index].set_local_position(position, &transform);
        self.mark_dirty(index);
    }

    /// Rotates a control point to a world orientation.
    pub fn set_point_rotation(&mut self, index: usize, rotation: Quat) {
        let transform = self.transform;
        self.points[index].set_rotation(rotation, &transform);
        self.mark_dirty(index);
    }

    /// Rotates a control point relative to the curve.
    pub fn set_point_local_rotation(&mut self, index: usize, rotation: Quat) {
        let transform = self.transform;
        self.points[index].set_local_rotation(rotation, &transform);
        self.mark_dirty(index);
    }

    /// Sets a handle's offset from its anchor.
    pub fn set_handle_local_position(&mut self, index: usize, kind: HandleKind, local: Vector3d) {
        self.points[index].set_local_handle_position(kind, local);
        self.mark_dirty(index);
    }

    /// Moves a handle to a world position.
    pub fn set_handle_position(&mut self, index: usize, kind: HandleKind, position: Point3d) {
        self.points[index].set_handle_position(kind, position);
        self.mark_dirty(index);
    }

    /// Enables or disables handle mirroring on a control point.
    pub fn set_auto_smooth(&mut self, index: usize, auto_smooth: bool) {
        self.points[index].set_auto_smooth(auto_smooth);
        self.mark_dirty(index);
    }

    /// Whether control points were edited since segments were last refreshed.
    pub fn has_pending_edits(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Refreshes every segment attached to an edited control point, and the total length.
    ///
    /// Lengths and samples are stale between a point edit and the next commit.
    pub fn commit(&mut self) {
        if self.dirty.is_empty() {
            return;
        }
        let mut touched = vec![false; self.points.len()];
        for &index in &self.dirty {
            touched[index] = true;
        }
        let mut refreshed = 0;
        for segment in &mut self.segments {
            if touched[segment.start()] || touched[segment.end()] {
                segment.rebuild_samples(&self.points);
                refreshed += 1;
            }
        }
        debug!(
            "Committed edits to {} points ({} segments resampled)",
            self.dirty.len(),
            refreshed
        );
        self.dirty.clear();
        self.update_lengths();
    }

    /// Rebuilds the segment list from scratch.
    pub fn rebuild_segments(&mut self) {
        let n = self.points.len();
        let count = segment_count_for(n, self.auto_connect);
        let segments = (0..count)
            .map(|i| CurveSegment::new(i, (i + 1) % n, self.sample_count, &self.points))
            .collect();
        self.segments = segments;
        self.dirty.clear();
        self.update_lengths();
        debug!(
            "Rebuilt {} segments from {} points (length {:.3})",
            count, n, self.total_length
        );
    }

    /// Updates the segment list after the point at `at_index` was appended,
    /// only building the segments that changed.
    ///
    /// Falls back to a full rebuild for any other kind of edit.
    pub fn rebuild_segments_incremental(&mut self, at_index: usize) {
        let n = self.points.len();
        let expected = segment_count_for(n.saturating_sub(1), self.auto_connect);
        if n < 2 || at_index + 1 != n || self.segments.len() != expected {
            return self.rebuild_segments();
        }

        if self.auto_connect && expected > 0 {
            // The old closing segment ended at the first point rather than the new one
            self.segments.pop();
        }
        let segment = CurveSegment::new(n - 2, n - 1, self.sample_count, &self.points);
        self.segments.push(segment);
        if self.auto_connect {
            let closing = CurveSegment::new(n - 1, 0, self.sample_count, &self.points);
            self.segments.push(closing);
        }
        self.update_lengths();
        trace!("Appended point {} ({} segments)", at_index, self.segments.len());
    }

    /// Resamples every segment.
    pub fn force_update_all(&mut self) {
        for segment in &mut self.segments {
            segment.rebuild_samples(&self.points);
        }
        self.dirty.clear();
        self.update_lengths();
    }

    /// Resamples a single segment.
    pub fn force_update_one(&mut self, segment: usize) {
        self.segments[segment].rebuild_samples(&self.points);
        self.update_lengths();
    }

    /// Resamples a segment along with its neighbours on either side.
    pub fn force_update_around(&mut self, segment: usize) {
        let neighbours = [
            self.next_segment_index(segment, Direction::Backward),
            Some(segment),
            self.next_segment_index(segment, Direction::Forward),
        ];
        let mut updated: SmallVec<[usize; 3]> = SmallVec::new();
        for index in neighbours.into_iter().flatten() {
            if !updated.contains(&index) {
                self.segments[index].rebuild_samples(&self.points);
                updated.push(index);
            }
        }
        self.update_lengths();
    }

    /// The segment which follows `current` in `direction`.
    ///
    /// Closed curves wrap around; on open curves `None` means there is no further segment.
    pub fn next_segment_index(&self, current: usize, direction: Direction) -> Option<usize> {
        let count = self.segments.len();
        if count == 0 {
            return None;
        }
        match direction {
            Direction::Forward if current + 1 < count => Some(current + 1),
            Direction::Backward if current > 0 => Some(current - 1),
            Direction::Forward if self.auto_connect => Some(0),
            Direction::Backward if self.auto_connect => Some(count - 1),
            _ => None,
        }
    }

    /// The cursor at which travel in `direction` begins.
    pub fn head(&self, direction: Direction) -> Cursor {
        match (direction, self.segments.last()) {
            (Direction::Backward, Some(last)) => {
                Cursor::new(self.segments.len() - 1, last.entry_sample(Direction::Backward))
            }
            _ => Cursor::default(),
        }
    }

    /// Travels a signed distance along the curve from `cursor`.
    ///
    /// Positive distances travel towards the end of the curve. Any offset of
    /// the cursor from its sample is folded into the distance before stepping,
    /// which also handles travel that reverses direction.
    pub fn resolve_distance(&self, cursor: Cursor, distance: f64) -> Traversal {
        let mut traversal = Traversal {
            cursor,
            crossed: SmallVec::new(),
            reached_end: false,
        };
        if self.segments.is_empty() {
            warn!("Cannot travel along a curve with fewer than two points");
            traversal.reached_end = true;
            return traversal;
        }
        debug_assert!(
            cursor.segment < self.segments.len()
                && self.segments[cursor.segment].within_segment(cursor.sample),
            "cursor {:?} is not on the curve",
            cursor
        );
        // A closed loop of zero length would wrap forever
        if distance == 0.0 || (self.auto_connect && self.total_length <= DISTANCE_EPSILON) {
            return traversal;
        }

        let target = self.signed_offset(&cursor) + distance;
        let direction = Direction::of(target);
        let mut remaining = target.abs();
        let (mut segment, mut sample) = (cursor.segment, cursor.sample);

        traversal.cursor = loop {
            let current = &self.segments[segment];
            sample = current.find_sample_index_for_distance(sample, &mut remaining, direction);

            if !current.is_boundary(sample, direction) {
                let offset = match current.step_direction(sample, direction) {
                    Some(dir) if remaining > DISTANCE_EPSILON => dir * remaining,
                    _ => Vector3d::zero(),
                };
                break Cursor {
                    segment,
                    sample,
                    offset,
                    towards: direction,
                };
            }

            match self.next_segment_index(segment, direction) {
                Some(next) => {
                    segment = next;
                    sample = self.segments[next].entry_sample(direction);
                    traversal.crossed.push(next);
                    if remaining <= DISTANCE_EPSILON {
                        break Cursor::new(segment, sample);
                    }
                }
                None => {
                    traversal.reached_end = true;
                    break Cursor::new(segment, sample);
                }
            }
        };

        trace!(
            "Travelled {:.4} to segment {} sample {} ({} crossings)",
            distance,
            traversal.cursor.segment,
            traversal.cursor.sample,
            traversal.crossed.len()
        );
        traversal
    }

    /// The world position of a cursor.
    pub fn position_at(&self, cursor: &Cursor) -> Point3d {
        self.segments[cursor.segment].sample(cursor.sample) + cursor.offset
    }

    /// The bezier parameter of a cursor within its segment.
    pub fn parameter_at(&self, cursor: &Cursor) -> f64 {
        let offset = self.signed_offset(cursor);
        self.segments[cursor.segment].parameter_at(cursor.sample, offset)
    }

    /// The unit tangent of the curve at a cursor, pointing towards the end of the curve.
    pub fn tangent_at(&self, cursor: &Cursor) -> Option<Vector3d> {
        let t = self.parameter_at(cursor);
        self.segments[cursor.segment].tangent_at(t)
    }

    /// The distance from the head of the curve to a cursor.
    pub fn distance_along(&self, cursor: &Cursor) -> f64 {
        let segment = &self.segments[cursor.segment];
        self.segment_starts[cursor.segment]
            + segment.distance_at(cursor.sample)
            + self.signed_offset(cursor)
    }

    /// The position of a cursor in units of segments, normalised to [0, 1].
    ///
    /// Control point `i` sits at `i / segment_count` regardless of segment lengths.
    pub fn node_position(&self, cursor: &Cursor) -> f64 {
        let count = self.segments.len();
        if count == 0 {
            return 0.0;
        }
        let segment = &self.segments[cursor.segment];
        let fraction = if segment.length() > DISTANCE_EPSILON {
            let along = segment.distance_at(cursor.sample) + self.signed_offset(cursor);
            (along / segment.length()).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (cursor.segment as f64 + fraction) / count as f64
    }

    /// The offset of a cursor from its sample, as a signed distance towards the end of the curve.
    fn signed_offset(&self, cursor: &Cursor) -> f64 {
        cursor.towards.sign() * cursor.offset.magnitude()
    }

    fn mark_dirty(&mut self, index: usize) {
        if !self.dirty.contains(&index) {
            self.dirty.push(index);
        }
    }

    fn update_lengths(&mut self) {
        self.segment_starts = self
            .segments
            .iter()
            .scan(0.0, |acc, segment| {
                let start = *acc;
                *acc += segment.length();
                Some(start)
            })
            .collect();
        self.total_length = self.segments.iter().map(CurveSegment::length).sum();
    }
}

/// The number of segments joining `points` control points.
fn segment_count_for(points: usize, auto_connect: bool) -> usize {
    match points {
        0 | 1 => 0,
        n if auto_connect => n,
        n => n - 1,
    }
}
