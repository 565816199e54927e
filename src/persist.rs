//! Saving and loading authored paths.

use crate::curve::{Curve, CurveAttributes};
use crate::error::{Error, Result};
use crate::math::{Point3d, Quat, Vector3d};
use crate::point::{ControlPoint, HandleKind, Pose, Transform};
use cgmath::prelude::*;
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// A saved control point, in the owning curve's local space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub position: [f64; 3],
    /// A quaternion as `[x, y, z, w]`.
    pub rotation: [f64; 4],
    /// Handle offsets, indexed by [HandleKind].
    pub handles: [[f64; 3]; 2],
    #[serde(default)]
    pub auto_smooth: bool,
}

impl PointRecord {
    /// Captures a control point's local pose and handles.
    pub fn from_point(point: &ControlPoint) -> Self {
        let pose = point.local_pose();
        let q = pose.rotation;
        let handle = |kind: HandleKind| -> [f64; 3] { point.handle(kind).local_position().into() };
        Self {
            position: pose.position.into(),
            rotation: [q.v.x, q.v.y, q.v.z, q.s],
            handles: [handle(HandleKind::Outgoing), handle(HandleKind::Incoming)],
            auto_smooth: point.is_auto_smooth(),
        }
    }

    /// Rebuilds the control point saved as the `index`th of its path.
    pub fn to_point(&self, index: usize) -> Result<ControlPoint> {
        let finite = self
            .position
            .iter()
            .chain(&self.rotation)
            .chain(self.handles.iter().flatten())
            .all(|x| x.is_finite());
        if !finite {
            return Err(Error::NonFinite { index });
        }
        let [x, y, z, w] = self.rotation;
        let rotation = Quat::new(w, x, y, z);
        if rotation.magnitude2() <= f64::EPSILON {
            return Err(Error::DegenerateRotation { index });
        }

        let local = Pose::new(Point3d::from(self.position), rotation.normalize());
        let mut point = ControlPoint::with_handles(
            local,
            Vector3d::from(self.handles[HandleKind::Outgoing.index()]),
            Vector3d::from(self.handles[HandleKind::Incoming.index()]),
        );
        point.set_auto_smooth(self.auto_smooth);
        Ok(point)
    }
}

/// A saved path: its topology, resolution and control points in traversal order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathRecord {
    #[serde(default)]
    pub auto_connect: bool,
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
    pub points: Vec<PointRecord>,
}

fn default_sample_count() -> usize {
    CurveAttributes::default().sample_count
}

impl PathRecord {
    /// Captures a curve's control points and settings.
    pub fn from_curve(curve: &Curve) -> Self {
        Self {
            auto_connect: curve.is_auto_connect(),
            sample_count: curve.sample_count(),
            points: curve.points().iter().map(PointRecord::from_point).collect(),
        }
    }

    /// Validates the control points.
    pub fn control_points(&self) -> Result<Vec<ControlPoint>> {
        self.points
            .iter()
            .enumerate()
            .map(|(index, record)| record.to_point(index))
            .collect()
    }

    /// Builds a curve placed at `transform`.
    pub fn into_curve(&self, transform: Transform) -> Result<Curve> {
        let attributes = CurveAttributes {
            auto_connect: self.auto_connect,
            sample_count: self.sample_count,
            transform,
        };
        let curve = Curve::with_points(&attributes, self.control_points()?);
        debug!(
            "Loaded a path of {} points (length {:.3})",
            self.points.len(),
            curve.total_length()
        );
        Ok(curve)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Writes the path as pretty-printed JSON.
    pub fn write(&self, writer: impl Write) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Reads a path written by [PathRecord::write].
    pub fn read(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}
