//! Mathematical structs and functions.

use cgmath::{Point3, Quaternion, Vector3};
pub use bezier::CubicBezier3d;
pub use cubic::CubicFn;
pub use curve::ParametricCurve3d;
pub use util::*;

mod bezier;
mod cubic;
mod curve;
mod util;

/// A 3D point
pub type Point3d = Point3<f64>;

/// A 3D vector
pub type Vector3d = Vector3<f64>;

/// A rotation in 3D space
pub type Quat = Quaternion<f64>;
