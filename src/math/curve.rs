use super::{Point3d, Vector3d};
use crate::util::Interval;

/// A curve through 3D space, parameterised over [ParametricCurve3d::bounds].
pub trait ParametricCurve3d {
    /// The point at parameter `t`.
    fn sample(&self, t: f64) -> Point3d;

    /// The range of `t` which spans the curve.
    fn bounds(&self) -> Interval<f64>;

    /// The derivative with respect to `t`.
    ///
    /// Defaults to a forward difference over a ten-thousandth of the bounds.
    fn sample_dt(&self, t: f64) -> Vector3d {
        let delta = self.bounds().length() * 0.0001;
        (self.sample(t + delta) - self.sample(t)) / delta
    }
}
