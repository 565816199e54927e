use super::curve::ParametricCurve3d;
use super::{Point3d, Vector3d};
use crate::util::Interval;
use cgmath::prelude::*;

/// A cubic bezier curve
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CubicBezier3d {
    points: [Point3d; 4],
}

impl CubicBezier3d {
    /// Creates a curve from its start anchor, the two handles and its end anchor.
    pub const fn new(points: &[Point3d; 4]) -> Self {
        Self { points: *points }
    }

    /// A straight line with handles placed at a third of the way along.
    pub fn line(start: Point3d, end: Point3d) -> Self {
        let s = start.to_vec();
        let e = end.to_vec();
        let ps = [s, s.lerp(e, 1. / 3.), s.lerp(e, 2. / 3.), e];
        Self {
            points: ps.map(Point3d::from_vec),
        }
    }

    pub fn points(&self) -> &[Point3d; 4] {
        &self.points
    }

    pub fn start(&self) -> Point3d {
        self.points[0]
    }

    pub fn end(&self) -> Point3d {
        self.points[3]
    }

    /// Splits the curve at `t` into two curves which join up.
    pub fn subdivide(&self, t: f64) -> [CubicBezier3d; 2] {
        let [p00, p01, p02, p03] = self.points.map(|x| x.to_vec());
        let p10 = p00.lerp(p01, t);
        let p11 = p01.lerp(p02, t);
        let p12 = p02.lerp(p03, t);
        let p20 = p10.lerp(p11, t);
        let p21 = p11.lerp(p12, t);
        let p30 = p20.lerp(p21, t);
        let curves = [[p00, p10, p20, p30], [p30, p21, p12, p03]];
        curves.map(|p| CubicBezier3d {
            points: p.map(Point3d::from_vec),
        })
    }
}

impl ParametricCurve3d for CubicBezier3d {
    fn sample(&self, t: f64) -> Point3d {
        let t1 = 1.0 - t;
        Point3d::from_vec(
            t1 * t1 * t1 * self.points[0].to_vec()
                + 3.0 * t1 * t1 * t * self.points[1].to_vec()
                + 3.0 * t1 * t * t * self.points[2].to_vec()
                + t * t * t * self.points[3].to_vec(),
        )
    }

    fn bounds(&self) -> Interval<f64> {
        Interval { min: 0.0, max: 1.0 }
    }

    fn sample_dt(&self, t: f64) -> Vector3d {
        let t1 = 1.0 - t;
        let [p0, p1, p2, p3] = self.points;
        3.0 * t1 * t1 * (p1 - p0) + 6.0 * t1 * t * (p2 - p1) + 3.0 * t * t * (p3 - p2)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng};

    fn random_point(rng: &mut impl Rng) -> Point3d {
        Point3d::new(
            rng.gen_range(-50.0..50.0),
            rng.gen_range(-50.0..50.0),
            rng.gen_range(-50.0..50.0),
        )
    }

    #[test]
    fn passes_through_anchors() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"Curves should end where they end");
        for _i in 0..100 {
            let points = [(); 4].map(|_| random_point(&mut rng));
            let curve = CubicBezier3d::new(&points);
            assert_approx_eq!(curve.sample(0.0).distance(points[0]), 0.0, 1e-9);
            assert_approx_eq!(curve.sample(1.0).distance(points[3]), 0.0, 1e-9);
        }
    }

    /// Falls back on the default numeric derivative.
    struct Numeric(CubicBezier3d);

    impl ParametricCurve3d for Numeric {
        fn sample(&self, t: f64) -> Point3d {
            self.0.sample(t)
        }

        fn bounds(&self) -> Interval<f64> {
            self.0.bounds()
        }
    }

    #[test]
    fn analytic_derivative_matches_numeric() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"Curves should end where they end");
        for _i in 0..50 {
            let curve = CubicBezier3d::new(&[(); 4].map(|_| random_point(&mut rng)));
            let t = rng.gen_range(0.05..0.95);
            let analytic = curve.sample_dt(t);
            let numeric = Numeric(curve).sample_dt(t);
            assert_approx_eq!((analytic - numeric).magnitude(), 0.0, 0.5);
        }
    }

    #[test]
    fn subdivide_joins_up() {
        let curve = CubicBezier3d::new(&[
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 4.0, 0.0),
            Point3d::new(5.0, 4.0, 2.0),
            Point3d::new(6.0, 0.0, 0.0),
        ]);
        let [a, b] = curve.subdivide(0.3);
        assert_approx_eq!(a.end().distance(curve.sample(0.3)), 0.0, 1e-9);
        assert_approx_eq!(b.start().distance(curve.sample(0.3)), 0.0, 1e-9);
        assert_approx_eq!(b.sample(0.5).distance(curve.sample(0.65)), 0.0, 1e-9);
    }
}
