//! Cubic polynomials, used to interpolate keyed scalar values.

use serde::{Deserialize, Serialize};

/// A cubic over a span `[x0, x0 + width]`, stored in powers of the
/// normalised input `s = (x - x0) / width`.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct CubicFn {
    /// Coefficients of `s^3, s^2, s, 1`.
    coeffs: [f64; 4],
    x0: f64,
    width: f64,
}

impl CubicFn {
    pub const fn constant(y: f64) -> Self {
        Self {
            coeffs: [0.0, 0.0, 0.0, y],
            x0: 0.0,
            width: 1.0,
        }
    }

    /// Fits the hermite cubic which passes through `(x1, y1)` and `(x2, y2)`
    /// with the slopes `dydx1` and `dydx2` at either end.
    ///
    /// A zero-width span degenerates to the constant `y1`.
    pub fn fit(x1: f64, y1: f64, dydx1: f64, x2: f64, y2: f64, dydx2: f64) -> Self {
        let width = x2 - x1;
        if width.abs() < f64::EPSILON {
            return Self::constant(y1);
        }
        // Slopes with respect to s
        let (m1, m2) = (dydx1 * width, dydx2 * width);
        Self {
            coeffs: [
                2.0 * (y1 - y2) + m1 + m2,
                3.0 * (y2 - y1) - 2.0 * m1 - m2,
                m1,
                y1,
            ],
            x0: x1,
            width,
        }
    }

    pub fn y(&self, x: f64) -> f64 {
        let [a, b, c, d] = self.coeffs;
        let s = self.normalise(x);
        ((a * s + b) * s + c) * s + d
    }

    pub fn dy(&self, x: f64) -> f64 {
        let [a, b, c, _] = self.coeffs;
        let s = self.normalise(x);
        ((3.0 * a * s + 2.0 * b) * s + c) / self.width
    }

    pub fn y_and_dy(&self, x: f64) -> (f64, f64) {
        (self.y(x), self.dy(x))
    }

    fn normalise(&self, x: f64) -> f64 {
        (x - self.x0) / self.width
    }
}
