use crate::math::CubicFn;
use serde::{Deserialize, Serialize};

/// The number of trapezoids used when integrating a profile.
pub const PROFILE_INTEGRATION_STEPS: usize = 100;

/// A keyed value of a [SpeedProfile].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// The normalised input, usually in [0, 1].
    pub time: f64,
    /// The speed multiplier at `time`.
    pub value: f64,
    /// The slope arriving at the key.
    pub in_tangent: f64,
    /// The slope leaving the key.
    pub out_tangent: f64,
}

impl Keyframe {
    /// A key with flat tangents.
    pub const fn new(time: f64, value: f64) -> Self {
        Self::with_tangents(time, value, 0.0, 0.0)
    }

    pub const fn with_tangents(time: f64, value: f64, in_tangent: f64, out_tangent: f64) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

/// A user-authored 1D curve mapping a normalised input to a speed multiplier.
///
/// Consecutive keys are joined by cubic hermite spans; outside the keyed
/// range the nearest key's value holds. An empty profile evaluates to `1.0`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedProfile {
    keys: Vec<Keyframe>,
}

impl SpeedProfile {
    /// A flat profile over [0, 1].
    pub fn constant(value: f64) -> Self {
        Self {
            keys: vec![Keyframe::new(0.0, value), Keyframe::new(1.0, value)],
        }
    }

    /// A piecewise linear profile through `(time, value)` pairs.
    pub fn linear(points: &[(f64, f64)]) -> Self {
        let mut points = points.to_vec();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        let slope = |i: usize| {
            let ((x1, y1), (x2, y2)) = (points[i], points[i + 1]);
            if x2 - x1 > f64::EPSILON {
                (y2 - y1) / (x2 - x1)
            } else {
                0.0
            }
        };
        let n = points.len();
        let keys = (0..n)
            .map(|i| {
                let out_tangent = if i + 1 < n { slope(i) } else { 0.0 };
                let in_tangent = if i > 0 { slope(i - 1) } else { out_tangent };
                let out_tangent = if i + 1 < n { out_tangent } else { in_tangent };
                Keyframe::with_tangents(points[i].0, points[i].1, in_tangent, out_tangent)
            })
            .collect();
        Self { keys }
    }

    /// A profile through arbitrary keys, which are sorted by time.
    pub fn from_keys(mut keys: Vec<Keyframe>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// Gets the keys, sorted by time.
    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Changes the value of an existing key.
    pub fn set_value(&mut self, index: usize, value: f64) {
        self.keys[index].value = value;
    }

    /// Evaluates the profile at `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        let keys = match self.keys.as_slice() {
            [] => return 1.0,
            [only] => return only.value,
            keys => keys,
        };
        let idx = keys.partition_point(|k| k.time <= x);
        if idx == 0 {
            return keys[0].value;
        }
        if idx == keys.len() {
            return keys[idx - 1].value;
        }
        let (a, b) = (&keys[idx - 1], &keys[idx]);
        CubicFn::fit(a.time, a.value, a.out_tangent, b.time, b.value, b.in_tangent).y(x)
    }

    /// Integrates the profile over [0, 1] with the trapezoidal rule.
    pub fn integrate(&self, steps: usize) -> f64 {
        let steps = steps.max(1);
        let h = 1.0 / steps as f64;
        let interior: f64 = (1..steps).map(|i| self.evaluate(i as f64 * h)).sum();
        h * (0.5 * (self.evaluate(0.0) + self.evaluate(1.0)) + interior)
    }

    /// Resizes and re-times the keys so there is one per control point,
    /// evenly spaced over [0, 1].
    ///
    /// Closed curves get an extra key at `1.0` which mirrors the first, since
    /// both stand for the same control point. New keys have the value `1.0`.
    pub fn fit_to_nodes(&mut self, point_count: usize, closed: bool) {
        let key_count = point_count + closed as usize;
        if key_count < 2 {
            return;
        }
        self.keys.truncate(key_count);
        while self.keys.len() < key_count {
            self.keys.push(Keyframe::new(0.0, 1.0));
        }
        let interval = 1.0 / (key_count - 1) as f64;
        for (i, key) in self.keys.iter_mut().enumerate() {
            key.time = i as f64 * interval;
        }
        if closed {
            self.keys[key_count - 1].value = self.keys[0].value;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn empty_profile_is_identity() {
        let profile = SpeedProfile::default();
        assert_eq!(profile.evaluate(0.3), 1.0);
        assert_approx_eq!(profile.integrate(PROFILE_INTEGRATION_STEPS), 1.0);
    }

    #[test]
    fn constant_profile() {
        let profile = SpeedProfile::constant(2.5);
        for i in 0..=10 {
            assert_approx_eq!(profile.evaluate(i as f64 / 10.0), 2.5);
        }
        assert_approx_eq!(profile.evaluate(-1.0), 2.5);
        assert_approx_eq!(profile.integrate(PROFILE_INTEGRATION_STEPS), 2.5);
    }

    #[test]
    fn linear_profile() {
        let profile = SpeedProfile::linear(&[(1.0, 3.0), (0.0, 1.0), (0.5, 2.0)]);
        assert_approx_eq!(profile.evaluate(0.0), 1.0);
        assert_approx_eq!(profile.evaluate(0.25), 1.5);
        assert_approx_eq!(profile.evaluate(0.75), 2.5);
        assert_approx_eq!(profile.evaluate(2.0), 3.0);
        assert_approx_eq!(profile.integrate(PROFILE_INTEGRATION_STEPS), 2.0, 1e-9);
    }

    #[test]
    fn flat_tangents_ease_between_keys() {
        let profile = SpeedProfile::from_keys(vec![Keyframe::new(1.0, 2.0), Keyframe::new(0.0, 0.0)]);
        assert_approx_eq!(profile.evaluate(0.5), 1.0);
        assert!(profile.evaluate(0.1) < 0.2);
        assert!(profile.evaluate(0.9) > 1.8);
    }

    #[test]
    fn fit_to_nodes() {
        let mut profile = SpeedProfile::linear(&[(0.0, 4.0), (1.0, 2.0)]);
        profile.fit_to_nodes(4, true);
        let times = profile.keys().iter().map(|k| k.time).collect::<Vec<_>>();
        assert_eq!(profile.keys().len(), 5);
        for (i, time) in times.into_iter().enumerate() {
            assert_approx_eq!(time, i as f64 * 0.25);
        }
        assert_eq!(profile.keys()[0].value, 4.0);
        assert_eq!(profile.keys()[2].value, 1.0);
        assert_eq!(profile.keys()[4].value, 4.0);

        profile.fit_to_nodes(2, false);
        assert_eq!(profile.keys().len(), 2);
        assert_approx_eq!(profile.keys()[1].time, 1.0);
    }
}
