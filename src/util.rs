//! Miscellaneous utility structs.

use cgmath::num_traits::Float;
use serde::{Deserialize, Serialize};

/// A closed range `[min, max]` of the real number line.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T> Interval<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: PartialOrd + Copy> Interval<T> {
    pub fn contains(&self, value: T) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl<T: Float> Interval<T> {
    pub fn length(&self) -> T {
        self.max - self.min
    }

    /// Restricts a value to lie within the interval.
    pub fn clamp(&self, value: T) -> T {
        value.max(self.min).min(self.max)
    }

    /// The value a fraction `t` of the way from `min` to `max`.
    pub fn lerp(&self, t: T) -> T {
        self.min + t * self.length()
    }

    /// The fraction of the way from `min` to `max` at which `value` lies.
    pub fn inv_lerp(&self, value: T) -> T {
        (value - self.min) / self.length()
    }
}
