//! Euler orientation values in degrees.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A single rotation axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis { X, Y, Z }

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self { Axis::X => 0, Axis::Y => 1, Axis::Z => 2 }
    }

    pub fn letter(self) -> char {
        match self { Axis::X => 'x', Axis::Y => 'y', Axis::Z => 'z' }
    }
}

/// Three Euler angles in degrees. Also used for angular velocity (degrees per second).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Orientation(pub DVec3);

impl Orientation {
    pub const ZERO: Self = Self(DVec3::ZERO);

    pub fn new(x: f64, y: f64, z: f64) -> Self { Self(DVec3::new(x, y, z)) }

    pub fn splat(v: f64) -> Self { Self(DVec3::splat(v)) }

    pub fn axis(&self, axis: Axis) -> f64 { self.0[axis.index()] }

    pub fn set_axis(&mut self, axis: Axis, value: f64) { self.0[axis.index()] = value; }

    pub fn is_finite(&self) -> bool { self.0.is_finite() }

    /// Largest absolute component.
    pub fn max_abs(&self) -> f64 { self.0.abs().max_element() }

    /// Linear blend between two orientations, component-wise.
    pub fn lerp(self, other: Self, t: f64) -> Self { Self(self.0.lerp(other.0, t)) }
}

impl From<[f64; 3]> for Orientation {
    fn from(v: [f64; 3]) -> Self { Self(DVec3::from_array(v)) }
}

impl From<Orientation> for [f64; 3] {
    fn from(o: Orientation) -> Self { o.0.to_array() }
}

/// Shortest signed difference `to - from` in degrees, in [-180, 180).
pub fn wrapped_delta(from: f64, to: f64) -> f64 {
    (to - from + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_takes_the_short_way_round() {
        assert_eq!(wrapped_delta(0.0, 10.0), 10.0);
        assert_eq!(wrapped_delta(350.0, 10.0), 20.0);
        assert_eq!(wrapped_delta(10.0, 350.0), -20.0);
        assert_eq!(wrapped_delta(-170.0, 170.0), -20.0);
        assert_eq!(wrapped_delta(0.0, 180.0), -180.0);
    }

    #[test]
    fn axis_access() {
        let mut o = Orientation::new(1.0, 2.0, 3.0);
        assert_eq!(o.axis(Axis::Y), 2.0);
        o.set_axis(Axis::Z, -4.0);
        assert_eq!(o.max_abs(), 4.0);
        assert_eq!(<[f64; 3]>::from(o), [1.0, 2.0, -4.0]);
    }
}
