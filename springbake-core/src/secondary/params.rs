//! Tuning values for one simulation run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpringError};
use crate::orientation::Axis;

/// Subset of {X, Y, Z} a controller springs on. Serialized as `"xyz"`, `"xz"`, `""`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AxisMask(u8);

impl AxisMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0b111);

    pub fn only(axis: Axis) -> Self { Self(1 << axis.index()) }

    pub fn contains(self, axis: Axis) -> bool { self.0 & (1 << axis.index()) != 0 }

    pub fn is_empty(self) -> bool { self.0 == 0 }

    pub fn with(self, axis: Axis) -> Self { Self(self.0 | (1 << axis.index())) }

    pub fn without(self, axis: Axis) -> Self { Self(self.0 & !(1 << axis.index())) }

    /// Drop the axes whose host channels are locked.
    pub fn without_locked(self, locked: &[Axis]) -> Self {
        locked.iter().fold(self, |m, a| m.without(*a))
    }

    pub fn iter(self) -> impl Iterator<Item = Axis> {
        Axis::ALL.into_iter().filter(move |a| self.contains(*a))
    }
}

impl Default for AxisMask {
    fn default() -> Self { Self::ALL }
}

impl fmt::Display for AxisMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for a in self.iter() { write!(f, "{}", a.letter())?; }
        Ok(())
    }
}

impl std::str::FromStr for AxisMask {
    type Err = SpringError;

    fn from_str(s: &str) -> Result<Self> {
        let mut mask = AxisMask::NONE;
        for c in s.chars() {
            let axis = match c.to_ascii_lowercase() {
                'x' => Axis::X,
                'y' => Axis::Y,
                'z' => Axis::Z,
                ',' | ' ' => continue,
                _ => return Err(SpringError::invalid("enabled_axes", s)),
            };
            mask = mask.with(axis);
        }
        Ok(mask)
    }
}

impl TryFrom<String> for AxisMask {
    type Error = SpringError;
    fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<AxisMask> for String {
    fn from(m: AxisMask) -> Self { m.to_string() }
}

/// Damped-oscillator tuning knobs. Not physical units.
///
/// Stability: the fixed-step scheme converges (or, undamped, holds its
/// amplitude) while `stiffness * dt^2 / mass <= 4 - 2 * damping * dt / mass`
/// and `damping * dt / mass <= 2`; see [`SpringParameters::is_convergent`].
/// Inside that region large single steps are fine. Outside it every
/// disturbance grows each step, and the run is reported as unstable once a
/// step turns further than [`MAX_STEP_DEGREES`](super::integrator::MAX_STEP_DEGREES).
/// Values are never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringParameters {
    /// Pull toward the goal.
    pub stiffness: f64,
    /// Velocity decay.
    pub damping: f64,
    /// Resistance to acceleration.
    pub mass: f64,
    pub enabled_axes: AxisMask,
    /// Host frames advanced per simulation sample.
    pub frame_step: i64,
    /// Simulation seconds per host frame.
    pub time_scale: f64,
}

impl Default for SpringParameters {
    fn default() -> Self {
        Self {
            stiffness: 50.0,
            damping: 10.0,
            mass: 1.0,
            enabled_axes: AxisMask::ALL,
            frame_step: 1,
            time_scale: 0.1,
        }
    }
}

impl SpringParameters {
    pub fn new(stiffness: f64, damping: f64, mass: f64) -> Self {
        Self { stiffness, damping, mass, ..Default::default() }
    }

    pub fn with_axes(mut self, axes: AxisMask) -> Self { self.enabled_axes = axes; self }

    pub fn with_time_scale(mut self, time_scale: f64) -> Self { self.time_scale = time_scale; self }

    /// Integration step in simulation seconds.
    pub fn dt(&self) -> f64 { self.frame_step as f64 * self.time_scale }

    /// Whether the fixed-step recurrence damps (or at worst preserves) any
    /// displacement, i.e. its amplification matrix has spectral radius <= 1.
    pub fn is_convergent(&self) -> bool {
        let dt = self.dt();
        let c = self.damping * dt / self.mass;
        let k = self.stiffness * dt * dt / self.mass;
        c <= 2.0 && k <= 4.0 - 2.0 * c
    }

    /// Reject values the integrator cannot run with, naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if !(self.stiffness.is_finite() && self.stiffness > 0.0) {
            return Err(SpringError::invalid("stiffness", self.stiffness));
        }
        if !(self.damping.is_finite() && self.damping >= 0.0) {
            return Err(SpringError::invalid("damping", self.damping));
        }
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(SpringError::invalid("mass", self.mass));
        }
        if self.frame_step < 1 {
            return Err(SpringError::invalid("frame_step", self.frame_step));
        }
        if !(self.time_scale.is_finite() && self.time_scale > 0.0) {
            return Err(SpringError::invalid("time_scale", self.time_scale));
        }
        Ok(())
    }

    /// Parameters for a link `depth` steps below the root: stiffness scaled by `decay^depth`.
    pub fn falloff(&self, decay: f64, depth: usize) -> Result<Self> {
        if !(decay.is_finite() && decay > 0.0) {
            return Err(SpringError::invalid("decay", decay));
        }
        let mut p = *self;
        p.stiffness *= decay.powi(depth as i32);
        Ok(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_mask_parses_and_prints() {
        let m: AxisMask = "XZ".parse().unwrap();
        assert!(m.contains(Axis::X) && !m.contains(Axis::Y) && m.contains(Axis::Z));
        assert_eq!(m.to_string(), "xz");
        assert_eq!("".parse::<AxisMask>().unwrap(), AxisMask::NONE);
        assert!("xw".parse::<AxisMask>().is_err());
        assert_eq!(AxisMask::ALL.without_locked(&[Axis::Y]).to_string(), "xz");
    }

    #[test]
    fn validate_names_the_offending_field() {
        let err = SpringParameters::new(0.0, 1.0, 1.0).validate().unwrap_err();
        assert!(matches!(err, SpringError::InvalidParameters { field: "stiffness", .. }));
        let err = SpringParameters::new(1.0, -0.5, 1.0).validate().unwrap_err();
        assert!(matches!(err, SpringError::InvalidParameters { field: "damping", .. }));
        let err = SpringParameters::new(1.0, 0.0, 0.0).validate().unwrap_err();
        assert!(matches!(err, SpringError::InvalidParameters { field: "mass", .. }));
        assert!(SpringParameters::new(1.0, 0.0, 1.0).validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_time_step() {
        let mut p = SpringParameters::default();
        p.frame_step = 0;
        assert!(matches!(p.validate(), Err(SpringError::InvalidParameters { field: "frame_step", .. })));
        for scale in [0.0, -0.1, f64::NAN] {
            let err = SpringParameters::default().with_time_scale(scale).validate().unwrap_err();
            assert!(matches!(err, SpringError::InvalidParameters { field: "time_scale", .. }));
        }
    }

    #[test]
    fn convergence_region_follows_time_step() {
        assert!(SpringParameters::new(50.0, 10.0, 1.0).is_convergent());
        assert!(!SpringParameters::new(50.0, 10.0, 1.0).with_time_scale(1.0).is_convergent());
        assert!(SpringParameters::new(150.0, 1.0, 1.0).is_convergent());
        assert!(!SpringParameters::new(1000.0, 0.0, 1.0).is_convergent());
        // undamped keeps its amplitude
        assert!(SpringParameters::new(300.0, 0.0, 1.0).is_convergent());
        assert_eq!(SpringParameters::default().with_time_scale(0.25).dt(), 0.25);
    }

    #[test]
    fn falloff_scales_stiffness_per_depth() {
        let p = SpringParameters::new(10.0, 2.0, 1.0);
        assert_eq!(p.falloff(1.0, 3).unwrap(), p);
        assert_eq!(p.falloff(0.5, 2).unwrap().stiffness, 2.5);
        assert_eq!(p.falloff(0.5, 2).unwrap().damping, 2.0);
        assert!(p.falloff(0.0, 1).is_err());
    }

    #[test]
    fn yaml_fills_missing_fields_with_defaults() {
        let p: SpringParameters = serde_yaml::from_str("stiffness: 20\nenabled_axes: xy\n").unwrap();
        assert_eq!(p.stiffness, 20.0);
        assert_eq!(p.damping, 10.0);
        assert_eq!(p.enabled_axes.to_string(), "xy");
    }
}
