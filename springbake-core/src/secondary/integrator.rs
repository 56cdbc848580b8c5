//! Fixed-step damped oscillator, one axis at a time.
//!
//! Per enabled axis, with `d` the wrapped displacement toward the goal:
//!
//! ```text
//! a  = (stiffness * d - damping * v) / mass
//! v' = v + a * dt
//! o' = o + v' * dt
//! ```
//!
//! There is no sub-stepping. Non-finite or runaway values are not masked
//! here; callers check [`SpringState::is_stable`] and report.
//!
//! The force uses the wrapped displacement, which is bounded by half a turn,
//! so a diverging run does not overflow: it spins. For parameters outside the
//! convergent region that is caught by the per-step travel limit.

use crate::orientation::{wrapped_delta, Orientation};
use super::params::SpringParameters;

/// Largest rotation a single step may make on one axis when the parameters
/// amplify motion. Past a half turn the wrapped displacement aliases.
pub const MAX_STEP_DEGREES: f64 = 180.0;

/// Orientation plus angular velocity for one controller. Lives only for a run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpringState {
    pub orientation: Orientation,
    pub velocity: Orientation,
}

impl SpringState {
    /// Starting state: the controller's current orientation with zero velocity.
    pub fn at_rest(orientation: Orientation) -> Self {
        Self { orientation, velocity: Orientation::ZERO }
    }

    /// Finite, and when `params` amplify motion, no axis turned more than
    /// [`MAX_STEP_DEGREES`] in the last step.
    pub fn is_stable(&self, params: &SpringParameters) -> bool {
        if !(self.orientation.is_finite() && self.velocity.is_finite()) {
            return false;
        }
        params.is_convergent() || self.velocity.max_abs() * params.dt() <= MAX_STEP_DEGREES
    }
}

/// Advance `state` by one frame toward `goal`.
pub fn step(state: &SpringState, goal: Orientation, params: &SpringParameters) -> SpringState {
    let dt = params.dt();
    let mut next = SpringState { orientation: state.orientation, velocity: Orientation::ZERO };
    for axis in params.enabled_axes.iter() {
        let o = state.orientation.axis(axis);
        let v = state.velocity.axis(axis);
        let displacement = wrapped_delta(o, goal.axis(axis));
        let acceleration = (params.stiffness * displacement - params.damping * v) / params.mass;
        let v_next = v + acceleration * dt;
        next.velocity.set_axis(axis, v_next);
        next.orientation.set_axis(axis, o + v_next * dt);
    }
    next
}
