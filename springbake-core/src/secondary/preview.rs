//! Live single-controller preview driven by host playback ticks.
//!
//! Only the root of a chain is previewed. Velocity starts at zero on the
//! armed frame, so playback must begin there and advance one step per tick;
//! any other tick is refused with [`SpringError::PlaybackDiscontinuity`]
//! instead of silently producing a different trajectory.

use log::{debug, warn};

use crate::error::{Result, SpringError};
use crate::orientation::Orientation;
use super::chain::{Chain, ChainPropagator};
use super::frames::FrameRange;
use super::goal::GoalSignal;
use super::params::SpringParameters;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Idle,
    /// Waiting for the first tick at `start`.
    Armed { start: i64, end: i64 },
    /// Last simulated `frame`.
    Running { frame: i64, end: i64 },
    /// Went unstable at `frame`; re-arm to continue.
    Frozen { frame: i64 },
}

#[derive(Debug)]
pub struct PreviewRunner {
    state: PreviewState,
    chain: Option<Chain>,
    propagator: ChainPropagator,
}

impl Default for PreviewRunner {
    fn default() -> Self { Self::new() }
}

impl PreviewRunner {
    pub fn new() -> Self {
        Self {
            state: PreviewState::Idle,
            chain: None,
            propagator: ChainPropagator::new(SpringParameters::default()),
        }
    }

    pub fn state(&self) -> PreviewState { self.state }

    /// Prepare a preview of `chain`'s root over `range`. Any previous run is discarded.
    pub fn arm(&mut self, chain: &Chain, params: SpringParameters, range: FrameRange) -> Result<()> {
        chain.validate(&params)?;
        let mut root = chain.root_only().ok_or(SpringError::EmptyChain)?;
        root.reset();
        self.chain = Some(root);
        self.propagator = ChainPropagator::new(params);
        self.state = PreviewState::Armed { start: range.start(), end: range.end() };
        debug!("preview armed on frames {}..={}", range.start(), range.end());
        Ok(())
    }

    /// Simulate the host's current `frame` and return the orientation to display.
    pub fn tick(&mut self, frame: i64, goal: &dyn GoalSignal) -> Result<Orientation> {
        let (expected, end) = match self.state {
            PreviewState::Armed { start, end } => (start, end),
            PreviewState::Running { frame: last, end } => (last.saturating_add(self.propagator.params().frame_step), end),
            PreviewState::Idle | PreviewState::Frozen { .. } => return Err(SpringError::PreviewNotArmed),
        };
        if frame != expected {
            return Err(SpringError::PlaybackDiscontinuity { expected, got: frame });
        }
        let chain = self.chain.as_mut().ok_or(SpringError::PreviewNotArmed)?;
        let out = match self.propagator.advance(chain, frame, goal) {
            Ok(out) => out,
            Err(e) => {
                if e.is_unstable() {
                    warn!("preview froze at frame {frame}: {e}");
                    self.chain = None;
                    self.state = PreviewState::Frozen { frame };
                }
                return Err(e);
            }
        };
        if frame.checked_add(self.propagator.params().frame_step).map_or(true, |next| next > end) {
            debug!("preview reached frame {end}");
            self.stop();
        } else {
            self.state = PreviewState::Running { frame, end };
        }
        Ok(out[0])
    }

    /// Drop all transient state. Nothing is ever persisted by a preview.
    pub fn stop(&mut self) {
        self.chain = None;
        self.state = PreviewState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secondary::chain::ControllerNode;
    use crate::secondary::goal::ConstantGoal;

    fn chain() -> Chain {
        Chain::new(vec![
            ControllerNode::new("ear_01", Orientation::ZERO),
            ControllerNode::new("ear_02", Orientation::ZERO),
        ])
        .unwrap()
    }

    #[test]
    fn runs_from_armed_frame_to_end() {
        let mut p = PreviewRunner::new();
        p.arm(&chain(), SpringParameters::default(), FrameRange::new(1, 3).unwrap()).unwrap();
        let goal = ConstantGoal(Orientation::splat(10.0));
        assert!(p.tick(1, &goal).unwrap().0.x > 0.0);
        assert_eq!(p.state(), PreviewState::Running { frame: 1, end: 3 });
        p.tick(2, &goal).unwrap();
        p.tick(3, &goal).unwrap();
        assert_eq!(p.state(), PreviewState::Idle);
        assert_eq!(p.tick(4, &goal), Err(SpringError::PreviewNotArmed));
    }

    #[test]
    fn refuses_to_start_mid_sequence() {
        let mut p = PreviewRunner::new();
        p.arm(&chain(), SpringParameters::default(), FrameRange::new(1, 10).unwrap()).unwrap();
        let goal = ConstantGoal(Orientation::splat(10.0));
        assert_eq!(p.tick(5, &goal), Err(SpringError::PlaybackDiscontinuity { expected: 1, got: 5 }));
        assert_eq!(p.state(), PreviewState::Armed { start: 1, end: 10 });
        p.tick(1, &goal).unwrap();
        assert_eq!(p.tick(3, &goal), Err(SpringError::PlaybackDiscontinuity { expected: 2, got: 3 }));
    }

    #[test]
    fn instability_freezes_until_rearmed() {
        let mut p = PreviewRunner::new();
        let range = FrameRange::new(1, 100).unwrap();
        p.arm(&chain(), SpringParameters::new(1000.0, 0.0, 1.0), range).unwrap();
        let goal = ConstantGoal(Orientation::splat(10.0));
        let frozen_at = (1..=100)
            .find_map(|f| match p.tick(f, &goal) {
                Err(SpringError::UnstableSimulation { frame, .. }) => Some(frame),
                _ => None,
            })
            .expect("diverges");
        assert_eq!(p.state(), PreviewState::Frozen { frame: frozen_at });
        assert_eq!(p.tick(frozen_at + 1, &goal), Err(SpringError::PreviewNotArmed));
        p.arm(&chain(), SpringParameters::default(), range).unwrap();
        assert!(p.tick(1, &goal).is_ok());
    }

    #[test]
    fn range_ending_at_the_last_frame_number() {
        let mut p = PreviewRunner::new();
        p.arm(&chain(), SpringParameters::default(), FrameRange::new(i64::MAX - 1, i64::MAX).unwrap()).unwrap();
        let goal = ConstantGoal(Orientation::splat(10.0));
        p.tick(i64::MAX - 1, &goal).unwrap();
        p.tick(i64::MAX, &goal).unwrap();
        assert_eq!(p.state(), PreviewState::Idle);
    }

    #[test]
    fn stop_discards_state() {
        let mut p = PreviewRunner::new();
        p.arm(&chain(), SpringParameters::default(), FrameRange::new(0, 5).unwrap()).unwrap();
        p.tick(0, &ConstantGoal(Orientation::ZERO)).unwrap();
        p.stop();
        assert_eq!(p.state(), PreviewState::Idle);
    }
}
