//! Goal signals: the root's target orientation at a given frame.
//!
//! Implementations must be pure in the frame number. Bakes query ascending
//! frames, previews query one frame per host tick.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpringError};
use crate::orientation::Orientation;

pub trait GoalSignal {
    fn sample(&self, frame: i64) -> Result<Orientation>;
}

impl<F> GoalSignal for F
where
    F: Fn(i64) -> Result<Orientation>,
{
    fn sample(&self, frame: i64) -> Result<Orientation> { self(frame) }
}

/// Same orientation at every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantGoal(pub Orientation);

impl GoalSignal for ConstantGoal {
    fn sample(&self, _frame: i64) -> Result<Orientation> { Ok(self.0) }
}

/// Dense per-frame samples starting at `start`, usually the host's baked locator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledGoal {
    pub start: i64,
    pub samples: Vec<Orientation>,
}

impl SampledGoal {
    pub fn new(start: i64, samples: Vec<Orientation>) -> Self { Self { start, samples } }
}

impl GoalSignal for SampledGoal {
    fn sample(&self, frame: i64) -> Result<Orientation> {
        frame
            .checked_sub(self.start)
            .and_then(|offset| usize::try_from(offset).ok())
            .and_then(|i| self.samples.get(i).copied())
            .ok_or(SpringError::GoalUnavailable { frame })
    }
}

/// Sparse keys with linear interpolation between neighbours.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframedGoal {
    keys: Vec<(i64, Orientation)>,
}

impl KeyframedGoal {
    /// Keys are sorted by frame; a later key on a duplicate frame wins.
    pub fn new(mut keys: Vec<(i64, Orientation)>) -> Self {
        keys.sort_by_key(|(f, _)| *f);
        keys.reverse();
        keys.dedup_by_key(|(f, _)| *f);
        keys.reverse();
        Self { keys }
    }

    pub fn keys(&self) -> &[(i64, Orientation)] { &self.keys }
}

impl GoalSignal for KeyframedGoal {
    fn sample(&self, frame: i64) -> Result<Orientation> {
        let unavailable = SpringError::GoalUnavailable { frame };
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(f), Some(l)) => (f.0, l.0),
            _ => return Err(unavailable),
        };
        if frame < first || frame > last {
            return Err(unavailable);
        }
        match self.keys.binary_search_by_key(&frame, |(f, _)| *f) {
            Ok(i) => Ok(self.keys[i].1),
            Err(i) => {
                let (f0, a) = self.keys[i - 1];
                let (f1, b) = self.keys[i];
                let t = (frame as f64 - f0 as f64) / (f1 as f64 - f0 as f64);
                Ok(a.lerp(b, t))
            }
        }
    }
}
