use serde::{Deserialize, Serialize};

use crate::error::{Result, SpringError};

/// Inclusive host frame range, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct FrameRange {
    start: i64,
    end: i64,
}

#[derive(Deserialize)]
struct RawRange { start: i64, end: i64 }

impl TryFrom<RawRange> for FrameRange {
    type Error = SpringError;
    fn try_from(r: RawRange) -> Result<Self> { FrameRange::new(r.start, r.end) }
}

impl FrameRange {
    pub fn new(start: i64, end: i64) -> Result<Self> {
        if start > end {
            return Err(SpringError::InvalidFrameRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i64 { self.start }

    pub fn end(&self) -> i64 { self.end }

    /// Sampled frames, ascending, `step` apart starting at `start`.
    pub fn frames(&self, step: i64) -> impl Iterator<Item = i64> {
        let step = step.max(1) as usize;
        (self.start..=self.end).step_by(step)
    }

    /// Number of sampled frames for `step`.
    pub fn sample_count(&self, step: i64) -> usize {
        let span = self.end.abs_diff(self.start) / step.max(1).unsigned_abs();
        usize::try_from(span).unwrap_or(usize::MAX).saturating_add(1)
    }
}
