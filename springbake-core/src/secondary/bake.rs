//! Whole-range batch bake of a chain.
//!
//! Two phases: simulate every frame into an in-memory [`BakeTable`], then hand
//! the finished table to a [`KeyframeWriter`]. A run that fails or is
//! cancelled never reaches the writer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};

use crate::error::{Result, SpringError};
use crate::export::{BakeTable, KeyframeWriter};
use super::chain::{Chain, ChainPropagator};
use super::frames::FrameRange;
use super::goal::GoalSignal;
use super::params::SpringParameters;

/// Shared flag that stops a bake at the next frame boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self { Self::default() }

    pub fn cancel(&self) { self.0.store(true, Ordering::Release); }

    pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::Acquire) }
}

#[derive(Debug, Clone)]
pub struct BakeRunner {
    propagator: ChainPropagator,
    cancel: Option<CancelToken>,
}

impl BakeRunner {
    pub fn new(params: SpringParameters) -> Self {
        Self { propagator: ChainPropagator::new(params), cancel: None }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn params(&self) -> &SpringParameters { self.propagator.params() }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Simulate `chain` over `range`, returning every sample.
    ///
    /// Node state is reset to rest at `range.start()` before the first frame.
    /// The first unstable sample aborts the run with the controller and frame.
    pub fn bake(&self, chain: &mut Chain, range: FrameRange, goal: &dyn GoalSignal) -> Result<BakeTable> {
        chain.validate(self.params())?;
        chain.reset();
        let step = self.params().frame_step;
        let started = Instant::now();
        debug!(
            "bake: {} controllers x {} frames ({}..={} step {})",
            chain.len(), range.sample_count(step), range.start(), range.end(), step
        );
        let mut table = BakeTable::new(range.start(), step, chain.ids());
        for frame in range.frames(step) {
            if self.is_cancelled() {
                debug!("bake cancelled before frame {frame}");
                return Err(SpringError::Cancelled { frame });
            }
            match self.propagator.advance(chain, frame, goal) {
                Ok(out) => table.push_frame(&out),
                Err(e) => {
                    if e.is_unstable() {
                        warn!("bake aborted: {e}");
                    }
                    return Err(e);
                }
            }
        }
        debug!("bake: {} samples in {:?}", table.frame_count() * chain.len(), started.elapsed());
        Ok(table)
    }

    /// Bake, then persist the complete table through `writer` in one call.
    pub fn bake_and_commit(
        &self,
        chain: &mut Chain,
        range: FrameRange,
        goal: &dyn GoalSignal,
        writer: &mut dyn KeyframeWriter,
    ) -> anyhow::Result<BakeTable> {
        let table = self.bake(chain, range, goal)?;
        if self.is_cancelled() {
            debug!("bake cancelled before commit");
            let frame = table.frames().last().unwrap_or(range.start());
            return Err(SpringError::Cancelled { frame }.into());
        }
        writer.write_table(&table)?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::MemoryWriter;
    use crate::orientation::Orientation;
    use crate::secondary::chain::ControllerNode;
    use crate::secondary::goal::ConstantGoal;

    fn chain() -> Chain {
        Chain::new(vec![
            ControllerNode::new("hair_01", Orientation::ZERO),
            ControllerNode::new("hair_02", Orientation::ZERO),
        ])
        .unwrap()
    }

    #[test]
    fn table_is_dense() {
        let runner = BakeRunner::new(SpringParameters::default());
        let table = runner
            .bake(&mut chain(), FrameRange::new(1, 24).unwrap(), &ConstantGoal(Orientation::splat(5.0)))
            .unwrap();
        assert_eq!(table.tracks.len(), 2);
        assert_eq!(table.frame_count(), 24);
        assert!(table.get(&"hair_02".into(), 24).is_some());
    }

    #[test]
    fn empty_chain_is_reported() {
        let runner = BakeRunner::new(SpringParameters::default());
        let err = runner
            .bake(&mut Chain::default(), FrameRange::new(1, 2).unwrap(), &ConstantGoal(Orientation::ZERO))
            .unwrap_err();
        assert_eq!(err, SpringError::EmptyChain);
    }

    #[test]
    fn cancelled_bake_writes_nothing() {
        let token = CancelToken::new();
        token.cancel();
        let runner = BakeRunner::new(SpringParameters::default()).with_cancel(token);
        let mut writer = MemoryWriter::default();
        let err = runner
            .bake_and_commit(&mut chain(), FrameRange::new(1, 10).unwrap(), &ConstantGoal(Orientation::ZERO), &mut writer)
            .unwrap_err();
        assert_eq!(err.downcast_ref::<SpringError>(), Some(&SpringError::Cancelled { frame: 1 }));
        assert_eq!(writer.writes, 0);
    }

    #[test]
    fn cancel_after_last_frame_still_skips_the_write() {
        let token = CancelToken::new();
        let flag = token.clone();
        let goal = move |frame: i64| -> Result<Orientation> {
            if frame == 10 {
                flag.cancel();
            }
            Ok(Orientation::splat(3.0))
        };
        let runner = BakeRunner::new(SpringParameters::default()).with_cancel(token);
        let mut writer = MemoryWriter::default();
        let err = runner
            .bake_and_commit(&mut chain(), FrameRange::new(1, 10).unwrap(), &goal, &mut writer)
            .unwrap_err();
        assert_eq!(err.downcast_ref::<SpringError>(), Some(&SpringError::Cancelled { frame: 10 }));
        assert_eq!(writer.writes, 0);
    }

    #[test]
    fn frame_step_samples_sparse_frames() {
        let mut p = SpringParameters::default();
        p.frame_step = 2;
        let table = BakeRunner::new(p)
            .bake(&mut chain(), FrameRange::new(0, 10).unwrap(), &ConstantGoal(Orientation::splat(1.0)))
            .unwrap();
        assert_eq!(table.frames().collect::<Vec<_>>(), vec![0, 2, 4, 6, 8, 10]);
    }
}
