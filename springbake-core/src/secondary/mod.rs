//! Secondary motion: rotational springs on controller chains.

pub mod bake;
pub mod chain;
pub mod frames;
pub mod goal;
pub mod integrator;
pub mod params;
pub mod preview;

pub use bake::{BakeRunner, CancelToken};
pub use chain::{Chain, ChainPropagator, ControllerNode};
pub use frames::FrameRange;
pub use goal::{ConstantGoal, GoalSignal, KeyframedGoal, SampledGoal};
pub use integrator::{step, SpringState};
pub use params::{AxisMask, SpringParameters};
pub use preview::{PreviewRunner, PreviewState};
