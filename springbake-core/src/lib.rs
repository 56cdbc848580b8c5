//! Rotational spring simulation and bake engine for animation controller chains.

pub mod error;
pub mod export;
pub mod job;
pub mod orientation;
pub mod presets;
pub mod rig;
pub mod secondary;

pub use error::SpringError;
pub use orientation::{Axis, Orientation};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
