use serde::{Deserialize, Serialize};

use crate::orientation::{Axis, Orientation};
use crate::secondary::{FrameRange, SpringParameters};

/// One bake or preview request, as the host tool would hand it over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    pub range: FrameRange,
    #[serde(default)]
    pub params: SpringParameters,
    /// Stiffness falloff per link below the root. 1.0 keeps links identical.
    #[serde(default = "default_decay")]
    pub decay: f64,
    /// Root first, in selection order.
    pub chain: Vec<ChainEntry>,
    pub goal: GoalSpec,
}

fn default_decay() -> f64 { 1.0 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEntry {
    pub id: String,
    #[serde(default)]
    pub rest: Orientation,
    /// Host channels that cannot be keyed; the spring skips them.
    #[serde(default)]
    pub locked: Vec<Axis>,
    #[serde(default)]
    pub params: Option<SpringParameters>,
}

/// Root goal as sampled from the driving locator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GoalSpec {
    Constant { value: Orientation },
    Keys { keys: Vec<(i64, Orientation)> },
    Samples { start: i64, samples: Vec<Orientation> },
}
