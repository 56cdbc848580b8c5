pub mod schema;

use anyhow::{bail, Context, Result};
use schema::{GoalSpec, Job};

use crate::error::SpringError;
use crate::presets::{PresetRecord, SpringMode};
use crate::secondary::{Chain, ConstantGoal, ControllerNode, GoalSignal, KeyframedGoal, SampledGoal};

pub fn load_from_yaml_str(s: &str) -> Result<Job> {
    let job: Job = serde_yaml::from_str(s)?;
    Ok(job)
}

pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Job> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path).with_context(|| format!("read job {}", path.display()))?;
    load_from_yaml_str(&data).with_context(|| format!("parse job {}", path.display()))
}

impl Job {
    /// Shared parameters and decay, whatever the chain length.
    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;
        if !(self.decay.is_finite() && self.decay > 0.0) {
            return Err(SpringError::invalid("decay", self.decay).into());
        }
        Ok(())
    }

    /// Chain in job order with locked channels and falloff applied.
    pub fn build_chain(&self) -> Result<Chain> {
        self.validate()?;
        let nodes = self
            .chain
            .iter()
            .map(|e| {
                let mut node = ControllerNode::new(e.id.as_str(), e.rest);
                node.params = e.params;
                if !e.locked.is_empty() {
                    let p = e.params.unwrap_or(self.params);
                    node.params = Some(p.with_axes(p.enabled_axes.without_locked(&e.locked)));
                }
                node
            })
            .collect();
        let chain = Chain::new(nodes)?;
        if self.decay == 1.0 {
            return Ok(chain);
        }
        Ok(chain.with_falloff(&self.params, self.decay)?)
    }

    pub fn goal(&self) -> Box<dyn GoalSignal> {
        match &self.goal {
            GoalSpec::Constant { value } => Box::new(ConstantGoal(*value)),
            GoalSpec::Keys { keys } => Box::new(KeyframedGoal::new(keys.clone())),
            GoalSpec::Samples { start, samples } => Box::new(SampledGoal::new(*start, samples.clone())),
        }
    }

    /// Take spring settings from a preset. Translation presets cannot be simulated here.
    pub fn apply_preset(&mut self, record: &PresetRecord) -> Result<()> {
        if record.spring_mode != SpringMode::Rotation {
            bail!("preset drives {:?}, only rotation springs are supported", record.spring_mode);
        }
        self.params = record.params;
        self.decay = record.decay;
        Ok(())
    }
}
