//! Controller chains and root-to-tip propagation.

use std::collections::HashSet;

use log::trace;

use crate::error::{Result, SpringError};
use crate::orientation::Orientation;
use crate::rig::ControllerId;
use super::goal::GoalSignal;
use super::integrator::{self, SpringState};
use super::params::SpringParameters;

/// One link of a chain and its transient simulation state.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerNode {
    pub id: ControllerId,
    /// Controller orientation when the run starts.
    pub rest: Orientation,
    /// Overrides the chain's shared parameters for this link only.
    pub params: Option<SpringParameters>,
    state: SpringState,
}

impl ControllerNode {
    pub fn new(id: impl Into<ControllerId>, rest: Orientation) -> Self {
        Self { id: id.into(), rest, params: None, state: SpringState::at_rest(rest) }
    }

    pub fn with_params(mut self, params: SpringParameters) -> Self {
        self.params = Some(params);
        self
    }

    pub fn state(&self) -> &SpringState { &self.state }

    pub fn reset(&mut self) { self.state = SpringState::at_rest(self.rest); }

    fn effective<'a>(&'a self, shared: &'a SpringParameters) -> &'a SpringParameters {
        self.params.as_ref().unwrap_or(shared)
    }
}

/// Controllers ordered root to tip, in the order the artist selected them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chain {
    nodes: Vec<ControllerNode>,
}

impl Chain {
    pub fn new(nodes: Vec<ControllerNode>) -> Result<Self> {
        let mut seen = HashSet::new();
        for n in &nodes {
            if !seen.insert(n.id.clone()) {
                return Err(SpringError::invalid("chain", format!("duplicate controller `{}`", n.id)));
            }
        }
        Ok(Self { nodes })
    }

    pub fn len(&self) -> usize { self.nodes.len() }

    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    pub fn nodes(&self) -> &[ControllerNode] { &self.nodes }

    pub fn root(&self) -> Option<&ControllerNode> { self.nodes.first() }

    pub fn ids(&self) -> impl Iterator<Item = &ControllerId> { self.nodes.iter().map(|n| &n.id) }

    /// Replace one link's parameters.
    pub fn set_params(&mut self, id: &ControllerId, params: SpringParameters) -> Result<()> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| &n.id == id)
            .ok_or_else(|| SpringError::invalid("chain", format!("unknown controller `{id}`")))?;
        node.params = Some(params);
        Ok(())
    }

    /// Give every non-root link its own parameters, stiffness scaled by
    /// `decay` per step away from the root.
    pub fn with_falloff(mut self, shared: &SpringParameters, decay: f64) -> Result<Self> {
        for (depth, node) in self.nodes.iter_mut().enumerate().skip(1) {
            let base = *node.effective(shared);
            node.params = Some(base.falloff(decay, depth)?);
        }
        Ok(self)
    }

    /// Check the chain can be simulated with `shared` as the default parameters.
    pub fn validate(&self, shared: &SpringParameters) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(SpringError::EmptyChain);
        }
        for node in &self.nodes {
            let p = node.effective(shared);
            p.validate()?;
            if p.enabled_axes.is_empty() {
                return Err(SpringError::invalid("enabled_axes", format!("no axis enabled on `{}`", node.id)));
            }
            if p.frame_step != shared.frame_step {
                return Err(SpringError::invalid("frame_step", format!("`{}` differs from the chain", node.id)));
            }
        }
        Ok(())
    }

    /// Back to rest orientation and zero velocity on every link.
    pub fn reset(&mut self) {
        for n in &mut self.nodes { n.reset(); }
    }

    /// Keep only the root link.
    pub fn root_only(&self) -> Option<Chain> {
        self.root().map(|r| Chain { nodes: vec![r.clone()] })
    }
}

/// Applies the integrator to each link of a chain for one frame.
#[derive(Debug, Clone, Copy)]
pub struct ChainPropagator {
    shared: SpringParameters,
}

impl ChainPropagator {
    pub fn new(shared: SpringParameters) -> Self { Self { shared } }

    pub fn params(&self) -> &SpringParameters { &self.shared }

    /// Advance every link by one frame, root first.
    ///
    /// The root springs toward `goal` at `frame`; each later link springs
    /// toward its parent's orientation computed for this same frame. Node
    /// state is only updated once every link produced a stable result, so a
    /// failed frame leaves the previous frame's state intact.
    pub fn advance(&self, chain: &mut Chain, frame: i64, goal: &dyn GoalSignal) -> Result<Vec<Orientation>> {
        if chain.is_empty() {
            return Err(SpringError::EmptyChain);
        }
        let mut target = goal.sample(frame)?;
        let mut next = Vec::with_capacity(chain.len());
        for node in &chain.nodes {
            let params = node.effective(&self.shared);
            let state = integrator::step(&node.state, target, params);
            if !state.is_stable(params) {
                return Err(SpringError::UnstableSimulation {
                    controller: node.id.to_string(),
                    frame,
                });
            }
            target = state.orientation;
            next.push(state);
        }
        trace!("frame {frame}: advanced {} links", next.len());
        for (node, state) in chain.nodes.iter_mut().zip(&next) {
            node.state = *state;
        }
        Ok(next.into_iter().map(|s| s.orientation).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secondary::goal::ConstantGoal;

    fn three_links() -> Chain {
        Chain::new(vec![
            ControllerNode::new("tail_01", Orientation::ZERO),
            ControllerNode::new("tail_02", Orientation::ZERO),
            ControllerNode::new("tail_03", Orientation::ZERO),
        ])
        .unwrap()
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Chain::new(vec![
            ControllerNode::new("a", Orientation::ZERO),
            ControllerNode::new("a", Orientation::ZERO),
        ])
        .unwrap_err();
        assert!(matches!(err, SpringError::InvalidParameters { field: "chain", .. }));
    }

    #[test]
    fn child_follows_parent_of_the_same_frame() {
        let p = SpringParameters::default();
        let mut chain = three_links();
        let prop = ChainPropagator::new(p);
        let out = prop.advance(&mut chain, 1, &ConstantGoal(Orientation::splat(10.0))).unwrap();
        // root moved on frame 1, so the second link already has a non-zero goal
        assert!(out[0].0.x > 0.0);
        assert!(out[1].0.x > 0.0);
        assert!(out[2].0.x > 0.0);
        assert!(out[1].0.x < out[0].0.x);
    }

    #[test]
    fn failed_frame_keeps_previous_state() {
        let mut chain = three_links();
        let prop = ChainPropagator::new(SpringParameters::default());
        prop.advance(&mut chain, 1, &ConstantGoal(Orientation::splat(10.0))).unwrap();
        let before = chain.clone();
        let missing = |frame: i64| -> Result<Orientation> { Err(SpringError::GoalUnavailable { frame }) };
        assert_eq!(prop.advance(&mut chain, 2, &missing), Err(SpringError::GoalUnavailable { frame: 2 }));
        assert_eq!(chain, before);
    }

    #[test]
    fn validate_rejects_empty_axes_and_empty_chain() {
        let p = SpringParameters::default();
        assert_eq!(Chain::default().validate(&p), Err(SpringError::EmptyChain));
        let bad = p.with_axes(crate::secondary::params::AxisMask::NONE);
        let err = three_links().validate(&bad).unwrap_err();
        assert!(matches!(err, SpringError::InvalidParameters { field: "enabled_axes", .. }));
    }

    #[test]
    fn falloff_leaves_root_on_shared_params() {
        let p = SpringParameters::default();
        let chain = three_links().with_falloff(&p, 0.5).unwrap();
        assert!(chain.nodes()[0].params.is_none());
        assert_eq!(chain.nodes()[2].params.unwrap().stiffness, p.stiffness * 0.25);
    }
}
