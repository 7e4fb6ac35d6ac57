//! RoutingAllocation - the per-pass context handed to every decider.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use super::routing::RoutingNodes;
use crate::domain::{Decision, DecisionKind, DiscoveryNodes, NodeId, PassId, ShardId};

/// State of one allocation pass.
///
/// A context belongs to a single pass and is not shared between concurrently
/// running passes. Deciders only read it.
#[derive(Debug, Clone)]
pub struct RoutingAllocation {
    pass_id: PassId,
    nodes: Arc<DiscoveryNodes>,
    routing_nodes: RoutingNodes,
    debug_decision: bool,
    ignored_shard_to_nodes: HashMap<ShardId, HashSet<NodeId>>,
}

impl RoutingAllocation {
    pub fn new(pass_id: PassId, nodes: Arc<DiscoveryNodes>, routing_nodes: RoutingNodes) -> Self {
        Self {
            pass_id,
            nodes,
            routing_nodes,
            debug_decision: false,
            ignored_shard_to_nodes: HashMap::new(),
        }
    }

    pub fn pass_id(&self) -> PassId {
        self.pass_id
    }

    pub fn nodes(&self) -> &DiscoveryNodes {
        &self.nodes
    }

    pub fn routing_nodes(&self) -> &RoutingNodes {
        &self.routing_nodes
    }

    /// When set, composites collect every vote instead of stopping at the
    /// first `NO`, and `decision()` builds explained decisions.
    pub fn debug_decision(&self) -> bool {
        self.debug_decision
    }

    pub fn set_debug_decision(&mut self, debug: bool) {
        self.debug_decision = debug;
    }

    /// Exclude `node_id` as a target for `shard_id` for the rest of the pass.
    pub fn add_ignore_shard_for_node(&mut self, shard_id: ShardId, node_id: NodeId) {
        self.ignored_shard_to_nodes
            .entry(shard_id)
            .or_default()
            .insert(node_id);
    }

    pub fn should_ignore_shard_for_node(&self, shard_id: &ShardId, node_id: &NodeId) -> bool {
        self.ignored_shard_to_nodes
            .get(shard_id)
            .is_some_and(|nodes| nodes.contains(node_id))
    }

    /// Build a decision for a decider.
    ///
    /// Outside debug mode this is the shared constant for `kind` and the
    /// explanation is never formatted.
    pub fn decision(
        &self,
        kind: DecisionKind,
        label: &'static str,
        template: &'static str,
        args: &[&dyn fmt::Display],
    ) -> Decision {
        if self.debug_decision {
            Decision::single(kind, label, template, args)
        } else {
            Decision::of(kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DiscoveryNode;
    use ulid::Ulid;

    fn allocation() -> RoutingAllocation {
        let nodes = Arc::new(DiscoveryNodes::new(DiscoveryNode::new("n1")));
        let routing = RoutingNodes::new(&nodes, Vec::new());
        RoutingAllocation::new(PassId::from_ulid(Ulid::new()), nodes, routing)
    }

    #[test]
    fn skip_set_is_keyed_by_shard_and_node() {
        let mut allocation = allocation();
        let shard = ShardId::new("logs", 0);
        allocation.add_ignore_shard_for_node(shard.clone(), NodeId::new("n1"));

        assert!(allocation.should_ignore_shard_for_node(&shard, &NodeId::new("n1")));
        assert!(!allocation.should_ignore_shard_for_node(&shard, &NodeId::new("n2")));
        assert!(!allocation.should_ignore_shard_for_node(&ShardId::new("logs", 1), &NodeId::new("n1")));
    }

    #[test]
    fn decisions_are_only_explained_in_debug_mode() {
        let mut allocation = allocation();
        let plain = allocation.decision(DecisionKind::No, "test", "because {}", &[&"reasons"]);
        assert_eq!(plain, Decision::NO);

        allocation.set_debug_decision(true);
        let explained = allocation.decision(DecisionKind::No, "test", "because {}", &[&"reasons"]);
        assert_eq!(explained.label(), Some("test"));
        assert_eq!(explained.explanation().as_deref(), Some("because reasons"));
    }
}
