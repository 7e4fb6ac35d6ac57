//! Routing table as seen by an allocation pass.

use std::collections::BTreeMap;

use crate::domain::{DiscoveryNode, DiscoveryNodes, NodeId, ShardId, ShardRouting};

/// The shards currently placed on one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingNode {
    node_id: NodeId,
    node: Option<DiscoveryNode>,
    shards: Vec<ShardRouting>,
}

impl RoutingNode {
    pub fn new(node_id: NodeId, node: Option<DiscoveryNode>) -> Self {
        Self {
            node_id,
            node,
            shards: Vec::new(),
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// `None` when the node holding these shards has left the cluster.
    pub fn node(&self) -> Option<&DiscoveryNode> {
        self.node.as_ref()
    }

    pub fn shards(&self) -> &[ShardRouting] {
        &self.shards
    }

    /// The copy of `shard_id` on this node, if any.
    pub fn shard(&self, shard_id: &ShardId) -> Option<&ShardRouting> {
        self.shards.iter().find(|s| &s.shard_id == shard_id)
    }

    pub fn add(&mut self, shard: ShardRouting) {
        self.shards.push(shard);
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }
}

/// Node id to routing node, plus the shards waiting for a home.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingNodes {
    nodes: BTreeMap<NodeId, RoutingNode>,
    unassigned: Vec<ShardRouting>,
}

impl RoutingNodes {
    /// Every data node gets a routing node; assigned shards are placed on
    /// their current node even if it is no longer a member.
    pub fn new(discovery: &DiscoveryNodes, shards: Vec<ShardRouting>) -> Self {
        let mut nodes: BTreeMap<NodeId, RoutingNode> = discovery
            .data_nodes()
            .map(|node| (node.id().clone(), RoutingNode::new(node.id().clone(), Some(node.clone()))))
            .collect();
        let mut unassigned = Vec::new();

        for shard in shards {
            match shard.current_node.clone() {
                Some(node_id) => nodes
                    .entry(node_id.clone())
                    .or_insert_with(|| {
                        let node = discovery.get(node_id.as_str()).cloned();
                        RoutingNode::new(node_id, node)
                    })
                    .add(shard),
                None => unassigned.push(shard),
            }
        }

        Self { nodes, unassigned }
    }

    pub fn node(&self, node_id: &NodeId) -> Option<&RoutingNode> {
        self.nodes.get(node_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoutingNode> {
        self.nodes.values()
    }

    pub fn unassigned(&self) -> &[ShardRouting] {
        &self.unassigned
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
