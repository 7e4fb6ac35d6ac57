//! Reference deciders shipped with the framework.

use serde::{Deserialize, Serialize};

use super::context::RoutingAllocation;
use super::decider::AllocationDecider;
use super::routing::RoutingNode;
use crate::domain::{Decision, DecisionKind, ShardRouting};

/// Which shards may be allocated at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnableAllocation {
    #[default]
    All,
    Primaries,
    NewPrimaries,
    None,
}

/// Cluster-wide switch for shard allocation.
#[derive(Debug, Clone)]
pub struct EnableAllocationDecider {
    mode: EnableAllocation,
}

impl EnableAllocationDecider {
    pub const NAME: &'static str = "enable";

    pub fn new(mode: EnableAllocation) -> Self {
        Self { mode }
    }
}

impl AllocationDecider for EnableAllocationDecider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn can_allocate_shard(&self, shard: &ShardRouting, allocation: &RoutingAllocation) -> Decision {
        match self.mode {
            EnableAllocation::All => {
                allocation.decision(DecisionKind::Yes, Self::NAME, "all allocations are allowed", &[])
            }
            EnableAllocation::None => {
                allocation.decision(DecisionKind::No, Self::NAME, "no allocations are allowed", &[])
            }
            EnableAllocation::Primaries if shard.primary => {
                allocation.decision(DecisionKind::Yes, Self::NAME, "primary allocations are allowed", &[])
            }
            EnableAllocation::Primaries => allocation.decision(
                DecisionKind::No,
                Self::NAME,
                "replica allocations are forbidden",
                &[],
            ),
            EnableAllocation::NewPrimaries if shard.primary && !shard.allocated_before => allocation.decision(
                DecisionKind::Yes,
                Self::NAME,
                "new primary allocations are allowed",
                &[],
            ),
            EnableAllocation::NewPrimaries => allocation.decision(
                DecisionKind::No,
                Self::NAME,
                "non-new primary allocations are forbidden",
                &[],
            ),
        }
    }
}

/// Never place two copies of the same shard on one node.
#[derive(Debug, Clone, Default)]
pub struct SameShardAllocationDecider;

impl SameShardAllocationDecider {
    pub const NAME: &'static str = "same_shard";
}

impl AllocationDecider for SameShardAllocationDecider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn can_allocate(
        &self,
        shard: &ShardRouting,
        node: &RoutingNode,
        allocation: &RoutingAllocation,
    ) -> Decision {
        if node.shard(&shard.shard_id).is_some() {
            return allocation.decision(
                DecisionKind::No,
                Self::NAME,
                "shard {} already has a copy allocated on node {}",
                &[&shard.shard_id, node.node_id()],
            );
        }
        allocation.decision(
            DecisionKind::Yes,
            Self::NAME,
            "node {} holds no copy of shard {}",
            &[node.node_id(), &shard.shard_id],
        )
    }
}
