//! AllocationDecider - one pluggable placement rule.

use super::context::RoutingAllocation;
use super::routing::RoutingNode;
use crate::domain::{Decision, ShardRouting};

/// A placement rule queried by the allocation pass.
///
/// Every query defaults to `Decision::ALWAYS` ("no opinion"), so a decider
/// overrides only the questions it has a rule for. Implementations must be
/// pure with respect to the context: they read it and return a vote.
/// A decider that panics aborts the whole pass; the composite does not catch
/// it.
pub trait AllocationDecider: Send + Sync {
    /// Stable identifier, used as the explain label and for duplicate
    /// detection at registration.
    fn name(&self) -> &str;

    /// Can `shard` be allocated to `node`?
    fn can_allocate(
        &self,
        _shard: &ShardRouting,
        _node: &RoutingNode,
        _allocation: &RoutingAllocation,
    ) -> Decision {
        Decision::ALWAYS
    }

    /// Can `shard` stay where it is?
    fn can_remain(
        &self,
        _shard: &ShardRouting,
        _node: &RoutingNode,
        _allocation: &RoutingAllocation,
    ) -> Decision {
        Decision::ALWAYS
    }

    /// Can `shard` be allocated anywhere at all?
    fn can_allocate_shard(&self, _shard: &ShardRouting, _allocation: &RoutingAllocation) -> Decision {
        Decision::ALWAYS
    }

    /// Can anything be allocated to `node`? Asked before node selection.
    fn can_allocate_to_node(&self, _node: &RoutingNode, _allocation: &RoutingAllocation) -> Decision {
        Decision::ALWAYS
    }

    /// Can `shard` be moved by the rebalancer?
    fn can_rebalance_shard(&self, _shard: &ShardRouting, _allocation: &RoutingAllocation) -> Decision {
        Decision::ALWAYS
    }

    /// Can the cluster rebalance at all?
    fn can_rebalance(&self, _allocation: &RoutingAllocation) -> Decision {
        Decision::ALWAYS
    }
}
