//! AllocationDeciders - the composite that folds many deciders into one vote.
//!
//! # Design
//! The composite is itself an [`AllocationDecider`], so callers ask one
//! object whatever the number of registered deciders. Registration order is
//! evaluation order and never changes after `build()`.
//!
//! # Folding
//! - `ALWAYS` abstains and is dropped from the aggregate
//! - the first `NO` returns at once, unless the pass runs in debug mode
//! - in debug mode every decider is asked and every vote is kept
//! - no votes at all means `YES`
//!
//! The outcome of the aggregate follows `NO > THROTTLE > YES` (see
//! [`crate::domain::Multi`]).
//!
//! # Skip-set
//! `can_allocate` and `can_remain` first check the pass's skip-set for the
//! `(shard, node)` pair. A hit answers `NO` without asking any decider. The
//! other questions carry no pair and always reach the deciders.
//!
//! # Why no error path
//! Deciders answer with a [`Decision`], never a `Result`. A decider that
//! panics takes the allocation pass down with it; the composite does not
//! catch it.
//!
//! # Logging
//! A veto is logged at `trace` with the question and the vetoing decider. A
//! skip-set hit is logged with the shard and node.

use std::sync::Arc;

use tracing::trace;

use super::context::RoutingAllocation;
use super::decider::AllocationDecider;
use super::routing::RoutingNode;
use crate::domain::{Decision, DecisionKind, ShardRouting};

/// Registration error for `AllocationDecidersBuilder`.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("allocation decider '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// Asks every registered decider, in order, and combines the votes.
///
/// A `NO` ends the evaluation immediately unless the allocation is in debug
/// mode, in which case every decider is asked and every vote is kept so the
/// explanation is complete. `ALWAYS` votes are dropped. With no votes at all
/// the answer is `YES`.
///
/// The decider list is fixed at construction; the composite holds no other
/// state and can be shared between passes.
#[derive(Clone, Default)]
pub struct AllocationDeciders {
    deciders: Vec<Arc<dyn AllocationDecider>>,
}

impl AllocationDeciders {
    pub fn new(deciders: Vec<Arc<dyn AllocationDecider>>) -> Self {
        Self { deciders }
    }

    pub fn builder() -> AllocationDecidersBuilder {
        AllocationDecidersBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.deciders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deciders.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.deciders.iter().map(|d| d.name()).collect()
    }

    fn combine<F>(&self, operation: &'static str, allocation: &RoutingAllocation, mut ask: F) -> Decision
    where
        F: FnMut(&dyn AllocationDecider) -> Decision,
    {
        let mut ret = Decision::multi();
        for decider in &self.deciders {
            let decision = ask(decider.as_ref());
            match decision.kind() {
                DecisionKind::No => {
                    trace!(operation, decider = decider.name(), "decider voted NO");
                    if !allocation.debug_decision() {
                        return Decision::NO;
                    }
                    ret.add(decision);
                }
                DecisionKind::Always => {}
                DecisionKind::Yes | DecisionKind::Throttle => {
                    ret.add(decision);
                }
            }
        }
        ret.into()
    }
}

impl std::fmt::Debug for AllocationDeciders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllocationDeciders")
            .field("deciders", &self.names())
            .finish()
    }
}

impl AllocationDecider for AllocationDeciders {
    fn name(&self) -> &str {
        "allocation_deciders"
    }

    fn can_allocate(
        &self,
        shard: &ShardRouting,
        node: &RoutingNode,
        allocation: &RoutingAllocation,
    ) -> Decision {
        if allocation.should_ignore_shard_for_node(&shard.shard_id, node.node_id()) {
            trace!(shard = %shard, node = %node.node_id(), "shard is ignored for node in this pass");
            return Decision::NO;
        }
        let _span = tracing::trace_span!("can_allocate", shard = %shard.shard_id, node = %node.node_id()).entered();
        self.combine("can_allocate", allocation, |d| d.can_allocate(shard, node, allocation))
    }

    fn can_remain(
        &self,
        shard: &ShardRouting,
        node: &RoutingNode,
        allocation: &RoutingAllocation,
    ) -> Decision {
        if allocation.should_ignore_shard_for_node(&shard.shard_id, node.node_id()) {
            trace!(shard = %shard, node = %node.node_id(), "shard is ignored for node in this pass");
            return Decision::NO;
        }
        let _span = tracing::trace_span!("can_remain", shard = %shard.shard_id, node = %node.node_id()).entered();
        self.combine("can_remain", allocation, |d| d.can_remain(shard, node, allocation))
    }

    fn can_allocate_shard(&self, shard: &ShardRouting, allocation: &RoutingAllocation) -> Decision {
        self.combine("can_allocate_shard", allocation, |d| d.can_allocate_shard(shard, allocation))
    }

    fn can_allocate_to_node(&self, node: &RoutingNode, allocation: &RoutingAllocation) -> Decision {
        self.combine("can_allocate_to_node", allocation, |d| d.can_allocate_to_node(node, allocation))
    }

    fn can_rebalance_shard(&self, shard: &ShardRouting, allocation: &RoutingAllocation) -> Decision {
        self.combine("can_rebalance_shard", allocation, |d| d.can_rebalance_shard(shard, allocation))
    }

    fn can_rebalance(&self, allocation: &RoutingAllocation) -> Decision {
        self.combine("can_rebalance", allocation, |d| d.can_rebalance(allocation))
    }
}

/// Ordered registration with duplicate detection.
#[derive(Default)]
pub struct AllocationDecidersBuilder {
    deciders: Vec<Arc<dyn AllocationDecider>>,
}

impl AllocationDecidersBuilder {
    pub fn add(mut self, decider: Arc<dyn AllocationDecider>) -> Result<Self, RegistryError> {
        if self.deciders.iter().any(|d| d.name() == decider.name()) {
            return Err(RegistryError::AlreadyRegistered(decider.name().to_string()));
        }
        self.deciders.push(decider);
        Ok(self)
    }

    pub fn build(self) -> AllocationDeciders {
        AllocationDeciders::new(self.deciders)
    }
}
