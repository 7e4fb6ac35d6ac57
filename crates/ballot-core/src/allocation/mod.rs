//! Shard allocation framework.
//!
//! An allocation pass (owned by the caller) builds a [`RoutingAllocation`]
//! and asks an [`AllocationDeciders`] composite whether a shard may be
//! placed on, or kept on, a candidate node. The composite asks each
//! registered [`AllocationDecider`] and folds the votes.

pub mod builtin;
pub mod context;
pub mod decider;
pub mod deciders;
pub mod routing;

pub use self::builtin::{EnableAllocation, EnableAllocationDecider, SameShardAllocationDecider};
pub use self::context::RoutingAllocation;
pub use self::decider::AllocationDecider;
pub use self::deciders::{AllocationDeciders, AllocationDecidersBuilder, RegistryError};
pub use self::routing::{RoutingNode, RoutingNodes};
