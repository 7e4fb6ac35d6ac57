//! Domain model: decisions, shards, nodes, identifiers and errors.

pub mod decision;
pub mod errors;
pub mod ids;
pub mod node;
pub mod shard;

pub use self::decision::{Decision, DecisionKind, Explanation, Multi, Single};
pub use self::errors::{ActionError, ConfigError, FailedNodeError, NodeFailure, NodeOperationError};
pub use self::ids::{InvocationId, PassId};
pub use self::node::{DiscoveryNode, DiscoveryNodes, NodeId, NodeRoles};
pub use self::shard::{ShardId, ShardRouting, ShardState};
