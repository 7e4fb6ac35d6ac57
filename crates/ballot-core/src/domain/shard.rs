//! Shard identity and routing entries.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// `[index][id]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShardId {
    pub index: String,
    pub id: u32,
}

impl ShardId {
    pub fn new(index: impl Into<String>, id: u32) -> Self {
        Self {
            index: index.into(),
            id,
        }
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}][{}]", self.index, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShardState {
    Unassigned,
    Initializing,
    Started,
    Relocating,
}

/// One copy (primary or replica) of a shard and where it lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardRouting {
    pub shard_id: ShardId,
    pub primary: bool,
    pub state: ShardState,
    pub current_node: Option<NodeId>,
    /// Whether this copy has ever been assigned to a node.
    pub allocated_before: bool,
}

impl ShardRouting {
    pub fn unassigned(shard_id: ShardId, primary: bool) -> Self {
        Self {
            shard_id,
            primary,
            state: ShardState::Unassigned,
            current_node: None,
            allocated_before: false,
        }
    }

    pub fn started(shard_id: ShardId, primary: bool, node: NodeId) -> Self {
        Self {
            shard_id,
            primary,
            state: ShardState::Started,
            current_node: Some(node),
            allocated_before: true,
        }
    }

    pub fn assigned(&self) -> bool {
        self.current_node.is_some()
    }
}

impl fmt::Display for ShardRouting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, node[", self.shard_id)?;
        if let Some(node) = &self.current_node {
            write!(f, "{node}")?;
        }
        write!(
            f,
            "], [{}], s[{:?}]",
            if self.primary { "P" } else { "R" },
            self.state
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_routing_table_notation() {
        let started = ShardRouting::started(ShardId::new("logs", 2), true, NodeId::new("n1"));
        assert_eq!(started.to_string(), "[logs][2], node[n1], [P], s[Started]");

        let unassigned = ShardRouting::unassigned(ShardId::new("logs", 2), false);
        assert!(!unassigned.assigned());
        assert_eq!(unassigned.to_string(), "[logs][2], node[], [R], s[Unassigned]");
    }
}
