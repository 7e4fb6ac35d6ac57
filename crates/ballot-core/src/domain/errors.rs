//! Error types.
//!
//! A `NO` decision is not an error and has no representation here. Faults
//! while evaluating a decider are panics and propagate to the caller.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use super::node::NodeId;

/// Returned by `NodesAction::node_operation` on the receiving node.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct NodeOperationError {
    message: String,
}

impl NodeOperationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Why one node did not contribute a response.
#[derive(Debug, Error)]
pub enum NodeFailure {
    #[error("no such node [{0}]")]
    NoSuchNode(NodeId),

    #[error("node [{local}] should not connect to [{target}]")]
    ShouldNotConnect { local: NodeId, target: NodeId },

    #[error("transport error talking to [{node}]: {reason}")]
    Transport { node: NodeId, reason: String },

    #[error("request to [{node}] timed out after {after:?}")]
    Timeout { node: NodeId, after: Duration },

    #[error("node [{node}] panicked: {message}")]
    Panicked { node: NodeId, message: String },

    #[error("node [{node}] failed to execute the operation")]
    Operation {
        node: NodeId,
        #[source]
        source: NodeOperationError,
    },
}

/// The failure recorded in a response slot when failures are accumulated.
#[derive(Debug, Error)]
#[error("Failed node [{node_id}]")]
pub struct FailedNodeError {
    node_id: NodeId,
    #[source]
    cause: NodeFailure,
}

impl FailedNodeError {
    pub fn new(node_id: NodeId, cause: NodeFailure) -> Self {
        Self { node_id, cause }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn cause(&self) -> &NodeFailure {
        &self.cause
    }
}

/// Failure of a whole fan-out invocation.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("failed to combine responses from nodes: {0}")]
    Combine(String),

    #[error("response combination panicked: {0}")]
    CombinePanicked(String),

    #[error("the invocation finished without delivering a response")]
    ListenerDropped,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn failed_node_keeps_the_cause_as_source() {
        let failure = FailedNodeError::new(
            NodeId::new("n7"),
            NodeFailure::Timeout {
                node: NodeId::new("n7"),
                after: Duration::from_millis(50),
            },
        );
        assert_eq!(failure.to_string(), "Failed node [n7]");
        let source = failure.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("request to [n7] timed out after 50ms"));
    }
}
