//! Transport port - node-level RPC.

use async_trait::async_trait;

use crate::action::NodesAction;
use crate::domain::{DiscoveryNode, NodeFailure};

/// Sends the node-level request of action `A` to one node.
///
/// `action_name` is the node-level action name (`"{name}[n]"`). Every error,
/// whether on the wire or on the remote node, comes back as a `NodeFailure`.
#[async_trait]
pub trait Transport<A: NodesAction>: Send + Sync {
    async fn send(
        &self,
        node: &DiscoveryNode,
        action_name: &str,
        request: A::NodeRequest,
    ) -> Result<A::NodeResponse, NodeFailure>;
}
