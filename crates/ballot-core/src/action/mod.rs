//! Node fan-out actions.
//!
//! A [`NodesAction`] describes one operation that runs on many nodes: how to
//! build the per-node request, what the node does with it and how the
//! per-node answers are combined. [`TransportNodesAction`] executes it:
//! resolve the target nodes, send one request per node in parallel, collect
//! every answer or failure into a fixed slot array and call
//! [`NodesAction::new_response`] exactly once when the last node is done.

pub mod nodes;
pub mod request;
pub mod response;
pub mod slots;
pub mod stats;

use async_trait::async_trait;

use crate::domain::{ActionError, DiscoveryNode, DiscoveryNodes, NodeId, NodeOperationError};

pub use self::nodes::TransportNodesAction;
pub use self::request::{BaseNodesRequest, NodesRequest};
pub use self::response::{BaseNodesResponse, FailedNodeSummary};
pub use self::slots::{NodeResponses, NodeSlot};
pub use self::stats::{NodeStats, NodeStatsAction, NodeStatsRequest};

/// One operation fanned out over many nodes.
#[async_trait]
pub trait NodesAction: Send + Sync + 'static {
    type Request: NodesRequest;
    type NodeRequest: Send + 'static;
    type NodeResponse: Send + Sync + 'static;
    type Response: Send + 'static;

    /// Action name; the node-level action is registered as `"{name}[n]"`.
    fn name(&self) -> &str;

    fn new_node_request(&self, node_id: &NodeId, request: &Self::Request) -> Self::NodeRequest;

    /// Runs on the receiving node.
    async fn node_operation(
        &self,
        request: Self::NodeRequest,
        node: &DiscoveryNode,
    ) -> Result<Self::NodeResponse, NodeOperationError>;

    /// Combine the per-node results. An error fails the whole invocation,
    /// even when every node answered.
    fn new_response(
        &self,
        request: &Self::Request,
        responses: NodeResponses<'_, Self::NodeResponse>,
    ) -> Result<Self::Response, ActionError>;

    /// Whether node failures are recorded in their slot. When `false` a
    /// failed node leaves its slot empty.
    fn accumulate_failures(&self) -> bool;

    fn resolve_nodes(&self, request: &Self::Request, nodes: &DiscoveryNodes) -> Vec<NodeId> {
        nodes.resolve_node_ids(request.node_ids())
    }

    fn filter_node_ids(&self, _nodes: &DiscoveryNodes, node_ids: Vec<NodeId>) -> Vec<NodeId> {
        node_ids
    }
}
