//! NodeStatsAction - every node reports its roles and shard counts.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::request::BaseNodesRequest;
use super::response::BaseNodesResponse;
use super::slots::NodeResponses;
use super::NodesAction;
use crate::allocation::RoutingNodes;
use crate::domain::{ActionError, DiscoveryNode, NodeId, NodeOperationError, NodeRoles};
use crate::ports::{Clock, ClusterStateSource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatsRequest {
    pub node_id: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStats {
    pub node_id: NodeId,
    pub name: String,
    pub roles: NodeRoles,
    pub shard_count: usize,
    pub primary_count: usize,
    pub taken_at: DateTime<Utc>,
}

/// Node stats over a shared routing table. The response is labelled with the
/// name reported by the same cluster source the fan-out dispatches against.
pub struct NodeStatsAction {
    cluster: Arc<dyn ClusterStateSource>,
    accumulate_failures: bool,
    routing: Arc<RoutingNodes>,
    clock: Arc<dyn Clock>,
}

impl NodeStatsAction {
    pub const NAME: &'static str = "cluster:monitor/nodes/stats";

    pub fn new(cluster: Arc<dyn ClusterStateSource>, routing: Arc<RoutingNodes>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cluster,
            accumulate_failures: true,
            routing,
            clock,
        }
    }

    pub fn with_accumulate_failures(mut self, accumulate: bool) -> Self {
        self.accumulate_failures = accumulate;
        self
    }
}

#[async_trait]
impl NodesAction for NodeStatsAction {
    type Request = BaseNodesRequest;
    type NodeRequest = NodeStatsRequest;
    type NodeResponse = NodeStats;
    type Response = BaseNodesResponse<NodeStats>;

    fn name(&self) -> &str {
        Self::NAME
    }

    fn new_node_request(&self, node_id: &NodeId, _request: &BaseNodesRequest) -> NodeStatsRequest {
        NodeStatsRequest {
            node_id: node_id.clone(),
        }
    }

    async fn node_operation(
        &self,
        request: NodeStatsRequest,
        node: &DiscoveryNode,
    ) -> Result<NodeStats, NodeOperationError> {
        if &request.node_id != node.id() {
            return Err(NodeOperationError::new(format!(
                "stats request for [{}] delivered to [{}]",
                request.node_id,
                node.id()
            )));
        }
        let shards = self
            .routing
            .node(node.id())
            .map(|routing| routing.shards())
            .unwrap_or_default();
        Ok(NodeStats {
            node_id: node.id().clone(),
            name: node.name().to_string(),
            roles: node.roles(),
            shard_count: shards.len(),
            primary_count: shards.iter().filter(|shard| shard.primary).count(),
            taken_at: self.clock.now(),
        })
    }

    fn new_response(
        &self,
        _request: &BaseNodesRequest,
        responses: NodeResponses<'_, NodeStats>,
    ) -> Result<Self::Response, ActionError> {
        Ok(BaseNodesResponse::from_responses(self.cluster.cluster_name(), responses))
    }

    fn accumulate_failures(&self) -> bool {
        self.accumulate_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::TransportNodesAction;
    use crate::domain::{DiscoveryNodes, ShardId, ShardRouting};
    use crate::impls::{Fault, LocalTransport, StaticClusterState};
    use crate::ports::FixedClock;
    use chrono::TimeZone;

    fn fixture() -> (Arc<StaticClusterState>, Arc<RoutingNodes>) {
        let nodes = DiscoveryNodes::new(DiscoveryNode::new("m1").with_roles(NodeRoles::master_only()))
            .with_node(DiscoveryNode::new("d1").with_name("data-one").with_roles(NodeRoles::data_only()))
            .with_node(DiscoveryNode::new("d2").with_roles(NodeRoles::data_only()));
        let shards = vec![
            ShardRouting::started(ShardId::new("logs", 0), true, NodeId::new("d1")),
            ShardRouting::started(ShardId::new("logs", 1), false, NodeId::new("d1")),
            ShardRouting::started(ShardId::new("logs", 1), true, NodeId::new("d2")),
            ShardRouting::unassigned(ShardId::new("logs", 0), false),
        ];
        let routing = Arc::new(RoutingNodes::new(&nodes, shards));
        (Arc::new(StaticClusterState::new("prod", nodes)), routing)
    }

    #[tokio::test]
    async fn data_nodes_report_their_shards() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        let (cluster, routing) = fixture();
        let action = Arc::new(NodeStatsAction::new(cluster.clone(), routing, Arc::new(FixedClock::new(at))));
        let transport = Arc::new(LocalTransport::new(Arc::clone(&action)));
        let fanout = TransportNodesAction::new(action, cluster, transport);

        let response = fanout
            .execute_async(BaseNodesRequest::new(["data:true"]))
            .await
            .unwrap();

        assert_eq!(response.cluster_name, "prod");
        assert!(!response.has_failures());
        let counts: Vec<(&str, usize, usize)> = response
            .nodes
            .iter()
            .map(|s| (s.node_id.as_str(), s.shard_count, s.primary_count))
            .collect();
        assert_eq!(counts, vec![("d1", 2, 1), ("d2", 1, 1)]);
        assert_eq!(response.nodes[0].name, "data-one");
        assert!(response.nodes.iter().all(|s| s.taken_at == at));
    }

    #[tokio::test]
    async fn failed_node_shows_up_as_a_failure() {
        let (cluster, routing) = fixture();
        let action = Arc::new(NodeStatsAction::new(cluster.clone(), routing, Arc::new(FixedClock::new(Utc::now()))));
        let transport = Arc::new(LocalTransport::new(Arc::clone(&action)));
        transport.inject(NodeId::new("d2"), Fault::Fail("disk unreadable".into()));
        let fanout = TransportNodesAction::new(action, cluster, transport);

        let response = fanout.execute_async(BaseNodesRequest::all()).await.unwrap();

        assert_eq!(response.nodes.len(), 2);
        assert_eq!(response.failures.len(), 1);
        assert_eq!(response.failures[0].node_id, NodeId::new("d2"));
        assert!(response.failures[0].reason.contains("disk unreadable"));
    }

    #[tokio::test]
    async fn response_is_labelled_with_the_source_cluster_name() {
        let (cluster, routing) = fixture();
        let action = Arc::new(NodeStatsAction::new(cluster.clone(), routing, Arc::new(FixedClock::new(Utc::now()))));
        let transport = Arc::new(LocalTransport::new(Arc::clone(&action)));
        let fanout = TransportNodesAction::new(action, cluster.clone(), transport);

        let response = fanout.execute_async(BaseNodesRequest::new(["_local"])).await.unwrap();

        assert_eq!(response.cluster_name, cluster.cluster_name());
        assert_eq!(response.nodes.len(), 1);
        assert_eq!(response.nodes[0].node_id, NodeId::new("m1"));
    }
}
