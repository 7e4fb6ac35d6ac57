//! The usual shape of a combined nodes response.

use serde::Serialize;

use super::slots::{NodeResponses, NodeSlot};
use crate::domain::NodeId;

/// A failed node, flattened for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedNodeSummary {
    pub node_id: NodeId,
    pub reason: String,
}

/// Answers in resolved-node order plus the recorded failures.
#[derive(Debug, Clone, Serialize)]
pub struct BaseNodesResponse<R> {
    pub cluster_name: String,
    pub nodes: Vec<R>,
    pub failures: Vec<FailedNodeSummary>,
}

impl<R: Clone> BaseNodesResponse<R> {
    /// Empty slots (failures that were not accumulated) are skipped.
    pub fn from_responses(cluster_name: impl Into<String>, responses: NodeResponses<'_, R>) -> Self {
        let mut nodes = Vec::new();
        let mut failures = Vec::new();
        for (_, slot) in responses.iter() {
            match slot {
                Some(NodeSlot::Response(response)) => nodes.push(response.clone()),
                Some(NodeSlot::Failed(failure)) => failures.push(FailedNodeSummary {
                    node_id: failure.node_id().clone(),
                    reason: failure.cause().to_string(),
                }),
                None => {}
            }
        }
        Self {
            cluster_name: cluster_name.into(),
            nodes,
            failures,
        }
    }
}

impl<R> BaseNodesResponse<R> {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::slots::ResponseSlots;
    use crate::domain::{FailedNodeError, NodeFailure};

    #[test]
    fn keeps_answers_in_order_and_flattens_failures() {
        let ids: Vec<NodeId> = ["a", "b", "c", "d"].into_iter().map(NodeId::new).collect();
        let slots = ResponseSlots::new(ids);
        slots.complete(3, Some(NodeSlot::Response("from-d")));
        slots.complete(0, Some(NodeSlot::Response("from-a")));
        slots.complete(2, None);
        slots.complete(
            1,
            Some(NodeSlot::Failed(FailedNodeError::new(
                NodeId::new("b"),
                NodeFailure::NoSuchNode(NodeId::new("b")),
            ))),
        );

        let response = BaseNodesResponse::from_responses("prod", slots.view());

        assert_eq!(response.nodes, vec!["from-a", "from-d"]);
        assert!(response.has_failures());
        assert_eq!(
            response.failures,
            vec![FailedNodeSummary {
                node_id: NodeId::new("b"),
                reason: "no such node [b]".into(),
            }]
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["cluster_name"], "prod");
        assert_eq!(json["failures"][0]["node_id"], "b");
    }
}
