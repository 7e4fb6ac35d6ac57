//! Requests addressed to a set of nodes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A request that is fanned out to the nodes matching `node_ids()`.
pub trait NodesRequest: Send + Sync + 'static {
    /// Node filter expressions; empty means every node.
    fn node_ids(&self) -> &[String];

    /// Per-node timeout. `None` waits for the transport to answer.
    fn timeout(&self) -> Option<Duration>;
}

/// The common part of a nodes request, embedded by concrete requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseNodesRequest {
    pub node_ids: Vec<String>,
    pub timeout: Option<Duration>,
}

impl BaseNodesRequest {
    pub fn new<I, S>(node_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            node_ids: node_ids.into_iter().map(Into::into).collect(),
            timeout: None,
        }
    }

    /// Addressed to every node.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl NodesRequest for BaseNodesRequest {
    fn node_ids(&self) -> &[String] {
        &self.node_ids
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
