//! StaticClusterState - membership held in memory.

use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::DiscoveryNodes;
use crate::ports::ClusterStateSource;

/// Serves whatever snapshot was last installed with [`update`](Self::update).
///
/// Invocations already in flight keep the snapshot they started with.
pub struct StaticClusterState {
    name: String,
    nodes: RwLock<Arc<DiscoveryNodes>>,
}

impl StaticClusterState {
    pub fn new(name: impl Into<String>, nodes: DiscoveryNodes) -> Self {
        Self {
            name: name.into(),
            nodes: RwLock::new(Arc::new(nodes)),
        }
    }

    pub fn update(&self, nodes: DiscoveryNodes) {
        *self.nodes.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(nodes);
    }
}

impl ClusterStateSource for StaticClusterState {
    fn cluster_name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> Arc<DiscoveryNodes> {
        Arc::clone(&self.nodes.read().unwrap_or_else(PoisonError::into_inner))
    }
}
