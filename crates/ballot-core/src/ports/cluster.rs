//! ClusterStateSource port - the current membership snapshot.

use std::sync::Arc;

use crate::domain::DiscoveryNodes;

/// Supplies the node membership a fan-out invocation dispatches against.
///
/// Each call returns an immutable snapshot; an invocation reads one snapshot
/// for its whole lifetime.
pub trait ClusterStateSource: Send + Sync {
    fn cluster_name(&self) -> &str;

    fn state(&self) -> Arc<DiscoveryNodes>;
}
