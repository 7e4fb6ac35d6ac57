//! LocalTransport - in-process delivery of node requests.
//!
//! A request for node `n` runs `A::node_operation` directly against `n`'s
//! `DiscoveryNode`. Faults can be injected per node to exercise the failure
//! and timeout paths of the fan-out.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::trace;

use crate::action::NodesAction;
use crate::domain::{DiscoveryNode, NodeFailure, NodeId};
use crate::ports::Transport;

/// Misbehaviour injected for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Fail the request with a transport error.
    Fail(String),
    /// Never answer.
    Hang,
    /// Answer normally after a delay.
    Delay(Duration),
}

pub struct LocalTransport<A> {
    action: Arc<A>,
    faults: RwLock<HashMap<NodeId, Fault>>,
    jitter: Option<Duration>,
}

impl<A: NodesAction> LocalTransport<A> {
    pub fn new(action: Arc<A>) -> Self {
        Self {
            action,
            faults: RwLock::new(HashMap::new()),
            jitter: None,
        }
    }

    /// Delay every request by a random amount up to `max`.
    pub fn with_jitter(mut self, max: Duration) -> Self {
        self.jitter = Some(max);
        self
    }

    pub fn inject(&self, node_id: NodeId, fault: Fault) {
        self.faults
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(node_id, fault);
    }

    pub fn clear(&self, node_id: &NodeId) {
        self.faults
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(node_id);
    }

    fn fault_for(&self, node_id: &NodeId) -> Option<Fault> {
        self.faults
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(node_id)
            .cloned()
    }

    fn jitter_delay(&self) -> Option<Duration> {
        let max = self.jitter?;
        let millis = max.as_millis().min(u64::MAX as u128) as u64;
        Some(Duration::from_millis(rand::thread_rng().gen_range(0..=millis)))
    }
}

#[async_trait]
impl<A: NodesAction> Transport<A> for LocalTransport<A> {
    async fn send(
        &self,
        node: &DiscoveryNode,
        action_name: &str,
        request: A::NodeRequest,
    ) -> Result<A::NodeResponse, NodeFailure> {
        trace!(node = %node.id(), action = action_name, "delivering node request");

        if let Some(delay) = self.jitter_delay() {
            tokio::time::sleep(delay).await;
        }
        match self.fault_for(node.id()) {
            Some(Fault::Fail(reason)) => {
                return Err(NodeFailure::Transport {
                    node: node.id().clone(),
                    reason,
                });
            }
            Some(Fault::Hang) => std::future::pending::<()>().await,
            Some(Fault::Delay(delay)) => tokio::time::sleep(delay).await,
            None => {}
        }

        self.action
            .node_operation(request, node)
            .await
            .map_err(|source| NodeFailure::Operation {
                node: node.id().clone(),
                source,
            })
    }
}
