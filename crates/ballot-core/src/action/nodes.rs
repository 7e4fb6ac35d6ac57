//! TransportNodesAction - fan one request out to many nodes.
//!
//! # Flow
//! 1. Read one membership snapshot from the `ClusterStateSource`
//! 2. Resolve the request's node filters, then let the action filter the ids
//! 3. Send one node-level request per id, each on its own task
//! 4. Every completion (response, failure, timeout, panic) fills its slot and
//!    decrements the pending counter
//! 5. The completion that reaches zero combines the slots and calls the
//!    listener, exactly once
//!
//! # Invocation states
//! `CREATED -> DISPATCHING -> AWAITING(n) -> AGGREGATING -> DONE`. There is no
//! cancellation and no invocation-wide timeout; a node that never answers
//! holds the invocation in `AWAITING` unless the request sets a per-node
//! timeout.
//!
//! # Failure isolation
//! A node's fault never affects another node's slot. Unknown ids and
//! client-to-client targets fail synthetically on the dispatching thread.
//! Transport errors, timeouts and panics raised while building the node
//! request or while the node task runs all become a [`NodeFailure`] and go
//! through the same completion path as a response. With
//! `accumulate_failures() == false` such a slot stays empty.
//!
//! # Threading
//! `execute` never blocks. The listener runs on whichever task completes
//! last. The one exception: when every target fails synthetically, the last
//! completion happens inside `execute`, so the listener runs there.
//!
//! # Memory ordering
//! Slots need no lock: slot `i` has one writer. See [`super::slots`] for the
//! counter that publishes the writes to the aggregating task.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{Instrument, Span, debug, debug_span, warn};

use super::slots::{NodeSlot, ResponseSlots};
use super::{NodesAction, NodesRequest};
use crate::domain::{ActionError, DiscoveryNodes, FailedNodeError, InvocationId, NodeFailure, NodeId};
use crate::ports::{ClusterStateSource, IdGenerator, SystemClock, Transport, UlidGenerator};

type Listener<T> = Box<dyn FnOnce(Result<T, ActionError>) + Send>;

/// Executes a [`NodesAction`] over the nodes its request addresses.
pub struct TransportNodesAction<A: NodesAction> {
    action: Arc<A>,
    cluster: Arc<dyn ClusterStateSource>,
    transport: Arc<dyn Transport<A>>,
    ids: Arc<dyn IdGenerator>,
    transport_action: Arc<str>,
}

impl<A: NodesAction> TransportNodesAction<A> {
    pub fn new(
        action: Arc<A>,
        cluster: Arc<dyn ClusterStateSource>,
        transport: Arc<dyn Transport<A>>,
    ) -> Self {
        let transport_action = Arc::from(format!("{}[n]", action.name()));
        Self {
            action,
            cluster,
            transport,
            ids: Arc::new(UlidGenerator::new(SystemClock)),
            transport_action,
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    /// Name the node-level requests are sent under.
    pub fn transport_action(&self) -> &str {
        &self.transport_action
    }

    /// Dispatch `request` and return without waiting for any node.
    ///
    /// `listener` is called exactly once with the combined response or the
    /// combination error. Must be called from within a Tokio runtime.
    pub fn execute<F>(&self, request: A::Request, listener: F) -> InvocationId
    where
        F: FnOnce(Result<A::Response, ActionError>) + Send + 'static,
    {
        let invocation = self.ids.generate_invocation_id();
        let nodes = self.cluster.state();
        let resolved = self.action.resolve_nodes(&request, &nodes);
        let node_ids = self.action.filter_node_ids(&nodes, resolved);

        let span = debug_span!(
            "nodes_action",
            action = %self.action.name(),
            invocation = %invocation,
            nodes = node_ids.len(),
        );
        debug!(parent: &span, transport_action = %self.transport_action, "dispatching to nodes");
        let run = Arc::new(AsyncAction {
            action: Arc::clone(&self.action),
            request,
            slots: ResponseSlots::new(node_ids),
            listener: Mutex::new(Some(Box::new(listener))),
            span,
        });
        run.start(
            &nodes,
            Arc::clone(&self.transport),
            Arc::clone(&self.transport_action),
        );
        invocation
    }

    /// [`execute`](Self::execute) with the listener turned into a future.
    pub async fn execute_async(&self, request: A::Request) -> Result<A::Response, ActionError> {
        let (tx, rx) = oneshot::channel();
        self.execute(request, move |result| {
            let _ = tx.send(result);
        });
        rx.await.unwrap_or_else(|_| Err(ActionError::ListenerDropped))
    }
}

/// State of one invocation, shared by every in-flight node request.
struct AsyncAction<A: NodesAction> {
    action: Arc<A>,
    request: A::Request,
    slots: ResponseSlots<A::NodeResponse>,
    listener: Mutex<Option<Listener<A::Response>>>,
    span: Span,
}

impl<A: NodesAction> AsyncAction<A> {
    fn start(self: &Arc<Self>, nodes: &DiscoveryNodes, transport: Arc<dyn Transport<A>>, action_name: Arc<str>) {
        if self.slots.node_ids().is_empty() {
            let this = Arc::clone(self);
            let span = self.span.clone();
            tokio::spawn(async move { this.finish() }.instrument(span));
            return;
        }

        let local = nodes.local_node();
        let timeout = self.request.timeout();
        for (idx, node_id) in self.slots.node_ids().iter().enumerate() {
            let Some(node) = nodes.get(node_id.as_str()) else {
                self.on_failure(idx, node_id, NodeFailure::NoSuchNode(node_id.clone()));
                continue;
            };
            if !local.should_connect_to(node) && local.id() != node.id() {
                let failure = NodeFailure::ShouldNotConnect {
                    local: local.id().clone(),
                    target: node_id.clone(),
                };
                self.on_failure(idx, node_id, failure);
                continue;
            }

            let build = || self.action.new_node_request(node_id, &self.request);
            let node_request = match catch_unwind(AssertUnwindSafe(build)) {
                Ok(node_request) => node_request,
                Err(panic) => {
                    let failure = NodeFailure::Panicked {
                        node: node_id.clone(),
                        message: panic_message(panic.as_ref()),
                    };
                    self.on_failure(idx, node_id, failure);
                    continue;
                }
            };
            let this = Arc::clone(self);
            let transport = Arc::clone(&transport);
            let action_name = Arc::clone(&action_name);
            let node = node.clone();
            let span = self.span.clone();
            tokio::spawn(
                async move {
                    let sent = async {
                        let sent = transport.send(&node, &action_name, node_request);
                        match timeout {
                            Some(after) => tokio::time::timeout(after, sent).await.unwrap_or_else(|_| {
                                Err(NodeFailure::Timeout {
                                    node: node.id().clone(),
                                    after,
                                })
                            }),
                            None => sent.await,
                        }
                    };
                    let result = AssertUnwindSafe(sent).catch_unwind().await.unwrap_or_else(|panic| {
                        Err(NodeFailure::Panicked {
                            node: node.id().clone(),
                            message: panic_message(panic.as_ref()),
                        })
                    });
                    match result {
                        Ok(response) => this.on_operation(idx, response),
                        Err(failure) => this.on_failure(idx, node.id(), failure),
                    }
                }
                .instrument(span),
            );
        }
    }

    fn on_operation(&self, idx: usize, response: A::NodeResponse) {
        if self.slots.complete(idx, Some(NodeSlot::Response(response))) {
            self.finish();
        }
    }

    fn on_failure(&self, idx: usize, node_id: &NodeId, failure: NodeFailure) {
        if !matches!(failure, NodeFailure::ShouldNotConnect { .. }) {
            debug!(parent: &self.span, node = %node_id, error = %failure, "failed to execute on node");
        }
        let slot = self
            .action
            .accumulate_failures()
            .then(|| NodeSlot::Failed(FailedNodeError::new(node_id.clone(), failure)));
        if self.slots.complete(idx, slot) {
            self.finish();
        }
    }

    fn finish(&self) {
        let combine = || self.action.new_response(&self.request, self.slots.view());
        let result = catch_unwind(AssertUnwindSafe(combine))
            .unwrap_or_else(|panic| Err(ActionError::CombinePanicked(panic_message(panic.as_ref()))));
        if let Err(err) = &result {
            debug!(parent: &self.span, error = %err, "failed to combine node responses");
        }

        let listener = self.listener.lock().unwrap_or_else(PoisonError::into_inner).take();
        match listener {
            Some(listener) => listener(result),
            None => warn!(parent: &self.span, "invocation finished twice"),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
