//! Response slots: one cell per target node plus the completion counter.
//!
//! Slot `i` is written by exactly one completion (the one for node `i`), so
//! the cells need no lock. Each completion writes its cell first and then
//! decrements `pending` with `AcqRel`; the completion that takes the counter
//! to zero therefore observes every other cell's write.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::{FailedNodeError, NodeId};

/// What one node contributed.
#[derive(Debug)]
pub enum NodeSlot<R> {
    Response(R),
    Failed(FailedNodeError),
}

pub(crate) struct ResponseSlots<R> {
    node_ids: Vec<NodeId>,
    cells: Box<[OnceLock<NodeSlot<R>>]>,
    pending: AtomicUsize,
}

impl<R> ResponseSlots<R> {
    pub(crate) fn new(node_ids: Vec<NodeId>) -> Self {
        let cells = node_ids.iter().map(|_| OnceLock::new()).collect();
        let pending = AtomicUsize::new(node_ids.len());
        Self {
            node_ids,
            cells,
            pending,
        }
    }

    pub(crate) fn node_ids(&self) -> &[NodeId] {
        &self.node_ids
    }

    /// Resolve slot `idx`; `None` leaves the cell empty.
    ///
    /// Returns `true` for exactly one call: the one that resolves the last
    /// outstanding slot. Must be called once per index.
    pub(crate) fn complete(&self, idx: usize, slot: Option<NodeSlot<R>>) -> bool {
        if let Some(slot) = slot {
            let written = self.cells[idx].set(slot);
            debug_assert!(written.is_ok(), "slot {idx} resolved twice");
        }
        self.pending.fetch_sub(1, Ordering::AcqRel) == 1
    }

    pub(crate) fn view(&self) -> NodeResponses<'_, R> {
        NodeResponses {
            node_ids: &self.node_ids,
            cells: &self.cells,
        }
    }
}

/// Positional view over every slot, handed to the combination callback.
///
/// Entry `i` always belongs to the `i`-th resolved node, whatever order the
/// nodes answered in.
pub struct NodeResponses<'a, R> {
    node_ids: &'a [NodeId],
    cells: &'a [OnceLock<NodeSlot<R>>],
}

impl<R> Clone for NodeResponses<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for NodeResponses<'_, R> {}

impl<'a, R> NodeResponses<'a, R> {
    pub fn len(&self) -> usize {
        self.node_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }

    pub fn node_id(&self, idx: usize) -> Option<&'a NodeId> {
        self.node_ids.get(idx)
    }

    /// `None` for an empty slot: the node failed and failures are not
    /// accumulated.
    pub fn get(&self, idx: usize) -> Option<&'a NodeSlot<R>> {
        self.cells.get(idx).and_then(OnceLock::get)
    }

    pub fn iter(self) -> impl Iterator<Item = (&'a NodeId, Option<&'a NodeSlot<R>>)> + 'a {
        self.node_ids
            .iter()
            .zip(self.cells.iter().map(OnceLock::get))
    }

    pub fn responses(self) -> impl Iterator<Item = &'a R> + 'a {
        self.cells.iter().filter_map(|cell| match cell.get() {
            Some(NodeSlot::Response(response)) => Some(response),
            _ => None,
        })
    }

    pub fn failures(self) -> impl Iterator<Item = &'a FailedNodeError> + 'a {
        self.cells.iter().filter_map(|cell| match cell.get() {
            Some(NodeSlot::Failed(failure)) => Some(failure),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeFailure;

    fn ids(n: usize) -> Vec<NodeId> {
        (0..n).map(|i| NodeId::new(format!("n{i}"))).collect()
    }

    #[test]
    fn only_the_last_completion_reports_done() {
        let slots = ResponseSlots::<u32>::new(ids(3));
        assert!(!slots.complete(2, Some(NodeSlot::Response(2))));
        assert!(!slots.complete(0, None));
        assert!(slots.complete(1, Some(NodeSlot::Response(1))));
    }

    #[test]
    fn view_is_positional() {
        let slots = ResponseSlots::<u32>::new(ids(3));
        slots.complete(2, Some(NodeSlot::Response(20)));
        slots.complete(
            0,
            Some(NodeSlot::Failed(FailedNodeError::new(
                NodeId::new("n0"),
                NodeFailure::NoSuchNode(NodeId::new("n0")),
            ))),
        );
        slots.complete(1, None);

        let view = slots.view();
        assert_eq!(view.len(), 3);
        assert!(matches!(view.get(0), Some(NodeSlot::Failed(_))));
        assert!(view.get(1).is_none());
        assert!(matches!(view.get(2), Some(NodeSlot::Response(20))));
        assert_eq!(view.responses().copied().collect::<Vec<_>>(), vec![20]);
        assert_eq!(view.failures().count(), 1);
        let order: Vec<&str> = view.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order, vec!["n0", "n1", "n2"]);
    }
}
