//! The ordered node queue shared by the DRGEP and PFA reducers.
//!
//! Holds node indices sorted ascending by the key `(paths[node], node)`; the
//! tie-break on the node index makes every update deterministic. Draining
//! takes the tail, so nodes come out in key-descending order. Repositioning
//! an entry whose key grew is one binary search for the new spot, one for
//! the old, and a single block move over the run in between — not a remove
//! plus an insert.

use core::cmp::Ordering;

use crate::alloc::RawAlloc;
use crate::collections::search::{bsearch_left, bsearch_right_to_insert};
use crate::collections::FixedVec;
use crate::error::{Error, Result};

pub(crate) struct OrderedQueue<'a, A: RawAlloc + ?Sized> {
    nodes: FixedVec<'a, usize, A>,
}

impl<'a, A: RawAlloc + ?Sized> OrderedQueue<'a, A> {
    /// A queue able to hold every node of an `n`-node graph at once.
    pub(crate) fn with_capacity(n: usize, alloc: &'a A) -> Result<Self> {
        Ok(Self {
            nodes: FixedVec::with_capacity(n, alloc)?,
        })
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Removes and returns the node with the largest key.
    pub(crate) fn pop_max(&mut self) -> Option<usize> {
        self.nodes.pop()
    }

    /// Inserts a node not currently queued at its sorted position.
    pub(crate) fn insert(&mut self, node: usize, paths: &[f64]) -> Result<()> {
        let key = paths[node];
        let slot = bsearch_right_to_insert(0, self.nodes.len(), |i| {
            let candidate = self.nodes[i];
            le(paths[candidate], candidate, key, node)
        });
        self.nodes.insert(slot, node)
    }

    /// Moves an already-queued node whose path value just grew from
    /// `old_key` to `paths[node]`.
    ///
    /// The run is still sorted with respect to the node's *old* key (only
    /// its own cell changed), so the old position is found by searching for
    /// `(old_key, node)`; the node's own cell compares equal by identity.
    pub(crate) fn reposition(&mut self, node: usize, old_key: f64, paths: &[f64]) -> Result<()> {
        let new_key = paths[node];
        let new_slot = bsearch_right_to_insert(0, self.nodes.len(), |i| {
            let candidate = self.nodes[i];
            le(paths[candidate], candidate, new_key, node)
        });

        let current = bsearch_left(0, self.nodes.len(), |i| {
            let candidate = self.nodes[i];
            if candidate == node {
                Ordering::Equal
            } else {
                cmp(paths[candidate], candidate, old_key, node)
            }
        })
        .ok_or_else(|| Error::InvalidArgument(format!("node {node} is not in the queue")))?;

        debug_assert!(new_slot >= current + 1, "keys only grow");
        if current + 1 == new_slot {
            return Ok(());
        }

        let run = self.nodes.as_mut_slice();
        run.copy_within(current + 1..new_slot, current);
        run[new_slot - 1] = node;
        Ok(())
    }

    #[cfg(test)]
    fn as_slice(&self) -> &[usize] {
        self.nodes.as_slice()
    }
}

/// `(key_a, a) <= (key_b, b)` under the queue's total order.
#[inline]
fn le(key_a: f64, a: usize, key_b: f64, b: usize) -> bool {
    cmp(key_a, a, key_b, b) != Ordering::Greater
}

#[inline]
fn cmp(key_a: f64, a: usize, key_b: f64, b: usize) -> Ordering {
    key_a.total_cmp(&key_b).then_with(|| a.cmp(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::default_allocator;

    fn assert_sorted(queue: &OrderedQueue<'_, crate::alloc::SystemAlloc>, paths: &[f64]) {
        let run = queue.as_slice();
        for pair in run.windows(2) {
            assert!(
                le(paths[pair[0]], pair[0], paths[pair[1]], pair[1]),
                "queue out of order: {run:?} under {paths:?}"
            );
        }
    }

    #[test]
    fn drains_in_key_descending_order() {
        let paths = [0.2, 0.9, 0.5, 0.7];
        let mut q = OrderedQueue::with_capacity(4, default_allocator()).unwrap();
        for node in 0..4 {
            q.insert(node, &paths).unwrap();
            assert_sorted(&q, &paths);
        }
        let mut drained = Vec::new();
        while let Some(node) = q.pop_max() {
            drained.push(node);
        }
        assert_eq!(drained, vec![1, 3, 2, 0]);
    }

    #[test]
    fn ties_break_by_node_index() {
        let paths = [0.5, 0.5, 0.5];
        let mut q = OrderedQueue::with_capacity(3, default_allocator()).unwrap();
        for node in [2, 0, 1] {
            q.insert(node, &paths).unwrap();
        }
        assert_eq!(q.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn reposition_moves_one_entry() {
        let mut paths = [0.1, 0.2, 0.3, 0.4];
        let mut q = OrderedQueue::with_capacity(4, default_allocator()).unwrap();
        for node in 0..4 {
            q.insert(node, &paths).unwrap();
        }
        // Node 0's key grows past everyone else's.
        let old = paths[0];
        paths[0] = 0.9;
        q.reposition(0, old, &paths).unwrap();
        assert_eq!(q.as_slice(), &[1, 2, 3, 0]);
        assert_sorted(&q, &paths);
    }

    #[test]
    fn reposition_in_place_is_noop() {
        let mut paths = [0.1, 0.5, 0.9];
        let mut q = OrderedQueue::with_capacity(3, default_allocator()).unwrap();
        for node in 0..3 {
            q.insert(node, &paths).unwrap();
        }
        let old = paths[1];
        paths[1] = 0.6; // still between 0.1 and 0.9
        q.reposition(1, old, &paths).unwrap();
        assert_eq!(q.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn reposition_missing_node_errors() {
        let paths = [0.1, 0.5];
        let mut q = OrderedQueue::with_capacity(2, default_allocator()).unwrap();
        q.insert(0, &paths).unwrap();
        assert!(matches!(
            q.reposition(1, 0.5, &paths),
            Err(Error::InvalidArgument(_))
        ));
    }
}
