//! Shared and cyclic structure detection for the dumper.
//!
//! Before anything is written the graph reachable from the root is walked once. A
//! collection or tagged node reached a second time is recorded as a duplicate; its index in
//! detection order becomes the `N` of `&ref_N` / `*ref_N`. Scalars are never anchored.

use nohash_hasher::{IntMap, IntSet};
use smallvec::SmallVec;

use crate::document::{Document, Node, NodeId};

/// Duplicated nodes and whether each one has been written already.
#[derive(Debug, Default)]
pub(crate) struct DuplicateTable {
    index: IntMap<NodeId, usize>,
    emitted: Vec<bool>,
}

impl DuplicateTable {
    /// Walk the graph under `root`. Terminates on cycles.
    pub(crate) fn scan(doc: &Document, root: NodeId) -> Self {
        let mut table = Self::default();
        let mut seen: IntSet<NodeId> = IntSet::default();
        let mut stack: SmallVec<[NodeId; 32]> = SmallVec::new();
        stack.push(root);

        while let Some(id) = stack.pop() {
            let node = doc.node(id);
            if node.is_scalar() {
                continue;
            }
            if !seen.insert(id) {
                if !table.index.contains_key(&id) {
                    table.index.insert(id, table.emitted.len());
                    table.emitted.push(false);
                }
                continue;
            }
            // Children in reverse so they are popped in document order.
            match node {
                Node::Sequence(items) => stack.extend(items.iter().rev().copied()),
                Node::Mapping(entries) => stack.extend(entries.values().rev().copied()),
                Node::Tagged { inner, .. } => stack.push(*inner),
                Node::Scalar(_) => {}
            }
        }
        tracing::trace!(duplicates = table.emitted.len(), "reference scan done");
        table
    }

    /// `Some((n, already_written))` for a duplicated node.
    pub(crate) fn lookup(&self, id: NodeId) -> Option<(usize, bool)> {
        self.index.get(&id).map(|&n| (n, self.emitted[n]))
    }

    pub(crate) fn mark_emitted(&mut self, n: usize) {
        self.emitted[n] = true;
    }

    pub(crate) fn len(&self) -> usize {
        self.emitted.len()
    }
}
