//! Doubly linked view of a timeline with O(1) lift/unlift.
//!
//! Nodes live in an arena and refer to each other by index. Index
//! [`HEAD`] is a sentinel that is never lifted, so every real node always has
//! a predecessor. A call node carries the index of its return node.
//!
//! Lifting a call removes it and its return from the list but leaves the
//! removed nodes' own `prev`/`next` untouched; unlifting splices them back
//! through those stale links. This is only sound when unlifts happen in the
//! exact reverse order of lifts, which the search's frame stack guarantees.

use std::collections::HashMap;

use lincheck_core::EntryKind;

use crate::entry::Timeline;

/// Index of the sentinel head node.
pub(crate) const HEAD: usize = 0;

#[derive(Debug, Clone, Copy)]
struct Node {
    /// Operation id; meaningless for the head.
    op: usize,
    /// Index of the entry on the timeline; meaningless for the head.
    entry: usize,
    /// Return node paired with a call node, `None` for returns.
    matched: Option<usize>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Arena-backed list of the entries not yet committed to a linearization.
#[derive(Debug)]
pub(crate) struct LinkedEntries {
    nodes: Vec<Node>,
}

impl LinkedEntries {
    /// Builds the list in timeline order, behind a sentinel head.
    pub(crate) fn new<I, O>(timeline: &Timeline<I, O>) -> Self {
        let entries = timeline.entries();
        let mut nodes = Vec::with_capacity(entries.len() + 1);
        nodes.push(Node {
            op: usize::MAX,
            entry: usize::MAX,
            matched: None,
            prev: None,
            next: None,
        });

        // Node i + 1 holds entry i. Scanning backwards sees each return
        // before its call, so the call can pick up its partner's index.
        let mut returns: HashMap<usize, usize> = HashMap::with_capacity(entries.len() / 2);
        let mut matched = vec![None; entries.len()];
        for (index, entry) in entries.iter().enumerate().rev() {
            match entry.kind() {
                EntryKind::Return => {
                    returns.insert(entry.id, index + 1);
                }
                EntryKind::Call => matched[index] = returns.get(&entry.id).copied(),
            }
        }

        let last = entries.len();
        for (index, entry) in entries.iter().enumerate() {
            let slot = index + 1;
            nodes.push(Node {
                op: entry.id,
                entry: index,
                matched: matched[index],
                prev: Some(slot - 1),
                next: (slot < last).then_some(slot + 1),
            });
        }
        if last > 0 {
            nodes[HEAD].next = Some(1);
        }

        Self { nodes }
    }

    /// Node after `node`, or `None` at the end of the list.
    #[inline]
    pub(crate) fn next(&self, node: usize) -> Option<usize> {
        self.nodes[node].next
    }

    /// The return node paired with `node`, if `node` is a call.
    #[inline]
    pub(crate) fn matched(&self, node: usize) -> Option<usize> {
        self.nodes[node].matched
    }

    /// Operation id of `node`.
    #[inline]
    pub(crate) fn op(&self, node: usize) -> usize {
        self.nodes[node].op
    }

    /// Timeline index of the entry held by `node`.
    #[inline]
    pub(crate) fn entry(&self, node: usize) -> usize {
        self.nodes[node].entry
    }

    /// Returns true if every entry has been lifted.
    pub(crate) fn is_empty(&self) -> bool {
        self.nodes[HEAD].next.is_none()
    }

    /// Number of nodes currently linked, excluding the head.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        let mut len = 0;
        let mut cursor = self.next(HEAD);
        while let Some(node) = cursor {
            len += 1;
            cursor = self.next(node);
        }
        len
    }

    /// Removes call node `call` and its return node from the list.
    pub(crate) fn lift(&mut self, call: usize) {
        self.detach(call);
        if let Some(ret) = self.nodes[call].matched {
            self.detach(ret);
        }
    }

    /// Splices `call` and its return back into the slots they were lifted
    /// from. Must undo the most recent outstanding lift.
    pub(crate) fn unlift(&mut self, call: usize) {
        if let Some(ret) = self.nodes[call].matched {
            self.reattach(ret);
        }
        self.reattach(call);
    }

    fn detach(&mut self, node: usize) {
        let Node { prev, next, .. } = self.nodes[node];
        if let Some(prev) = prev {
            self.nodes[prev].next = next;
        }
        if let Some(next) = next {
            self.nodes[next].prev = prev;
        }
    }

    fn reattach(&mut self, node: usize) {
        let Node { prev, next, .. } = self.nodes[node];
        if let Some(prev) = prev {
            self.nodes[prev].next = Some(node);
        }
        if let Some(next) = next {
            self.nodes[next].prev = Some(node);
        }
    }
}
