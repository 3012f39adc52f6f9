//! Pre-order depth-first traversal over annotation trees.
//!
//! All operations walk each container's child sequence in document order.
//! Early-exit variants stop the entire walk (remaining siblings and ancestors'
//! remaining children included) as soon as a visitor breaks, which keeps
//! "does kind X exist anywhere" checks cheap on large documents.
//!
//! Traversal is read-only with respect to structure: visitors may mutate node
//! content (extras, leaf values) but must not insert or remove nodes during
//! the same pass.

use std::ops::ControlFlow;

use ahash::AHashMap;

use crate::tree::{Node, NodeKind};

/// Walk the tree pre-order, calling `f` on every node.
///
/// Returning [`ControlFlow::Break`] from `f` stops the walk immediately.
pub fn walk<'a, F>(node: &'a Node, f: &mut F) -> ControlFlow<()>
where
    F: FnMut(&'a Node) -> ControlFlow<()>,
{
    f(node)?;
    if let Some(children) = node.children() {
        for child in children {
            walk(child, f)?;
        }
    }
    ControlFlow::Continue(())
}

/// Walk the tree pre-order with mutable access to node content.
pub fn walk_mut<F>(node: &mut Node, f: &mut F) -> ControlFlow<()>
where
    F: FnMut(&mut Node) -> ControlFlow<()>,
{
    f(node)?;
    if let Some(children) = node.children_mut() {
        for child in children {
            walk_mut(child, f)?;
        }
    }
    ControlFlow::Continue(())
}

/// First node of the given kind in document order, with early exit.
pub fn find_first(node: &Node, kind: NodeKind) -> Option<&Node> {
    if node.kind() == kind {
        return Some(node);
    }
    node.children()?.iter().find_map(|child| find_first(child, kind))
}

/// Whether any node of the given kind exists in the tree.
pub fn contains_kind(node: &Node, kind: NodeKind) -> bool {
    find_first(node, kind).is_some()
}

/// All nodes of the given kind in document order, nested matches included.
pub fn collect_kind(node: &Node, kind: NodeKind) -> Vec<&Node> {
    let mut found = Vec::new();
    let _ = walk(node, &mut |n| {
        if n.kind() == kind {
            found.push(n);
        }
        ControlFlow::Continue(())
    });
    found
}

/// Number of nodes of the given kind in the tree.
pub fn count_kind(node: &Node, kind: NodeKind) -> usize {
    let mut count = 0;
    let _ = walk(node, &mut |n| {
        if n.kind() == kind {
            count += 1;
        }
        ControlFlow::Continue(())
    });
    count
}

/// Occurrence count per node kind over the whole tree.
pub fn count_kinds(node: &Node) -> AHashMap<NodeKind, usize> {
    let mut counts = AHashMap::new();
    let _ = walk(node, &mut |n| {
        *counts.entry(n.kind()).or_insert(0) += 1;
        ControlFlow::Continue(())
    });
    counts
}

/// Disjoint mutable borrows of all nodes of the given kind, document order.
///
/// Matched nodes are not descended into, so for kinds that can nest within
/// themselves (clauses, phrases) only the outermost match of each chain is
/// returned. The kinds the processor dispatches visit and enhance passes over
/// (word, sentence, paragraph, and all leaf kinds) never self-nest, making
/// this exhaustive for them.
pub fn collect_kind_mut(node: &mut Node, kind: NodeKind) -> Vec<&mut Node> {
    let mut found = Vec::new();
    fill_kind_mut(node, kind, &mut found);
    found
}

fn fill_kind_mut<'a>(node: &'a mut Node, kind: NodeKind, found: &mut Vec<&'a mut Node>) {
    if node.kind() == kind {
        found.push(node);
        return;
    }
    if let Some(children) = node.children_mut() {
        for child in children {
            fill_kind_mut(child, kind, found);
        }
    }
}
