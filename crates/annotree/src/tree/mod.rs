//! Annotation tree model and traversal.
//!
//! Documents are typed concrete-syntax trees: a root owns paragraphs, which
//! own sentences, which own words and leaf tokens. Extensions enrich the tree
//! through the per-node [`Extras`] bag and may introduce the deeper structural
//! kinds (clauses, phrases, syllables, characters) via transforms.
//!
//! Traversal helpers live in [`traversal`] and are re-exported here.

pub mod node;
pub mod traversal;

pub use node::{Branch, Extras, Leaf, Node, NodeKind};
pub use traversal::{
    collect_kind, collect_kind_mut, contains_kind, count_kind, count_kinds, find_first, walk,
    walk_mut,
};
