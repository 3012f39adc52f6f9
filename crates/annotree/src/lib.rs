//! Annotree - Extensible Annotation Pipeline for Layered Language Documents
//!
//! Annotree runs pluggable analysis extensions over a typed tree of
//! paragraphs, sentences, and words. Extensions declare what they need and
//! what they produce; the processor resolves them into dependency order,
//! drives their hooks over the tree, and merges their per-word metadata
//! contributions with cross-extension conflict detection.
//!
//! # Quick Start
//!
//! ```rust
//! use annotree::extension::Extension;
//! use annotree::{Node, NodeKind, ProcessContext, ProcessOptions, Result};
//! use async_trait::async_trait;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! struct LengthTagger;
//!
//! #[async_trait]
//! impl Extension for LengthTagger {
//!     fn id(&self) -> &str {
//!         "length-tagger"
//!     }
//!
//!     fn provided_extras(&self) -> &[&str] {
//!         &["length"]
//!     }
//!
//!     fn visit_kinds(&self) -> &[NodeKind] {
//!         &[NodeKind::Word]
//!     }
//!
//!     async fn visit(&self, node: &mut Node, _context: &ProcessContext) -> Result<()> {
//!         let length = node.text().chars().count();
//!         node.extras_mut().insert("length".to_string(), json!(length));
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let document = Node::root(vec![Node::sentence(vec![
//!         Node::word("el"),
//!         Node::word("gato"),
//!     ])]);
//!
//!     let output = annotree::process_with_extensions_sync(
//!         document,
//!         vec![Arc::new(LengthTagger)],
//!         ProcessOptions::default(),
//!     )?;
//!
//!     let words = annotree::tree::collect_kind(&output.document, NodeKind::Word);
//!     assert_eq!(words[1].extras()["length"], json!(4));
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Tree** (`tree`): the typed node model (containers and leaves), serde
//!   round-tripping, and traversal helpers
//! - **Extension System** (`extension`): the [`Extension`] trait, the
//!   registry, and dependency resolution
//! - **Core** (`core`): processing entry points, phase orchestration,
//!   structural validation, and the conflict-tracking deep merge
//!
//! # Features
//!
//! - Deterministic dependency-ordered execution via topological sort
//! - Concurrent per-node hook dispatch within each extension's pass
//! - Field-ownership tracking that distinguishes cross-extension conflicts
//!   from enrichment of caller-provided data
//! - Strict (abort) and lenient (record-and-skip) failure modes

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod extension;
pub mod tree;
pub mod types;

pub use error::{AnnotreeError, Result};
pub use types::*;

pub use core::config::{ArrayStrategy, ConflictStrategy, ProcessOptions};
pub use core::context::ProcessContext;
pub use core::processor::{
    process, process_with_extension_ids, process_with_extension_ids_sync, process_with_extensions,
    process_with_extensions_sync,
};
pub use core::validator::validate_node_requirements;

pub use extension::{
    Extension, ExtensionRegistry, clear_extensions, get_all_extensions, get_extension,
    get_extension_registry, list_extension_ids, register_extension, register_extensions,
    unregister_extension,
};

pub use tree::{Branch, Extras, Leaf, Node, NodeKind};
