//! Extension system for annotating language documents.
//!
//! Extensions are the unit of pluggable analysis: each one declares what it
//! needs from the tree, what it contributes, and which other extensions must
//! run before it. The processor resolves a requested set of extensions into
//! dependency order and drives their hooks over the document.
//!
//! # Extension Anatomy
//!
//! An [`Extension`] has two halves:
//!
//! - **Declarations** - synchronous metadata (`id`, `dependencies`,
//!   `required_nodes`, `provided_nodes`, `required_extras`,
//!   `provided_extras`, `visit_kinds`) that the processor reads to plan a
//!   run. All of them default to empty.
//! - **Hooks** - async callbacks run in three phases per extension:
//!   [`transform`](Extension::transform) for whole-tree rewrites,
//!   [`visit`](Extension::visit) for per-node mutation of declared kinds,
//!   and [`enhance_metadata`](Extension::enhance_metadata) for per-word
//!   extras contributions that are deep-merged with conflict tracking.
//!
//! # Example: a per-word annotator
//!
//! ```rust
//! use annotree::extension::{Extension, register_extension};
//! use annotree::tree::{Node, NodeKind};
//! use annotree::{ProcessContext, Result};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct VowelCounter;
//!
//! #[async_trait]
//! impl Extension for VowelCounter {
//!     fn id(&self) -> &str {
//!         "vowel-counter"
//!     }
//!
//!     fn provided_extras(&self) -> &[&str] {
//!         &["vowels"]
//!     }
//!
//!     fn visit_kinds(&self) -> &[NodeKind] {
//!         &[NodeKind::Word]
//!     }
//!
//!     async fn visit(&self, node: &mut Node, _context: &ProcessContext) -> Result<()> {
//!         let count = node.text().chars().filter(|c| "aeiou".contains(*c)).count();
//!         node.extras_mut().insert("vowels".to_string(), serde_json::json!(count));
//!         Ok(())
//!     }
//! }
//!
//! register_extension(Arc::new(VowelCounter))?;
//! # Ok::<(), annotree::AnnotreeError>(())
//! ```
//!
//! # Safety and Threading
//!
//! Extensions must be `Send + Sync`: they are stored in `Arc<dyn Extension>`
//! and their hooks run concurrently within a pass, always through `&self`.
//! Extensions that need mutable state use interior mutability (`Mutex`,
//! `RwLock`, atomics); most extensions are stateless and need none.

pub mod registry;
mod traits;

pub use registry::{
    ExtensionRegistry, clear_extensions, get_all_extensions, get_extension,
    get_extension_registry, list_extension_ids, register_extension, register_extensions,
    unregister_extension,
};
pub use traits::Extension;
