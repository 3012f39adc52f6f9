//! Core processing orchestration module.
//!
//! This module contains the processing engine for Annotree. It provides the
//! primary entry points for running extensions over a document, dependency
//! order execution, structural validation, and the conflict-tracking merge
//! of metadata contributions.
//!
//! # Architecture
//!
//! The core module is responsible for:
//! - **Entry Points**: The `process_with_extensions()` family of functions
//! - **Pipeline**: Driving transform, visit, and enhance phases in resolved order
//! - **Validation**: Checking declared node-kind prerequisites against the tree
//! - **Merge**: Deep-merging extras contributions with field-ownership tracking
//! - **Context**: The read-only run state handed to every hook
//! - **Configuration**: Processing options and option-file loading
//!
//! # Example
//!
//! ```rust
//! use annotree::core::processor::process_with_extensions;
//! use annotree::core::config::ProcessOptions;
//! use annotree::Node;
//!
//! # tokio_test::block_on(async {
//! let document = Node::root(vec![Node::sentence(vec![Node::word("hola")])]);
//! let output = process_with_extensions(document, vec![], ProcessOptions::default()).await?;
//! assert!(output.metadata.applied_extensions.is_empty());
//! # Ok::<(), annotree::AnnotreeError>(())
//! # });
//! ```

pub mod config;
pub mod context;
pub mod merge;
mod pipeline;
pub mod processor;
pub mod validator;

pub use config::{ArrayStrategy, ConflictStrategy, ProcessOptions};
pub use context::ProcessContext;
pub use processor::{
    process, process_with_extension_ids, process_with_extension_ids_sync,
    process_with_extensions, process_with_extensions_sync,
};
