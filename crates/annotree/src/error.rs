//! Error types for Annotree.
//!
//! This module defines all error types used throughout the library. All errors
//! are variants of `AnnotreeError` and follow the same conventions:
//!
//! - `thiserror` for the `Error` trait implementation
//! - Error chains preserved with `#[source]` attributes
//! - Context in error messages (extension ids, field paths, node kinds)
//!
//! # Fatality
//!
//! **Always fatal, regardless of processing mode:**
//! - `DependencyCycle` - there is no valid order to run extensions in
//! - `ExtensionNotFound` - a referenced extension id is not registered
//!
//! **Mode-dependent** (abort the run in strict mode, recorded and skipped in
//! lenient mode):
//! - `MissingNodeType` - a structural prerequisite is absent from the tree
//! - `MissingExtras` - raised by extension authors themselves, never by the core
//! - `MergeConflict` - two extensions wrote the same extras field
//! - any other error returned from an extension hook
//!
//! # Example
//!
//! ```rust
//! use annotree::{AnnotreeError, Result};
//!
//! fn check_id(id: &str) -> Result<()> {
//!     if id.trim().is_empty() {
//!         return Err(AnnotreeError::validation("extension id must not be empty"));
//!     }
//!     Ok(())
//! }
//! # check_id("frequency").unwrap();
//! ```
use thiserror::Error;

use crate::tree::NodeKind;

/// Result type alias using `AnnotreeError`.
///
/// This is the standard return type for all fallible operations in Annotree,
/// including extension hooks.
pub type Result<T> = std::result::Result<T, AnnotreeError>;

/// Main error type for all Annotree operations.
///
/// # Variants
///
/// - `DependencyCycle` - the dependency graph of the requested extensions contains a cycle
/// - `ExtensionNotFound` - an extension id was referenced but is not registered
/// - `MissingNodeType` - a `required_nodes` prerequisite is absent from the tree
/// - `MissingExtras` - an expected extras field is absent (signaled by extension authors)
/// - `MergeConflict` - two different extensions wrote the same leaf extras field
/// - `Validation` - invalid input (empty extension id, malformed tree, bad parameters)
/// - `Config` - options-file loading errors
/// - `Io` - file system errors (always bubble up unchanged)
/// - `LockPoisoned` - registry lock poisoning (should not happen in normal operation)
/// - `Other` - catch-all for uncommon errors
#[derive(Debug, Error)]
pub enum AnnotreeError {
    #[error("Dependency cycle detected involving extension '{0}'")]
    DependencyCycle(String),

    #[error("Extension '{0}' is not registered")]
    ExtensionNotFound(String),

    #[error(
        "Extension '{extension_id}' requires node type '{node_type}' which is not present in the document{}",
        provider_hint(.provided_by)
    )]
    MissingNodeType {
        extension_id: String,
        node_type: NodeKind,
        provided_by: Option<String>,
    },

    #[error("Extension '{extension_id}' requires extras field '{field}' which is not present")]
    MissingExtras { extension_id: String, field: String },

    #[error(
        "Conflicting writes to '{field_path}': extension '{incoming_extension}' attempted to \
         overwrite a value owned by extension '{existing_extension}' (existing: {existing_value}, \
         incoming: {incoming_value})"
    )]
    MergeConflict {
        field_path: String,
        existing_extension: String,
        incoming_extension: String,
        existing_value: serde_json::Value,
        incoming_value: serde_json::Value,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("{0}")]
    Other(String),
}

fn provider_hint(provided_by: &Option<String>) -> String {
    match provided_by {
        Some(id) => format!(" (extension '{id}' provides it)"),
        None => String::from(" (no registered extension provides it)"),
    }
}

impl AnnotreeError {
    /// Create a Validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Create a Validation error with source
    pub fn validation_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a Config error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a Config error with source
    pub fn config_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a MissingExtras error.
    ///
    /// Intended for extension authors: the core never raises this itself.
    /// Call it from a hook when an extras field your extension depends on
    /// (declared in `required_extras`) turns out to be absent at runtime.
    pub fn missing_extras<S: Into<String>, F: Into<String>>(extension_id: S, field: F) -> Self {
        Self::MissingExtras {
            extension_id: extension_id.into(),
            field: field.into(),
        }
    }
}
