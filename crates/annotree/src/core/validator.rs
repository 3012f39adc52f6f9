//! Structural prerequisite validation.
//!
//! Before an extension's hooks run, the processor checks that every node
//! kind the extension declared in `required_nodes` actually occurs in the
//! document. Validation only reports; it never repairs the tree or reorders
//! the run.

use crate::error::AnnotreeError;
use crate::extension::{Extension, ExtensionRegistry};
use crate::tree::{Node, contains_kind};

/// Check that every node kind `extension` requires is present in `document`.
///
/// Returns one error per missing kind rather than stopping at the first, so
/// lenient runs can report everything at once. Each error names the
/// requiring extension, the missing kind, and (best effort) some other
/// registered extension whose `provided_nodes` advertises that kind. The
/// hint makes the message actionable; nothing is auto-fixed.
pub fn validate_node_requirements(
    extension: &dyn Extension,
    document: &Node,
    registry: &ExtensionRegistry,
) -> Vec<AnnotreeError> {
    let mut errors = Vec::new();

    for &kind in extension.required_nodes() {
        if contains_kind(document, kind) {
            continue;
        }

        errors.push(AnnotreeError::MissingNodeType {
            extension_id: extension.id().to_string(),
            node_type: kind,
            provided_by: registry.find_provider(kind, extension.id()),
        });
    }

    errors
}
