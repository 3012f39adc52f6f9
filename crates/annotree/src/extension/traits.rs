//! Extension trait definition.
//!
//! An extension is an independently authored enrichment unit: it declares its
//! identity, ordering dependencies, and structural requirements, and supplies
//! up to three behavior hooks that the processor drives over the document.

use async_trait::async_trait;

use crate::Result;
use crate::core::ProcessContext;
use crate::tree::{Extras, Node, NodeKind};

/// An enrichment unit applied to a document by the processor.
///
/// Extensions are stateless and reusable: the same instance may participate in
/// many concurrent runs, and all per-run state lives in the
/// [`ProcessContext`]. Every hook has a no-op default, so an extension that
/// only declares metadata (for example to reserve an id or advertise
/// provisions) is valid and leaves the document untouched.
///
/// # Phases
///
/// For each extension, in fixed order:
///
/// 1. [`transform`](Extension::transform) - whole-tree rewrite
/// 2. [`visit`](Extension::visit) - one pass per kind declared in
///    [`visit_kinds`](Extension::visit_kinds), every matching node
/// 3. [`enhance_metadata`](Extension::enhance_metadata) - every word node;
///    returned extras are merged with conflict tracking
///
/// Within one pass all node hooks are dispatched concurrently and the pass is
/// fully awaited before the next phase begins; extension N+1 never starts
/// before extension N has settled completely.
///
/// # Thread Safety
///
/// Extensions must be `Send + Sync`: they are shared as `Arc<dyn Extension>`
/// and their hook futures may be polled from any runtime thread.
///
/// # Example
///
/// ```rust
/// use annotree::{Extension, Extras, Node, ProcessContext, Result};
/// use async_trait::async_trait;
/// use serde_json::json;
///
/// struct FrequencyTagger;
///
/// #[async_trait]
/// impl Extension for FrequencyTagger {
///     fn id(&self) -> &str {
///         "frequency"
///     }
///
///     fn provided_extras(&self) -> &[&str] {
///         &["frequency"]
///     }
///
///     async fn enhance_metadata(
///         &self,
///         word: &Node,
///         _context: &ProcessContext,
///     ) -> Result<Option<Extras>> {
///         let mut extras = Extras::new();
///         extras.insert("frequency".to_string(), json!({ "surface": word.text() }));
///         Ok(Some(extras))
///     }
/// }
/// ```
#[async_trait]
pub trait Extension: Send + Sync {
    /// Globally unique extension id.
    ///
    /// Lowercase with hyphens by convention (`"clause-segmenter"`). Registering
    /// a second extension under the same id overwrites the first with a logged
    /// warning; empty or all-whitespace ids are rejected at registration.
    fn id(&self) -> &str;

    /// Optional human-readable summary for diagnostics and logging.
    fn description(&self) -> &str {
        ""
    }

    /// Ids of extensions that must be fully applied before this one.
    ///
    /// Ordering only - no behavior is imported. A dependency that is
    /// registered but not part of the current run is assumed already
    /// satisfied; a dependency that is not registered at all fails resolution
    /// with [`crate::AnnotreeError::ExtensionNotFound`].
    fn dependencies(&self) -> &[&str] {
        &[]
    }

    /// Node kinds that must already exist somewhere in the tree.
    ///
    /// Checked by the validator before this extension runs; absence fails the
    /// extension with [`crate::AnnotreeError::MissingNodeType`].
    fn required_nodes(&self) -> &[NodeKind] {
        &[]
    }

    /// Extras field names expected to already be present on word nodes.
    ///
    /// Advisory: the core does not validate these generically. Check inside
    /// your own hooks and signal absence with
    /// [`crate::AnnotreeError::missing_extras`].
    fn required_extras(&self) -> &[&str] {
        &[]
    }

    /// Node kinds this extension introduces into the tree.
    ///
    /// Used for diagnostics and for suggesting a provider when another
    /// extension's `required_nodes` check fails - never for enforcement.
    fn provided_nodes(&self) -> &[NodeKind] {
        &[]
    }

    /// Extras field names this extension writes.
    ///
    /// Diagnostic metadata, like [`provided_nodes`](Extension::provided_nodes).
    fn provided_extras(&self) -> &[&str] {
        &[]
    }

    /// Node kinds the [`visit`](Extension::visit) hook should be called for.
    ///
    /// One full pass runs per declared kind, in declared order. An extension
    /// that overrides `visit` without declaring kinds here is never called.
    fn visit_kinds(&self) -> &[NodeKind] {
        &[]
    }

    /// Whole-tree rewrite, phase 1.
    ///
    /// Receives the working tree as mutated by all prior extensions. Either
    /// edit it in place and return `Ok(None)`, or return
    /// `Ok(Some(replacement))` to substitute a structurally new tree for all
    /// subsequent phases and extensions.
    async fn transform(
        &self,
        document: &mut Node,
        context: &ProcessContext,
    ) -> Result<Option<Node>> {
        let _ = (document, context);
        Ok(None)
    }

    /// Per-node hook, phase 2.
    ///
    /// Called once per node whose kind is declared in
    /// [`visit_kinds`](Extension::visit_kinds), with no ordering guarantee
    /// between nodes of the same pass (they are dispatched concurrently).
    /// Mutate the node in place; structural edits are limited to the node's
    /// own subtree.
    async fn visit(&self, node: &mut Node, context: &ProcessContext) -> Result<()> {
        let _ = (node, context);
        Ok(())
    }

    /// Per-word metadata contribution, phase 3.
    ///
    /// Called once per word node in the post-transform tree. A returned map
    /// is deep-merged into that word's extras, attributed to this extension's
    /// id for conflict tracking. Return `Ok(None)` to contribute nothing.
    async fn enhance_metadata(
        &self,
        word: &Node,
        context: &ProcessContext,
    ) -> Result<Option<Extras>> {
        let _ = (word, context);
        Ok(None)
    }
}
