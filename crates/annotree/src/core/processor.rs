//! Main processing entry points.
//!
//! This module provides the primary API for running extensions over a
//! document tree. Every entry point follows the same steps: snapshot the
//! global registry, resolve the requested extensions into dependency order,
//! then drive the pipeline over the working tree.
//!
//! # Functions
//!
//! - [`process_with_extensions`] - Run explicitly passed extensions
//! - [`process_with_extension_ids`] - Run extensions looked up from the global registry
//! - [`process`] - Convenience wrapper returning only the final tree
//! - `*_sync` variants - Blocking wrappers over the same async core
//!
//! The global registry is read once per call and never mutated: extensions
//! passed by value join a per-call snapshot, so concurrent callers cannot
//! observe each other's extension lists.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::core::config::ProcessOptions;
use crate::core::context::ProcessContext;
use crate::core::pipeline::run_pipeline;
use crate::error::{AnnotreeError, Result};
use crate::extension::{Extension, ExtensionRegistry, get_extension_registry};
use crate::tree::Node;
use crate::types::ProcessOutput;

/// Global Tokio runtime for synchronous operations.
///
/// This runtime is lazily initialized on first use and shared across all sync wrappers.
/// Using a global runtime instead of creating one per call provides 100x+ performance improvement.
///
/// # Safety
///
/// The `.expect()` here is justified because:
/// 1. Runtime creation can only fail due to system resource exhaustion (OOM, thread limit)
/// 2. If runtime creation fails, the process is already in a critical state
/// 3. This is a one-time initialization - if it fails, nothing will work
/// 4. Better to fail fast than return errors from every sync operation
static GLOBAL_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create global Tokio runtime - system may be out of resources")
});

/// Clone the current contents of the global registry.
///
/// The snapshot decouples a run from concurrent registry mutation: the set
/// of resolvable extensions is fixed at call time.
fn registry_snapshot() -> Result<ExtensionRegistry> {
    let registry = get_extension_registry();
    let registry = registry
        .read()
        .map_err(|_| AnnotreeError::LockPoisoned("extension registry lock poisoned".to_string()))?;

    Ok(registry.clone())
}

/// Process a document with an explicit list of extensions.
///
/// The passed extensions are added to a per-call snapshot of the global
/// registry so their dependencies can name either each other or globally
/// registered extensions. When a passed extension's id is already
/// registered globally, the registered implementation wins. The global
/// registry itself is never mutated.
///
/// # Arguments
///
/// * `document` - The tree to annotate; consumed and returned in the output
/// * `extensions` - Extensions to run, in request order
/// * `options` - Processing options (failure mode, merge strategies)
///
/// # Returns
///
/// A [`ProcessOutput`] with the final tree and run metadata.
///
/// # Errors
///
/// Dependency cycles and unregistered ids always fail. Validation and hook
/// errors fail the run in strict mode; in lenient mode they are recorded in
/// `metadata.errors` and the offending extension is skipped.
///
/// # Example
///
/// ```rust
/// use annotree::extension::Extension;
/// use annotree::{Node, ProcessOptions, process_with_extensions};
/// use std::sync::Arc;
///
/// struct Passthrough;
///
/// impl Extension for Passthrough {
///     fn id(&self) -> &str {
///         "passthrough"
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let document = Node::root(vec![Node::sentence(vec![Node::word("hola")])]);
/// let output = process_with_extensions(
///     document,
///     vec![Arc::new(Passthrough)],
///     ProcessOptions::default(),
/// )
/// .await?;
/// assert_eq!(output.metadata.applied_extensions, vec!["passthrough"]);
/// # Ok::<(), annotree::AnnotreeError>(())
/// # });
/// ```
pub async fn process_with_extensions(
    document: Node,
    extensions: Vec<Arc<dyn Extension>>,
    options: ProcessOptions,
) -> Result<ProcessOutput> {
    let mut registry = registry_snapshot()?;

    for extension in &extensions {
        if !registry.has(extension.id()) {
            registry.register(extension.clone())?;
        }
    }

    let ids: Vec<&str> = extensions.iter().map(|e| e.id()).collect();
    process_over_registry(document, &registry, &ids, options).await
}

/// Process a document with extensions looked up by id from the global registry.
///
/// # Errors
///
/// Fails with [`AnnotreeError::ExtensionNotFound`] if any id (or any
/// dependency of one) is not registered, in addition to the failure modes
/// of [`process_with_extensions`].
pub async fn process_with_extension_ids(
    document: Node,
    ids: &[&str],
    options: ProcessOptions,
) -> Result<ProcessOutput> {
    let registry = registry_snapshot()?;
    process_over_registry(document, &registry, ids, options).await
}

/// Process a document and return only the final tree, discarding metadata.
pub async fn process(
    document: Node,
    extensions: Vec<Arc<dyn Extension>>,
    options: ProcessOptions,
) -> Result<Node> {
    let output = process_with_extensions(document, extensions, options).await?;
    Ok(output.document)
}

/// Synchronous wrapper for [`process_with_extensions`].
///
/// This is a convenience function that blocks the current thread until the
/// run completes. For async code, use `process_with_extensions` directly.
///
/// Uses the global Tokio runtime instead of creating a runtime per call.
/// Must not be called from within an async context.
pub fn process_with_extensions_sync(
    document: Node,
    extensions: Vec<Arc<dyn Extension>>,
    options: ProcessOptions,
) -> Result<ProcessOutput> {
    GLOBAL_RUNTIME.block_on(process_with_extensions(document, extensions, options))
}

/// Synchronous wrapper for [`process_with_extension_ids`].
///
/// Uses the global Tokio runtime instead of creating a runtime per call.
/// Must not be called from within an async context.
pub fn process_with_extension_ids_sync(
    document: Node,
    ids: &[&str],
    options: ProcessOptions,
) -> Result<ProcessOutput> {
    GLOBAL_RUNTIME.block_on(process_with_extension_ids(document, ids, options))
}

async fn process_over_registry(
    mut document: Node,
    registry: &ExtensionRegistry,
    ids: &[&str],
    options: ProcessOptions,
) -> Result<ProcessOutput> {
    let order = registry.resolve_dependencies(ids)?;
    tracing::debug!("Resolved extension order: {:?}", order);

    let context = ProcessContext::new(Arc::new(document.clone()), order, options);
    let metadata = run_pipeline(&mut document, registry, &context).await?;

    Ok(ProcessOutput { document, metadata })
}
