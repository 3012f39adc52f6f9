//! Extension registry and dependency resolution.
//!
//! Thread-safe storage for [`Extension`] implementations, keyed by id and
//! iterated in registration order, plus the resolver that turns a requested
//! set of extension ids into a valid execution order.
//!
//! A process-wide singleton registry backs the free-function facade
//! ([`register_extension`], [`get_extension`] and friends). Code that wants
//! isolated registries can construct [`ExtensionRegistry`] directly.

use std::sync::{Arc, RwLock};

use ahash::{AHashMap, AHashSet};
use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::error::{AnnotreeError, Result};
use crate::extension::traits::Extension;
use crate::tree::NodeKind;

/// Validates an extension id.
fn validate_extension_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(AnnotreeError::Validation {
            message: "Extension id cannot be empty".to_string(),
            source: None,
        });
    }

    if id.contains(char::is_whitespace) {
        return Err(AnnotreeError::Validation {
            message: format!("Extension id '{}' cannot contain whitespace", id),
            source: None,
        });
    }

    Ok(())
}

/// Depth-first search state used by dependency resolution.
#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitMark {
    InProgress,
    Done,
}

/// Registry for annotation extensions.
///
/// Stores extensions keyed by id in registration order, so listings and
/// provider lookups are deterministic. Registering an id twice replaces the
/// earlier extension and logs a warning.
#[derive(Clone)]
pub struct ExtensionRegistry {
    extensions: IndexMap<String, Arc<dyn Extension>>,
}

impl ExtensionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            extensions: IndexMap::new(),
        }
    }

    /// Register an extension under its own id.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the id is empty or contains whitespace.
    pub fn register(&mut self, extension: Arc<dyn Extension>) -> Result<()> {
        let id = extension.id().to_string();
        validate_extension_id(&id)?;

        if self.extensions.contains_key(&id) {
            tracing::warn!("Overwriting existing extension: {}", id);
        }

        self.extensions.insert(id, extension);
        Ok(())
    }

    /// Get an extension by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Extension>> {
        self.extensions.get(id).cloned()
    }

    /// Check whether an id is registered.
    pub fn has(&self, id: &str) -> bool {
        self.extensions.contains_key(id)
    }

    /// Remove an extension by id. Returns whether it was present.
    pub fn unregister(&mut self, id: &str) -> bool {
        self.extensions.shift_remove(id).is_some()
    }

    /// All registered extensions, in registration order.
    pub fn all(&self) -> Vec<Arc<dyn Extension>> {
        self.extensions.values().cloned().collect()
    }

    /// All registered ids, in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.extensions.keys().cloned().collect()
    }

    /// Number of registered extensions.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Remove every registered extension.
    pub fn clear(&mut self) {
        self.extensions.clear();
    }

    /// Find an extension other than `exclude_id` that declares `kind` in its
    /// provided node kinds.
    ///
    /// Used to suggest a fix when a structural prerequisite is missing from a
    /// document: if some registered extension could have created the missing
    /// kind, its id is worth naming in the error.
    pub fn find_provider(&self, kind: NodeKind, exclude_id: &str) -> Option<String> {
        self.extensions
            .iter()
            .find(|(id, ext)| id.as_str() != exclude_id && ext.provided_nodes().contains(&kind))
            .map(|(id, _)| id.clone())
    }

    /// Resolve a requested set of extension ids into execution order.
    ///
    /// Performs a depth-first topological sort over the dependency subgraph
    /// induced by `ids`: every requested dependency of a requested extension
    /// is ordered before it, independent extensions keep their first-requested
    /// relative order, and duplicate ids collapse into one occurrence.
    ///
    /// A dependency that is registered but not part of `ids` is checked for
    /// existence and then left out of the order; the caller opted not to run
    /// it. A dependency id that is not registered at all is an error even
    /// when unrequested.
    ///
    /// # Errors
    ///
    /// - [`AnnotreeError::ExtensionNotFound`] if any requested or referenced
    ///   id is not registered
    /// - [`AnnotreeError::DependencyCycle`] if the induced subgraph contains
    ///   a cycle
    pub fn resolve_dependencies(&self, ids: &[&str]) -> Result<Vec<String>> {
        let in_run: AHashSet<&str> = ids.iter().copied().collect();
        let mut marks: AHashMap<String, VisitMark> = AHashMap::new();
        let mut order = Vec::with_capacity(ids.len());

        for id in ids {
            self.visit_in_order(id, &in_run, &mut marks, &mut order)?;
        }

        Ok(order)
    }

    fn visit_in_order(
        &self,
        id: &str,
        in_run: &AHashSet<&str>,
        marks: &mut AHashMap<String, VisitMark>,
        order: &mut Vec<String>,
    ) -> Result<()> {
        match marks.get(id) {
            Some(VisitMark::Done) => return Ok(()),
            Some(VisitMark::InProgress) => {
                return Err(AnnotreeError::DependencyCycle(id.to_string()));
            }
            None => {}
        }

        let extension = self
            .get(id)
            .ok_or_else(|| AnnotreeError::ExtensionNotFound(id.to_string()))?;

        marks.insert(id.to_string(), VisitMark::InProgress);

        for &dep in extension.dependencies() {
            if !self.has(dep) {
                return Err(AnnotreeError::ExtensionNotFound(dep.to_string()));
            }
            if in_run.contains(dep) {
                self.visit_in_order(dep, in_run, marks, order)?;
            }
        }

        marks.insert(id.to_string(), VisitMark::Done);
        order.push(id.to_string());
        Ok(())
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global extension registry singleton.
pub static EXTENSION_REGISTRY: Lazy<Arc<RwLock<ExtensionRegistry>>> =
    Lazy::new(|| Arc::new(RwLock::new(ExtensionRegistry::new())));

/// Get the global extension registry.
pub fn get_extension_registry() -> Arc<RwLock<ExtensionRegistry>> {
    EXTENSION_REGISTRY.clone()
}

/// Register an extension in the global registry.
///
/// # Arguments
///
/// * `extension` - The extension to register, shared via `Arc`
///
/// # Returns
///
/// - `Ok(())` if the extension was registered
/// - `Err(...)` if its id is invalid or the registry lock is poisoned
///
/// # Example
///
/// ```rust
/// use annotree::extension::{register_extension, Extension};
/// use std::sync::Arc;
///
/// struct SyllableCounter;
///
/// impl Extension for SyllableCounter {
///     fn id(&self) -> &str {
///         "syllable-counter"
///     }
/// }
///
/// register_extension(Arc::new(SyllableCounter))?;
/// # Ok::<(), annotree::AnnotreeError>(())
/// ```
pub fn register_extension(extension: Arc<dyn Extension>) -> Result<()> {
    let registry = get_extension_registry();
    let mut registry = registry
        .write()
        .map_err(|_| AnnotreeError::LockPoisoned("extension registry lock poisoned".to_string()))?;

    registry.register(extension)
}

/// Register several extensions in the global registry at once.
///
/// Extensions are registered in the given order under a single lock
/// acquisition. Stops at the first invalid id; extensions registered before
/// the failure stay registered.
pub fn register_extensions(extensions: Vec<Arc<dyn Extension>>) -> Result<()> {
    let registry = get_extension_registry();
    let mut registry = registry
        .write()
        .map_err(|_| AnnotreeError::LockPoisoned("extension registry lock poisoned".to_string()))?;

    for extension in extensions {
        registry.register(extension)?;
    }

    Ok(())
}

/// Look up an extension in the global registry by id.
pub fn get_extension(id: &str) -> Result<Option<Arc<dyn Extension>>> {
    let registry = get_extension_registry();
    let registry = registry
        .read()
        .map_err(|_| AnnotreeError::LockPoisoned("extension registry lock poisoned".to_string()))?;

    Ok(registry.get(id))
}

/// All extensions in the global registry, in registration order.
pub fn get_all_extensions() -> Result<Vec<Arc<dyn Extension>>> {
    let registry = get_extension_registry();
    let registry = registry
        .read()
        .map_err(|_| AnnotreeError::LockPoisoned("extension registry lock poisoned".to_string()))?;

    Ok(registry.all())
}

/// List the ids of all extensions in the global registry.
///
/// # Example
///
/// ```rust
/// use annotree::extension::list_extension_ids;
///
/// for id in list_extension_ids()? {
///     println!("Registered extension: {}", id);
/// }
/// # Ok::<(), annotree::AnnotreeError>(())
/// ```
pub fn list_extension_ids() -> Result<Vec<String>> {
    let registry = get_extension_registry();
    let registry = registry
        .read()
        .map_err(|_| AnnotreeError::LockPoisoned("extension registry lock poisoned".to_string()))?;

    Ok(registry.ids())
}

/// Remove an extension from the global registry by id.
///
/// Returns whether the id was registered.
pub fn unregister_extension(id: &str) -> Result<bool> {
    let registry = get_extension_registry();
    let mut registry = registry
        .write()
        .map_err(|_| AnnotreeError::LockPoisoned("extension registry lock poisoned".to_string()))?;

    Ok(registry.unregister(id))
}

/// Clear all extensions from the global registry.
pub fn clear_extensions() -> Result<()> {
    let registry = get_extension_registry();
    let mut registry = registry
        .write()
        .map_err(|_| AnnotreeError::LockPoisoned("extension registry lock poisoned".to_string()))?;

    registry.clear();
    Ok(())
}
