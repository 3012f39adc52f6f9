//! Per-run processing context.

use std::sync::{Arc, RwLock};

use crate::core::config::ProcessOptions;
use crate::error::{AnnotreeError, Result};
use crate::tree::Node;

/// Ephemeral state for one `process*` call, visible to every hook.
///
/// Created fresh by the processor and dropped when the call returns.
/// Extensions use it to inspect the pre-processing document, the resolved
/// execution order, and which extensions have already been applied in this
/// run (so a later extension can distinguish "my dependency was absent" from
/// "my dependency ran but contributed nothing").
///
/// Hooks receive `&ProcessContext`; the applied list uses interior mutability
/// because hook futures for many nodes hold the context concurrently.
#[derive(Debug)]
pub struct ProcessContext {
    original: Arc<Node>,
    resolved_order: Vec<String>,
    applied: RwLock<Vec<String>>,
    options: ProcessOptions,
}

impl ProcessContext {
    pub(crate) fn new(
        original: Arc<Node>,
        resolved_order: Vec<String>,
        options: ProcessOptions,
    ) -> Self {
        Self {
            original,
            resolved_order,
            applied: RwLock::new(Vec::new()),
            options,
        }
    }

    /// The document as it was before any extension ran.
    pub fn original(&self) -> &Node {
        &self.original
    }

    /// Extension ids in the order the processor runs them.
    pub fn resolved_order(&self) -> &[String] {
        &self.resolved_order
    }

    /// Ids of the extensions fully applied so far in this run.
    pub fn applied_extensions(&self) -> Vec<String> {
        self.applied.read().map(|a| a.clone()).unwrap_or_default()
    }

    /// Whether the given extension has already been applied in this run.
    pub fn was_applied(&self, id: &str) -> bool {
        self.applied
            .read()
            .map(|a| a.iter().any(|applied| applied == id))
            .unwrap_or(false)
    }

    /// The caller-supplied options, passed through unchanged.
    pub fn options(&self) -> &ProcessOptions {
        &self.options
    }

    pub(crate) fn record_applied(&self, id: &str) -> Result<()> {
        let mut applied = self
            .applied
            .write()
            .map_err(|_| AnnotreeError::LockPoisoned("process context applied list".to_string()))?;
        applied.push(id.to_string());
        Ok(())
    }
}
