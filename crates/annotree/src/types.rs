//! Result types returned by processing runs.

use crate::error::AnnotreeError;
use crate::tree::Node;

/// Result of one processing run: the final tree plus run bookkeeping.
#[derive(Debug)]
pub struct ProcessOutput {
    /// The working tree after all applied extensions.
    pub document: Node,
    /// What ran, what was skipped, and why.
    pub metadata: ProcessMetadata,
}

/// Bookkeeping for one processing run.
///
/// `errors` holds live [`AnnotreeError`] values so callers can match on
/// variants instead of re-parsing message strings.
#[derive(Debug, Default)]
pub struct ProcessMetadata {
    /// Ids of extensions whose phases all completed, in execution order.
    pub applied_extensions: Vec<String>,
    /// Ids of extensions skipped in lenient mode, in encounter order.
    pub skipped_extensions: Vec<String>,
    /// One entry per skipped extension.
    pub errors: Vec<ExtensionFailure>,
}

/// A per-extension failure recorded during a lenient run.
#[derive(Debug)]
pub struct ExtensionFailure {
    /// Id of the extension whose validation or hook failed.
    pub extension_id: String,
    /// The error that caused the skip.
    pub error: AnnotreeError,
}
