//! Processing options.
//!
//! Options are plain serde structs: build them programmatically, or load them
//! from TOML/JSON files supplied by the host application. Missing keys take
//! their defaults; unknown keys are ignored.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{AnnotreeError, Result};

/// Conflict policy applied when two different extensions write the same leaf
/// extras field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    /// Fail the writing extension with [`AnnotreeError::MergeConflict`].
    #[default]
    Error,
    /// Log a warning and let the incoming value win.
    Warn,
    /// Silently let the incoming value win.
    LastWins,
}

/// Combination policy for arrays present on both sides of a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayStrategy {
    /// Append the incoming elements after the existing ones.
    #[default]
    Concat,
    /// Append only incoming elements not already present (structural equality).
    Unique,
    /// The incoming array wins wholesale.
    Replace,
}

/// Options for one processing run.
///
/// # Example
///
/// ```rust
/// use annotree::{ConflictStrategy, ProcessOptions};
///
/// let options = ProcessOptions {
///     lenient: true,
///     conflict_strategy: ConflictStrategy::Warn,
///     ..ProcessOptions::default()
/// };
/// assert!(options.lenient);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// Record failing extensions in the run metadata and keep going instead of
    /// aborting on the first error. Defaults to `false` (strict).
    #[serde(default)]
    pub lenient: bool,

    /// Conflict policy forwarded into every metadata merge.
    #[serde(default)]
    pub conflict_strategy: ConflictStrategy,

    /// Array policy forwarded into every metadata merge.
    #[serde(default)]
    pub array_strategy: ArrayStrategy,

    /// Maximum in-flight hook futures per visit/enhance pass (None = unbounded).
    ///
    /// Bounds memory and downstream pressure when an extension's async hooks
    /// fan out over very large documents.
    #[serde(default)]
    pub max_concurrent_hooks: Option<usize>,
}

impl ProcessOptions {
    /// Load options from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `AnnotreeError::Config` if the file cannot be read or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AnnotreeError::config(format!(
                "Failed to read options file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            AnnotreeError::config(format!("Invalid TOML in {}: {}", path.as_ref().display(), e))
        })
    }

    /// Load options from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `AnnotreeError::Config` if the file cannot be read or is invalid JSON.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AnnotreeError::config(format!(
                "Failed to read options file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            AnnotreeError::config(format!("Invalid JSON in {}: {}", path.as_ref().display(), e))
        })
    }
}
