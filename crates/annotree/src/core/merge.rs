//! Deep merge of extras maps with per-field ownership tracking.
//!
//! Metadata contributions from [`enhance_metadata`](crate::Extension::enhance_metadata)
//! are folded into a word's extras here. The merge is recursive and
//! non-destructive: inputs are never mutated, a new map is returned.
//! Ownership of every written leaf path is tracked per run so a later
//! extension overwriting an earlier extension's value is detected as a
//! conflict, while enrichment of caller-provided document data stays silent.

use ahash::AHashMap;
use serde_json::Value;

use crate::core::config::{ArrayStrategy, ConflictStrategy};
use crate::error::{AnnotreeError, Result};
use crate::tree::Extras;

/// Which extension last wrote each extras field path, for one processing run.
///
/// Paths are dotted (`"frequency.level"`) and name leaf values only; a
/// nested map is represented by its leaves. Paths with no entry belong to
/// the caller's original document and may be overwritten freely.
#[derive(Debug, Default)]
pub struct FieldOwnership {
    owners: AHashMap<String, String>,
}

impl FieldOwnership {
    /// Create an empty ownership map.
    pub fn new() -> Self {
        Self::default()
    }

    /// The extension id recorded for `path`, if any.
    pub fn owner_of(&self, path: &str) -> Option<&str> {
        self.owners.get(path).map(String::as_str)
    }

    /// Record `extension_id` as the owner of `path`, replacing any prior owner.
    pub fn record(&mut self, path: impl Into<String>, extension_id: impl Into<String>) {
        self.owners.insert(path.into(), extension_id.into());
    }

    /// Number of tracked paths.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Whether any path has been recorded.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Strategies applied during one merge call.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    pub conflict_strategy: ConflictStrategy,
    pub array_strategy: ArrayStrategy,
}

/// Merge `source` into `target`, attributing written fields to `writer`.
///
/// Rules, applied recursively:
///
/// - keys present only in `source` are copied in
/// - two maps recurse
/// - two arrays combine per [`ArrayStrategy`]
/// - anything else is a leaf overwrite: silent when the existing value has
///   no recorded owner or is owned by `writer` itself, otherwise resolved
///   per [`ConflictStrategy`]
///
/// On success every leaf path `source` touched is recorded in `ownership`
/// against `writer`. On error `ownership` is left untouched, so a failed
/// contribution never claims fields.
pub fn merge_extras(
    target: &Extras,
    source: &Extras,
    writer: &str,
    ownership: &mut FieldOwnership,
    options: &MergeOptions,
) -> Result<Extras> {
    let merged = merge_maps(target, source, writer, "", ownership, options)?;
    record_source_paths(source, "", writer, ownership);
    Ok(merged)
}

fn merge_maps(
    target: &Extras,
    source: &Extras,
    writer: &str,
    prefix: &str,
    ownership: &FieldOwnership,
    options: &MergeOptions,
) -> Result<Extras> {
    let mut merged = target.clone();

    for (key, incoming) in source {
        let path = join_path(prefix, key);
        let value = match merged.get(key) {
            Some(existing) => merge_values(existing, incoming, writer, &path, ownership, options)?,
            None => incoming.clone(),
        };
        merged.insert(key.clone(), value);
    }

    Ok(merged)
}

fn merge_values(
    existing: &Value,
    incoming: &Value,
    writer: &str,
    path: &str,
    ownership: &FieldOwnership,
    options: &MergeOptions,
) -> Result<Value> {
    match (existing, incoming) {
        (Value::Object(existing_map), Value::Object(incoming_map)) => Ok(Value::Object(
            merge_maps(existing_map, incoming_map, writer, path, ownership, options)?,
        )),
        (Value::Array(existing_items), Value::Array(incoming_items)) => Ok(Value::Array(
            merge_arrays(existing_items, incoming_items, options.array_strategy),
        )),
        _ => match ownership.owner_of(path) {
            None => Ok(incoming.clone()),
            Some(owner) if owner == writer => Ok(incoming.clone()),
            Some(owner) => match options.conflict_strategy {
                ConflictStrategy::Error => Err(AnnotreeError::MergeConflict {
                    field_path: path.to_string(),
                    existing_extension: owner.to_string(),
                    incoming_extension: writer.to_string(),
                    existing_value: existing.clone(),
                    incoming_value: incoming.clone(),
                }),
                ConflictStrategy::Warn => {
                    tracing::warn!(
                        "Conflicting write to '{}': extension '{}' overwrites value owned by '{}'",
                        path,
                        writer,
                        owner
                    );
                    Ok(incoming.clone())
                }
                ConflictStrategy::LastWins => Ok(incoming.clone()),
            },
        },
    }
}

fn merge_arrays(existing: &[Value], incoming: &[Value], strategy: ArrayStrategy) -> Vec<Value> {
    match strategy {
        ArrayStrategy::Concat => existing.iter().chain(incoming).cloned().collect(),
        ArrayStrategy::Unique => {
            let mut merged = existing.to_vec();
            for item in incoming {
                // Uniqueness applies to primitives; containers are appended as-is.
                let is_primitive = !item.is_object() && !item.is_array();
                if is_primitive && merged.contains(item) {
                    continue;
                }
                merged.push(item.clone());
            }
            merged
        }
        ArrayStrategy::Replace => incoming.to_vec(),
    }
}

fn record_source_paths(source: &Extras, prefix: &str, writer: &str, ownership: &mut FieldOwnership) {
    for (key, value) in source {
        let path = join_path(prefix, key);
        match value {
            Value::Object(map) => record_source_paths(map, &path, writer, ownership),
            _ => ownership.record(path, writer),
        }
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extras(value: Value) -> Extras {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_keys_only_in_source_are_copied() {
        let target = extras(json!({"existing": 1}));
        let source = extras(json!({"added": "value"}));
        let mut ownership = FieldOwnership::new();

        let merged = merge_extras(&target, &source, "ext", &mut ownership, &MergeOptions::default())
            .unwrap();

        assert_eq!(merged["existing"], json!(1));
        assert_eq!(merged["added"], json!("value"));
    }

    #[test]
    fn test_nested_maps_recurse() {
        let target = extras(json!({"pos": {"tag": "noun"}}));
        let source = extras(json!({"pos": {"confidence": 0.9}}));
        let mut ownership = FieldOwnership::new();

        let merged = merge_extras(&target, &source, "ext", &mut ownership, &MergeOptions::default())
            .unwrap();

        assert_eq!(merged["pos"]["tag"], json!("noun"));
        assert_eq!(merged["pos"]["confidence"], json!(0.9));
    }

    #[test]
    fn test_array_concat() {
        let target = extras(json!({"tags": ["a", "b"]}));
        let source = extras(json!({"tags": ["b", "c"]}));
        let mut ownership = FieldOwnership::new();

        let merged = merge_extras(&target, &source, "ext", &mut ownership, &MergeOptions::default())
            .unwrap();

        assert_eq!(merged["tags"], json!(["a", "b", "b", "c"]));
    }

    #[test]
    fn test_array_unique_dedupes_primitives() {
        let target = extras(json!({"tags": ["a", "b"]}));
        let source = extras(json!({"tags": ["b", "c"]}));
        let mut ownership = FieldOwnership::new();
        let options = MergeOptions {
            array_strategy: ArrayStrategy::Unique,
            ..MergeOptions::default()
        };

        let merged = merge_extras(&target, &source, "ext", &mut ownership, &options).unwrap();
        assert_eq!(merged["tags"], json!(["a", "b", "c"]));
    }

    #[test]
    fn test_array_unique_keeps_duplicate_containers() {
        let target = extras(json!({"spans": [{"start": 0}]}));
        let source = extras(json!({"spans": [{"start": 0}]}));
        let mut ownership = FieldOwnership::new();
        let options = MergeOptions {
            array_strategy: ArrayStrategy::Unique,
            ..MergeOptions::default()
        };

        let merged = merge_extras(&target, &source, "ext", &mut ownership, &options).unwrap();
        assert_eq!(merged["spans"], json!([{"start": 0}, {"start": 0}]));
    }

    #[test]
    fn test_array_replace() {
        let target = extras(json!({"tags": ["a", "b"]}));
        let source = extras(json!({"tags": ["c"]}));
        let mut ownership = FieldOwnership::new();
        let options = MergeOptions {
            array_strategy: ArrayStrategy::Replace,
            ..MergeOptions::default()
        };

        let merged = merge_extras(&target, &source, "ext", &mut ownership, &options).unwrap();
        assert_eq!(merged["tags"], json!(["c"]));
    }

    #[test]
    fn test_caller_data_overwritten_silently() {
        let target = extras(json!({"frequency": "unknown"}));
        let source = extras(json!({"frequency": "common"}));
        let mut ownership = FieldOwnership::new();

        let merged = merge_extras(&target, &source, "freq", &mut ownership, &MergeOptions::default())
            .unwrap();

        assert_eq!(merged["frequency"], json!("common"));
    }

    #[test]
    fn test_cross_extension_conflict_errors() {
        let word_extras = Extras::new();
        let mut ownership = FieldOwnership::new();
        let options = MergeOptions::default();

        let first = extras(json!({"frequency": {"level": "common"}}));
        let merged = merge_extras(&word_extras, &first, "freq", &mut ownership, &options).unwrap();
        assert_eq!(ownership.owner_of("frequency.level"), Some("freq"));

        let second = extras(json!({"frequency": {"level": "rare"}}));
        let err = merge_extras(&merged, &second, "freq2", &mut ownership, &options).unwrap_err();

        match err {
            AnnotreeError::MergeConflict {
                field_path,
                existing_extension,
                incoming_extension,
                existing_value,
                incoming_value,
            } => {
                assert_eq!(field_path, "frequency.level");
                assert_eq!(existing_extension, "freq");
                assert_eq!(incoming_extension, "freq2");
                assert_eq!(existing_value, json!("common"));
                assert_eq!(incoming_value, json!("rare"));
            }
            other => panic!("expected MergeConflict, got {:?}", other),
        }
    }

    #[test]
    fn test_conflict_warn_lets_source_win() {
        let mut ownership = FieldOwnership::new();
        ownership.record("level", "first");
        let options = MergeOptions {
            conflict_strategy: ConflictStrategy::Warn,
            ..MergeOptions::default()
        };

        let target = extras(json!({"level": "a"}));
        let source = extras(json!({"level": "b"}));
        let merged = merge_extras(&target, &source, "second", &mut ownership, &options).unwrap();

        assert_eq!(merged["level"], json!("b"));
        assert_eq!(ownership.owner_of("level"), Some("second"));
    }

    #[test]
    fn test_conflict_last_wins() {
        let mut ownership = FieldOwnership::new();
        ownership.record("level", "first");
        let options = MergeOptions {
            conflict_strategy: ConflictStrategy::LastWins,
            ..MergeOptions::default()
        };

        let target = extras(json!({"level": "a"}));
        let source = extras(json!({"level": "b"}));
        let merged = merge_extras(&target, &source, "second", &mut ownership, &options).unwrap();

        assert_eq!(merged["level"], json!("b"));
    }

    #[test]
    fn test_same_extension_rewrites_own_field() {
        let mut ownership = FieldOwnership::new();
        ownership.record("score", "scorer");

        let target = extras(json!({"score": 1}));
        let source = extras(json!({"score": 2}));
        let merged = merge_extras(&target, &source, "scorer", &mut ownership, &MergeOptions::default())
            .unwrap();

        assert_eq!(merged["score"], json!(2));
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let target = extras(json!({"a": {"x": 1}, "tags": [1]}));
        let source = extras(json!({"a": {"y": 2}, "tags": [2]}));
        let target_before = target.clone();
        let source_before = source.clone();
        let mut ownership = FieldOwnership::new();

        let _ = merge_extras(&target, &source, "ext", &mut ownership, &MergeOptions::default())
            .unwrap();

        assert_eq!(target, target_before);
        assert_eq!(source, source_before);
    }

    #[test]
    fn test_ownership_not_recorded_on_failed_merge() {
        let mut ownership = FieldOwnership::new();
        ownership.record("level", "first");

        let target = extras(json!({"level": "a"}));
        let source = extras(json!({"level": "b", "untouched": true}));
        let result = merge_extras(&target, &source, "second", &mut ownership, &MergeOptions::default());

        assert!(result.is_err());
        assert_eq!(ownership.owner_of("untouched"), None);
        assert_eq!(ownership.owner_of("level"), Some("first"));
    }

    #[test]
    fn test_ownership_records_nested_leaf_paths() {
        let target = Extras::new();
        let source = extras(json!({"pos": {"tag": "noun", "scores": [0.1]}, "seen": true}));
        let mut ownership = FieldOwnership::new();

        let _ = merge_extras(&target, &source, "tagger", &mut ownership, &MergeOptions::default())
            .unwrap();

        assert_eq!(ownership.owner_of("pos.tag"), Some("tagger"));
        assert_eq!(ownership.owner_of("pos.scores"), Some("tagger"));
        assert_eq!(ownership.owner_of("seen"), Some("tagger"));
        assert_eq!(ownership.owner_of("pos"), None);
    }

    #[test]
    fn test_leaf_over_map_checks_exact_path_owner() {
        let mut ownership = FieldOwnership::new();
        ownership.record("pos.tag", "tagger");

        let target = extras(json!({"pos": {"tag": "noun"}}));
        let source = extras(json!({"pos": "collapsed"}));
        let merged = merge_extras(&target, &source, "other", &mut ownership, &MergeOptions::default())
            .unwrap();

        assert_eq!(merged["pos"], json!("collapsed"));
    }
}
