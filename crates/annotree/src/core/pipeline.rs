//! Extension pipeline orchestration.
//!
//! This module drives one processing run: for each extension in resolved
//! order it validates structural prerequisites, then executes the hook
//! phases (transform, visit, enhance-metadata) against the working tree,
//! folding metadata contributions through the conflict-tracking merge.

use std::future::Future;
use std::sync::Arc;

use futures::future::try_join_all;
use tokio::sync::Semaphore;

use crate::core::context::ProcessContext;
use crate::core::merge::{FieldOwnership, MergeOptions, merge_extras};
use crate::core::validator::validate_node_requirements;
use crate::error::{AnnotreeError, Result};
use crate::extension::{Extension, ExtensionRegistry};
use crate::tree::{Node, NodeKind, collect_kind_mut};
use crate::types::{ExtensionFailure, ProcessMetadata};

/// Run every extension in the context's resolved order against `document`.
///
/// Extensions execute strictly one after another; concurrency exists only
/// inside a single extension's visit and enhance passes. The working tree
/// is mutated in place, so in strict mode a failed run leaves the effects
/// of previously applied extensions intact (no rollback).
///
/// # Errors
///
/// In strict mode the first validation or hook error aborts the run. In
/// lenient mode per-extension errors are recorded in the returned metadata
/// and the failing extension is skipped; only internal failures (a poisoned
/// context lock, an id missing from the registry snapshot) still abort.
pub(crate) async fn run_pipeline(
    document: &mut Node,
    registry: &ExtensionRegistry,
    context: &ProcessContext,
) -> Result<ProcessMetadata> {
    let mut metadata = ProcessMetadata::default();
    let mut ownership = FieldOwnership::new();

    for id in context.resolved_order() {
        let extension = registry
            .get(id)
            .ok_or_else(|| AnnotreeError::ExtensionNotFound(id.clone()))?;

        match apply_extension(&extension, document, registry, context, &mut ownership).await {
            Ok(()) => {
                metadata.applied_extensions.push(id.clone());
                context.record_applied(id)?;
            }
            Err(error) if context.options().lenient => {
                tracing::warn!("Extension '{}' failed, skipping: {}", id, error);
                metadata.errors.push(ExtensionFailure {
                    extension_id: id.clone(),
                    error,
                });
                metadata.skipped_extensions.push(id.clone());
            }
            Err(error) => return Err(error),
        }
    }

    Ok(metadata)
}

/// Execute the phases of a single extension against the working tree.
///
/// Phase order is fixed: node-requirement validation, then `transform`,
/// then one `visit` pass per declared kind, then the `enhance_metadata`
/// pass over word nodes. The first error aborts the remaining phases of
/// this extension; the caller decides whether it aborts the run.
async fn apply_extension(
    extension: &Arc<dyn Extension>,
    document: &mut Node,
    registry: &ExtensionRegistry,
    context: &ProcessContext,
    ownership: &mut FieldOwnership,
) -> Result<()> {
    let id = extension.id();
    let max_concurrent = context.options().max_concurrent_hooks;

    if let Some(error) = validate_node_requirements(extension.as_ref(), document, registry)
        .into_iter()
        .next()
    {
        return Err(error);
    }

    tracing::debug!("Applying extension '{}'", id);

    if let Some(replacement) = extension.transform(document, context).await? {
        *document = replacement;
    }

    for &kind in extension.visit_kinds() {
        let futures: Vec<_> = collect_kind_mut(document, kind)
            .into_iter()
            .map(|node| extension.visit(node, context))
            .collect();
        run_batch(futures, max_concurrent).await?;
    }

    // Enhance runs in two phases over one node collection so patches line
    // up with the words they were computed from: gather concurrently
    // through shared borrows, then merge sequentially.
    let mut words = collect_kind_mut(document, NodeKind::Word);

    let patches = {
        let futures: Vec<_> = words
            .iter()
            .map(|word| extension.enhance_metadata(word, context))
            .collect();
        run_batch(futures, max_concurrent).await?
    };

    let merge_options = MergeOptions {
        conflict_strategy: context.options().conflict_strategy,
        array_strategy: context.options().array_strategy,
    };

    for (word, patch) in words.iter_mut().zip(patches) {
        let Some(patch) = patch else { continue };
        let merged = merge_extras(word.extras(), &patch, id, ownership, &merge_options)?;
        *word.extras_mut() = merged;
    }

    Ok(())
}

/// Await a batch of hook futures, optionally capped to a concurrency limit.
///
/// The first error cancels the rest of the batch.
async fn run_batch<Fut, T>(futures: Vec<Fut>, max_concurrent: Option<usize>) -> Result<Vec<T>>
where
    Fut: Future<Output = Result<T>>,
{
    match max_concurrent {
        None => try_join_all(futures).await,
        Some(limit) => {
            let semaphore = Semaphore::new(limit.max(1));
            let guarded = futures.into_iter().map(|fut| {
                let semaphore = &semaphore;
                async move {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|_| AnnotreeError::Other("hook semaphore closed".to_string()))?;
                    fut.await
                }
            });
            try_join_all(guarded).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ConflictStrategy, ProcessOptions};
    use async_trait::async_trait;
    use serde_json::json;

    struct WordTagger {
        id: &'static str,
        value: &'static str,
    }

    #[async_trait]
    impl Extension for WordTagger {
        fn id(&self) -> &str {
            self.id
        }

        fn provided_extras(&self) -> &[&str] {
            &["tag"]
        }

        async fn enhance_metadata(
            &self,
            _word: &Node,
            _context: &ProcessContext,
        ) -> Result<Option<crate::tree::Extras>> {
            let mut patch = crate::tree::Extras::new();
            patch.insert("tag".to_string(), json!(self.value));
            Ok(Some(patch))
        }
    }

    struct FailingVisitor;

    #[async_trait]
    impl Extension for FailingVisitor {
        fn id(&self) -> &str {
            "failing-visitor"
        }

        fn visit_kinds(&self) -> &[NodeKind] {
            &[NodeKind::Word]
        }

        async fn visit(&self, _node: &mut Node, _context: &ProcessContext) -> Result<()> {
            Err(AnnotreeError::Other("visit blew up".to_string()))
        }
    }

    struct ClauseWrapper;

    #[async_trait]
    impl Extension for ClauseWrapper {
        fn id(&self) -> &str {
            "clause-wrapper"
        }

        fn provided_nodes(&self) -> &[NodeKind] {
            &[NodeKind::Clause]
        }

        async fn transform(
            &self,
            document: &mut Node,
            _context: &ProcessContext,
        ) -> Result<Option<Node>> {
            let words = crate::tree::collect_kind(document, NodeKind::Word)
                .into_iter()
                .cloned()
                .collect();
            Ok(Some(Node::root(vec![Node::sentence(vec![Node::clause(
                words,
            )])])))
        }
    }

    fn document() -> Node {
        Node::root(vec![Node::sentence(vec![
            Node::word("el"),
            Node::word("gato"),
        ])])
    }

    fn setup(
        extensions: Vec<Arc<dyn Extension>>,
        options: ProcessOptions,
    ) -> (ExtensionRegistry, ProcessContext) {
        let mut registry = ExtensionRegistry::new();
        for extension in &extensions {
            registry.register(extension.clone()).unwrap();
        }
        let ids: Vec<&str> = extensions.iter().map(|e| e.id()).collect();
        let order = registry.resolve_dependencies(&ids).unwrap();
        let context = ProcessContext::new(Arc::new(document()), order, options);
        (registry, context)
    }

    #[tokio::test]
    async fn test_enhance_patches_every_word() {
        let (registry, context) = setup(
            vec![Arc::new(WordTagger {
                id: "tagger",
                value: "seen",
            })],
            ProcessOptions::default(),
        );

        let mut doc = document();
        let metadata = run_pipeline(&mut doc, &registry, &context).await.unwrap();

        assert_eq!(metadata.applied_extensions, vec!["tagger"]);
        for word in crate::tree::collect_kind(&doc, NodeKind::Word) {
            assert_eq!(word.extras()["tag"], json!("seen"));
        }
    }

    #[tokio::test]
    async fn test_strict_mode_aborts_on_hook_error() {
        let (registry, context) = setup(vec![Arc::new(FailingVisitor)], ProcessOptions::default());

        let mut doc = document();
        let err = run_pipeline(&mut doc, &registry, &context).await.unwrap_err();
        assert!(matches!(err, AnnotreeError::Other(_)));
    }

    #[tokio::test]
    async fn test_lenient_mode_records_and_continues() {
        let options = ProcessOptions {
            lenient: true,
            ..ProcessOptions::default()
        };
        let (registry, context) = setup(
            vec![
                Arc::new(FailingVisitor),
                Arc::new(WordTagger {
                    id: "tagger",
                    value: "seen",
                }),
            ],
            options,
        );

        let mut doc = document();
        let metadata = run_pipeline(&mut doc, &registry, &context).await.unwrap();

        assert_eq!(metadata.skipped_extensions, vec!["failing-visitor"]);
        assert_eq!(metadata.errors.len(), 1);
        assert_eq!(metadata.errors[0].extension_id, "failing-visitor");
        assert_eq!(metadata.applied_extensions, vec!["tagger"]);
        for word in crate::tree::collect_kind(&doc, NodeKind::Word) {
            assert_eq!(word.extras()["tag"], json!("seen"));
        }
    }

    #[tokio::test]
    async fn test_transform_replacement_feeds_later_extensions() {
        struct RequiresClause;

        #[async_trait]
        impl Extension for RequiresClause {
            fn id(&self) -> &str {
                "requires-clause"
            }

            fn dependencies(&self) -> &[&str] {
                &["clause-wrapper"]
            }

            fn required_nodes(&self) -> &[NodeKind] {
                &[NodeKind::Clause]
            }
        }

        let (registry, context) = setup(
            vec![Arc::new(ClauseWrapper), Arc::new(RequiresClause)],
            ProcessOptions::default(),
        );

        let mut doc = document();
        let metadata = run_pipeline(&mut doc, &registry, &context).await.unwrap();

        assert_eq!(
            metadata.applied_extensions,
            vec!["clause-wrapper", "requires-clause"]
        );
        assert!(crate::tree::contains_kind(&doc, NodeKind::Clause));
    }

    #[tokio::test]
    async fn test_missing_requirement_fails_validation() {
        struct RequiresClause;

        impl Extension for RequiresClause {
            fn id(&self) -> &str {
                "requires-clause"
            }

            fn required_nodes(&self) -> &[NodeKind] {
                &[NodeKind::Clause]
            }
        }

        let (registry, context) =
            setup(vec![Arc::new(RequiresClause)], ProcessOptions::default());

        let mut doc = document();
        let err = run_pipeline(&mut doc, &registry, &context).await.unwrap_err();
        assert!(matches!(err, AnnotreeError::MissingNodeType { .. }));
    }

    #[tokio::test]
    async fn test_conflicting_writers_error_names_field_path() {
        let (registry, context) = setup(
            vec![
                Arc::new(WordTagger {
                    id: "freq",
                    value: "common",
                }),
                Arc::new(WordTagger {
                    id: "freq2",
                    value: "rare",
                }),
            ],
            ProcessOptions::default(),
        );

        let mut doc = document();
        let err = run_pipeline(&mut doc, &registry, &context).await.unwrap_err();

        match err {
            AnnotreeError::MergeConflict {
                field_path,
                existing_extension,
                incoming_extension,
                ..
            } => {
                assert_eq!(field_path, "tag");
                assert_eq!(existing_extension, "freq");
                assert_eq!(incoming_extension, "freq2");
            }
            other => panic!("expected MergeConflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_last_wins_keeps_processing() {
        let options = ProcessOptions {
            conflict_strategy: ConflictStrategy::LastWins,
            ..ProcessOptions::default()
        };
        let (registry, context) = setup(
            vec![
                Arc::new(WordTagger {
                    id: "freq",
                    value: "common",
                }),
                Arc::new(WordTagger {
                    id: "freq2",
                    value: "rare",
                }),
            ],
            options,
        );

        let mut doc = document();
        let metadata = run_pipeline(&mut doc, &registry, &context).await.unwrap();

        assert_eq!(metadata.applied_extensions, vec!["freq", "freq2"]);
        for word in crate::tree::collect_kind(&doc, NodeKind::Word) {
            assert_eq!(word.extras()["tag"], json!("rare"));
        }
    }

    #[tokio::test]
    async fn test_visit_not_called_without_declared_kinds() {
        struct UndeclaredVisitor;

        #[async_trait]
        impl Extension for UndeclaredVisitor {
            fn id(&self) -> &str {
                "undeclared"
            }

            async fn visit(&self, node: &mut Node, _context: &ProcessContext) -> Result<()> {
                node.extras_mut().insert("visited".to_string(), json!(true));
                Ok(())
            }
        }

        let (registry, context) =
            setup(vec![Arc::new(UndeclaredVisitor)], ProcessOptions::default());

        let mut doc = document();
        let before = doc.clone();
        let metadata = run_pipeline(&mut doc, &registry, &context).await.unwrap();

        assert_eq!(metadata.applied_extensions, vec!["undeclared"]);
        assert_eq!(doc, before);
    }

    #[tokio::test]
    async fn test_hookless_extension_is_applied_without_touching_tree() {
        struct DeclarationsOnly;

        impl Extension for DeclarationsOnly {
            fn id(&self) -> &str {
                "declarations-only"
            }
        }

        let (registry, context) =
            setup(vec![Arc::new(DeclarationsOnly)], ProcessOptions::default());

        let mut doc = document();
        let before = doc.clone();
        let metadata = run_pipeline(&mut doc, &registry, &context).await.unwrap();

        assert_eq!(metadata.applied_extensions, vec!["declarations-only"]);
        assert!(metadata.skipped_extensions.is_empty());
        assert!(metadata.errors.is_empty());
        assert_eq!(doc, before);
    }

    #[tokio::test]
    async fn test_context_reports_applied_extensions_to_later_hooks() {
        struct Inspector;

        #[async_trait]
        impl Extension for Inspector {
            fn id(&self) -> &str {
                "inspector"
            }

            fn dependencies(&self) -> &[&str] {
                &["tagger"]
            }

            async fn enhance_metadata(
                &self,
                _word: &Node,
                context: &ProcessContext,
            ) -> Result<Option<crate::tree::Extras>> {
                let mut patch = crate::tree::Extras::new();
                patch.insert(
                    "tagger_ran".to_string(),
                    json!(context.was_applied("tagger")),
                );
                Ok(Some(patch))
            }
        }

        let (registry, context) = setup(
            vec![
                Arc::new(WordTagger {
                    id: "tagger",
                    value: "seen",
                }),
                Arc::new(Inspector),
            ],
            ProcessOptions::default(),
        );

        let mut doc = document();
        run_pipeline(&mut doc, &registry, &context).await.unwrap();

        for word in crate::tree::collect_kind(&doc, NodeKind::Word) {
            assert_eq!(word.extras()["tagger_ran"], json!(true));
        }
    }

    #[tokio::test]
    async fn test_capped_concurrency_matches_uncapped() {
        let capped = ProcessOptions {
            max_concurrent_hooks: Some(2),
            ..ProcessOptions::default()
        };

        let mut uncapped_doc = document();
        let mut capped_doc = document();

        let (registry, context) = setup(
            vec![Arc::new(WordTagger {
                id: "tagger",
                value: "seen",
            })],
            ProcessOptions::default(),
        );
        run_pipeline(&mut uncapped_doc, &registry, &context)
            .await
            .unwrap();

        let (registry, context) = setup(
            vec![Arc::new(WordTagger {
                id: "tagger",
                value: "seen",
            })],
            capped,
        );
        run_pipeline(&mut capped_doc, &registry, &context)
            .await
            .unwrap();

        assert_eq!(uncapped_doc, capped_doc);
    }
}
