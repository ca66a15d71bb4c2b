// SPDX-License-Identifier: Apache-2.0
//! C1: builds the fixed, deduplicated analyzer set for a project from its
//! registered [`AnalyzerReference`]s.

use std::collections::HashSet;

use rdc_common::AnalyzerId;

use crate::{
    host::AnalyzerReference,
    model::{AnalyzerHandle, AnalyzerIdMap, ProjectHandle},
};

/// Builds the analyzer set bound to `project`: every analyzer every
/// reference contributes for its language, minus the project's
/// `host_only_analyzers`.
///
/// Deduplication is by [`AnalyzerReference::id`], before `analyzers_for` is
/// ever called (invariant 3): a reference whose id was already seen is
/// skipped outright, not called again and filtered afterward.
///
/// The order analyzers first appear in (by reference, then by that
/// reference's own order) is preserved; that order becomes the context's
/// iteration order for telemetry and result shaping.
pub fn build_analyzer_set(
    project: &ProjectHandle,
    references: &[Box<dyn AnalyzerReference>],
) -> (Vec<AnalyzerHandle>, AnalyzerIdMap) {
    let mut ordered = Vec::new();
    let mut map = AnalyzerIdMap::default();
    let mut seen_references = HashSet::new();

    for reference in references {
        if !seen_references.insert(reference.id()) {
            continue;
        }
        for analyzer in reference.analyzers_for(&project.language) {
            let id = AnalyzerId::new(analyzer.name());
            if project.host_only_analyzers().contains(&id) {
                continue;
            }
            map.insert(id, analyzer.clone());
            ordered.push(analyzer);
        }
    }

    (ordered, map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReferenceId;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    struct Fixed {
        id: ReferenceId,
        names: Vec<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl AnalyzerReference for Fixed {
        fn id(&self) -> ReferenceId {
            self.id
        }

        fn analyzers_for(&self, _language: &str) -> Vec<AnalyzerHandle> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.names.iter().map(|n| AnalyzerHandle::new(*n)).collect()
        }
    }

    #[test]
    fn deduplicates_across_references_with_distinct_ids() {
        let project = ProjectHandle::new(rdc_common::ProjectId::new("p"), "rust", [], []);
        let calls = Arc::new(AtomicUsize::new(0));
        let refs: Vec<Box<dyn AnalyzerReference>> = vec![
            Box::new(Fixed {
                id: ReferenceId(1),
                names: vec!["a", "b"],
                calls: calls.clone(),
            }),
            Box::new(Fixed {
                id: ReferenceId(2),
                names: vec!["c"],
                calls,
            }),
        ];

        let (analyzers, map) = build_analyzer_set(&project, &refs);
        assert_eq!(analyzers.len(), 3);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn a_repeated_reference_id_is_never_queried_again() {
        let project = ProjectHandle::new(rdc_common::ProjectId::new("p"), "rust", [], []);
        let calls = Arc::new(AtomicUsize::new(0));
        let refs: Vec<Box<dyn AnalyzerReference>> = vec![
            Box::new(Fixed {
                id: ReferenceId(1),
                names: vec!["a", "b"],
                calls: calls.clone(),
            }),
            Box::new(Fixed {
                id: ReferenceId(1),
                names: vec!["b", "c"],
                calls: calls.clone(),
            }),
        ];

        let (analyzers, map) = build_analyzer_set(&project, &refs);
        assert_eq!(analyzers.len(), 2);
        assert_eq!(map.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn excludes_host_only_analyzers() {
        let project = ProjectHandle::new(
            rdc_common::ProjectId::new("p"),
            "rust",
            [],
            [AnalyzerId::new("b")],
        );
        let calls = Arc::new(AtomicUsize::new(0));
        let refs: Vec<Box<dyn AnalyzerReference>> = vec![Box::new(Fixed {
            id: ReferenceId(1),
            names: vec!["a", "b"],
            calls,
        })];

        let (analyzers, map) = build_analyzer_set(&project, &refs);
        assert_eq!(analyzers.len(), 1);
        assert_eq!(map.len(), 1);
        assert_eq!(analyzers[0].name(), "a");
    }
}
