// SPDX-License-Identifier: Apache-2.0
//! Data model shared by every component: the boundary request/result shapes,
//! the project/analyzer types the Host Adapter operates on, and the cache
//! entry that sits between them.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use rdc_common::{AnalyzerId, DocumentId, ProjectId, SnapshotId};
use serde::{Deserialize, Serialize};

use crate::error::CoordinatorError;

/// A span of text within a document; meaningful only alongside a
/// [`DocumentId`] and an [`AnalysisKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    /// Start offset, in UTF-8 bytes.
    pub start: u32,
    /// End offset, in UTF-8 bytes (exclusive).
    pub end: u32,
}

/// The kind of analysis a document-scoped request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisKind {
    /// Diagnostics that only need the document's syntax tree.
    Syntax,
    /// Diagnostics that need semantic (cross-reference) information local
    /// to the document.
    Semantic,
    /// Diagnostics that need information outside the document (project-wide
    /// analysis attributed back to it).
    NonLocal,
}

/// Scopes an analysis request to one document, optionally to a span within
/// it and to a subset of analyzers. Absent entirely, a request means
/// "whole project".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentScope {
    /// The document under analysis.
    pub document_id: DocumentId,
    /// An optional sub-span of the document.
    pub span: Option<TextSpan>,
    /// The analyzers this scope was computed for.
    pub analyzer_subset: Vec<AnalyzerId>,
    /// Which kind of analysis this scope represents.
    pub kind: AnalysisKind,
}

/// The two admission classes the scheduler recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    /// Interactive ("lightbulb") work: preempts NORMAL, is never itself
    /// preempted.
    High,
    /// Background work: makes progress only while no HIGH ticket is
    /// registered.
    Normal,
}

/// Severity of a single diagnostic. The diagnostic's own structure beyond
/// this is out of scope for the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Error
    Error,
    /// Warning
    Warning,
    /// Info
    Info,
    /// Hint
    Hint,
}

/// A single analysis finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable id for the rule that produced this diagnostic (analyzer-local).
    pub rule_id: String,
    /// Human-readable message.
    pub message: String,
    /// Severity.
    pub severity: Severity,
    /// Whether this diagnostic was suppressed (e.g. by an in-source
    /// suppression comment or ruleset). The host always computes with
    /// `report_suppressed = true`; filtering for callers that asked for
    /// `report_suppressed == false` happens in the shaper.
    pub suppressed: bool,
}

/// Diagnostics produced by one analyzer, partitioned the way the boundary
/// result requires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticMap {
    /// Diagnostics needing only the document's syntax, keyed by document.
    pub syntax_local: Vec<(DocumentId, Vec<Diagnostic>)>,
    /// Diagnostics needing semantic info local to the document.
    pub semantic_local: Vec<(DocumentId, Vec<Diagnostic>)>,
    /// Diagnostics needing information outside the document.
    pub nonlocal: Vec<(DocumentId, Vec<Diagnostic>)>,
    /// Diagnostics not attributable to a single document.
    pub other: Vec<Diagnostic>,
}

/// Raw performance/telemetry info the host reports for one analyzer run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryInfo {
    /// Wall-clock execution time, in microseconds.
    pub execution_time_micros: u64,
    /// Number of diagnostics the analyzer produced (suppressed or not).
    pub diagnostic_count: u64,
}

/// The boundary `GetDiagnostics` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsRequest {
    /// Snapshot identity.
    pub snapshot: SnapshotId,
    /// Project identity.
    pub project: ProjectId,
    /// Document, if this is a document-scoped request.
    pub document: Option<DocumentId>,
    /// Span within the document; only meaningful alongside `document`.
    pub span: Option<TextSpan>,
    /// Analysis kind; required iff `document` is set.
    pub analysis_kind: Option<AnalysisKind>,
    /// The analyzers the caller wants results for.
    pub analyzer_ids: Vec<AnalyzerId>,
    /// HIGH if true, NORMAL otherwise.
    pub high_priority: bool,
    /// Whether suppressed diagnostics should be included in the result.
    pub report_suppressed: bool,
    /// Whether to feed a performance tracker, if one is active.
    pub want_performance: bool,
    /// Whether to include telemetry in the result.
    pub want_telemetry: bool,
}

impl DiagnosticsRequest {
    /// Validates the document/span/kind coupling required by the boundary
    /// contract: a document requires a kind, and vice versa; a span is
    /// only meaningful alongside a document.
    pub fn validate(&self) -> Result<(), CoordinatorError> {
        match (&self.document, &self.analysis_kind) {
            (Some(_), Some(_)) | (None, None) => {}
            _ => {
                return Err(CoordinatorError::ContractViolation(
                    "document_id and analysis_kind must be set together".into(),
                ))
            }
        }
        if self.span.is_some() && self.document.is_none() {
            return Err(CoordinatorError::ContractViolation(
                "span is only meaningful alongside a document_id".into(),
            ));
        }
        Ok(())
    }

    /// The priority class this request admits under.
    pub fn priority(&self) -> Priority {
        if self.high_priority {
            Priority::High
        } else {
            Priority::Normal
        }
    }
}

/// The boundary result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsResult {
    /// Per-analyzer diagnostics, in the host's iteration order.
    pub per_analyzer: Vec<(AnalyzerId, DiagnosticMap)>,
    /// Per-analyzer telemetry, empty unless the caller asked for it.
    pub telemetry: Vec<(AnalyzerId, TelemetryInfo)>,
}

/// Opaque identity of an [`AnalyzerReference`](crate::host::AnalyzerReference),
/// used only for deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceId(pub u64);

/// An analyzer, as handed out by an `AnalyzerReference`. Opaque beyond its
/// stable name, which doubles as the seed for its `AnalyzerId` (in-process
/// stability is all the core requires — see `DESIGN.md`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalyzerHandle {
    name: Arc<str>,
}

impl AnalyzerHandle {
    /// Builds an analyzer handle from its stable source name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }

    /// The stable name identifying this analyzer.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A bijection between [`AnalyzerId`] and [`AnalyzerHandle`] for one
/// `AnalysisContext`'s lifetime. Keys are unique; reverse lookup is always
/// defined for any value that was inserted.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerIdMap {
    forward: HashMap<AnalyzerId, AnalyzerHandle>,
    reverse: HashMap<AnalyzerHandle, AnalyzerId>,
}

impl AnalyzerIdMap {
    /// Number of analyzers in the map.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// True if the map holds no analyzers.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// True if `analyzer` already has an id in this map (used by the
    /// analyzer-set builder to enforce invariant 3: one entry per analyzer
    /// even if multiple references would yield it).
    pub fn contains_analyzer(&self, analyzer: &AnalyzerHandle) -> bool {
        self.reverse.contains_key(analyzer)
    }

    pub(crate) fn insert(&mut self, id: AnalyzerId, analyzer: AnalyzerHandle) {
        self.reverse.insert(analyzer.clone(), id.clone());
        self.forward.insert(id, analyzer);
    }

    /// Forward lookup: id to analyzer.
    pub fn get(&self, id: &AnalyzerId) -> Option<&AnalyzerHandle> {
        self.forward.get(id)
    }

    /// Reverse lookup: analyzer to id. A `None` here for an analyzer the
    /// host actually produced results for is a [`CoordinatorError::ContractViolation`]
    /// at the call site (see `shaper`).
    pub fn id_of(&self, analyzer: &AnalyzerHandle) -> Option<&AnalyzerId> {
        self.reverse.get(analyzer)
    }
}

/// Fixed host options. Always the same regardless of any one request's
/// flags, so that a single cached context satisfies every caller —
/// per-request filtering (e.g. `report_suppressed == false`) happens in the
/// shaper instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostOptions {
    /// Always `true`: the core always uses the host's concurrent mode.
    pub concurrent: bool,
    /// Always `true`.
    pub log_execution_time: bool,
    /// Always `true`: suppressed diagnostics are always computed, then
    /// filtered per-request by the shaper.
    pub report_suppressed: bool,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            concurrent: true,
            log_execution_time: true,
            report_suppressed: true,
        }
    }
}

/// An immutable binding of a compilation to a fixed, ordered set of
/// analyzers with fixed options, as produced by the Host Adapter. Can be
/// specialized to a subset of its analyzers (producing a new context that
/// shares the same compilation) without being written back to the cache.
#[derive(Debug, Clone)]
pub struct AnalysisContext<C> {
    /// The compilation this context analyzes.
    pub compilation: C,
    /// The fixed, ordered set of analyzers bound into this context.
    pub analyzers: Vec<AnalyzerHandle>,
    /// The fixed options this context was built with.
    pub options: HostOptions,
}

static NEXT_PROJECT_IDENTITY: AtomicU64 = AtomicU64::new(1);

/// A project within a workspace snapshot: its identity, language, analyzer
/// references, and document set.
///
/// Two `ProjectHandle`s can share a [`ProjectId`] while being distinct
/// instances (e.g. respawned across transient edits within one logical
/// snapshot) — `identity` distinguishes them; `id` is the stable identity
/// the cache reconciles against.
#[derive(Debug, Clone)]
pub struct ProjectHandle {
    /// Stable project identity.
    pub id: ProjectId,
    /// Language tag, forwarded to `AnalyzerReference::analyzers_for`.
    pub language: Arc<str>,
    /// Number of documents in the project (used to size whole-project
    /// telemetry unit counts).
    pub document_count: usize,
    documents: Arc<HashSet<DocumentId>>,
    host_only_analyzers: Arc<HashSet<AnalyzerId>>,
    identity: u64,
}

impl ProjectHandle {
    /// Builds a new, uniquely-identified project handle.
    pub fn new(
        id: ProjectId,
        language: impl Into<Arc<str>>,
        documents: impl IntoIterator<Item = DocumentId>,
        host_only_analyzers: impl IntoIterator<Item = AnalyzerId>,
    ) -> Self {
        let documents: HashSet<DocumentId> = documents.into_iter().collect();
        Self {
            id,
            language: language.into(),
            document_count: documents.len(),
            documents: Arc::new(documents),
            host_only_analyzers: Arc::new(host_only_analyzers.into_iter().collect()),
            identity: NEXT_PROJECT_IDENTITY.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// True iff `other` is the exact same handle instance (not merely the
    /// same `ProjectId`) — the check the cache uses for a "hit".
    pub fn same_identity(&self, other: &Self) -> bool {
        self.identity == other.identity
    }

    /// True iff `document` exists in this project, used when reconciling a
    /// request's document across a handle respawn.
    pub fn has_document(&self, document: &DocumentId) -> bool {
        self.documents.contains(document)
    }

    /// Analyzers the host runs internally and that this project therefore
    /// skips from the core's own analyzer set.
    pub fn host_only_analyzers(&self) -> &HashSet<AnalyzerId> {
        &self.host_only_analyzers
    }
}

/// The single process-wide cache slot's contents.
#[derive(Debug, Clone)]
pub struct CacheEntry<C> {
    /// Snapshot this entry was built against.
    pub snapshot: SnapshotId,
    /// The exact project handle this entry was built against.
    pub project: ProjectHandle,
    /// The analysis context bound to `project`'s full analyzer set.
    pub context: AnalysisContext<C>,
    /// The id↔analyzer bijection used to decode/encode this entry's
    /// `AnalyzerId`s.
    pub map: AnalyzerIdMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_and_kind_must_travel_together() {
        let mut req = sample_request();
        req.document = Some(DocumentId::new("d1"));
        req.analysis_kind = None;
        assert!(req.validate().is_err());

        req.analysis_kind = Some(AnalysisKind::Semantic);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn span_requires_document() {
        let mut req = sample_request();
        req.span = Some(TextSpan { start: 0, end: 1 });
        assert!(req.validate().is_err());
    }

    fn sample_request() -> DiagnosticsRequest {
        DiagnosticsRequest {
            snapshot: SnapshotId::new(1),
            project: ProjectId::new("p1"),
            document: None,
            span: None,
            analysis_kind: None,
            analyzer_ids: vec![],
            high_priority: false,
            report_suppressed: true,
            want_performance: false,
            want_telemetry: false,
        }
    }

    #[test]
    fn analyzer_id_map_reverse_lookup_matches_forward() {
        let mut map = AnalyzerIdMap::default();
        let handle = AnalyzerHandle::new("demo.analyzer");
        let id = AnalyzerId::new("demo.analyzer");
        map.insert(id.clone(), handle.clone());
        assert_eq!(map.get(&id), Some(&handle));
        assert_eq!(map.id_of(&handle), Some(&id));
    }

    #[test]
    fn project_handles_with_same_id_can_have_different_identity() {
        let a = ProjectHandle::new(ProjectId::new("p"), "rust", [], []);
        let b = ProjectHandle::new(ProjectId::new("p"), "rust", [], []);
        assert_eq!(a.id, b.id);
        assert!(!a.same_identity(&b));
        assert!(a.same_identity(&a.clone()));
    }
}
