// SPDX-License-Identifier: Apache-2.0
//! The seam between the coordinator and the analyzer host it fronts.
//!
//! `HostAdapter` is the only trait the coordinator depends on for actual
//! compilation/analysis work; everything else in this crate is host-agnostic
//! scheduling and caching glue.

use std::future::Future;

use crate::{
    error::CoordinatorError,
    model::{
        AnalysisContext, AnalyzerHandle, DiagnosticMap, DocumentScope, ProjectHandle, ReferenceId,
        TelemetryInfo,
    },
};

/// One analyzer's diagnostics and telemetry from a single `analyze` call,
/// plus any suppression diagnostics the host could not attribute to one
/// analyzer.
type AnalyzeOutput = (
    Vec<(AnalyzerHandle, DiagnosticMap, TelemetryInfo)>,
    Vec<crate::model::Diagnostic>,
);

/// A source of analyzers for a project's language, as handed to the
/// analyzer-set builder (C1). Implementations are expected to be cheap,
/// pure lookups — no I/O, no host calls.
pub trait AnalyzerReference: Send + Sync {
    /// Opaque identity used by the analyzer-set builder to skip a reference
    /// it has already processed. Invariant 3 dedups by this id *before*
    /// `analyzers_for` is ever called on a repeat.
    fn id(&self) -> ReferenceId;

    /// The analyzers this reference contributes for the given language tag.
    fn analyzers_for(&self, language: &str) -> Vec<AnalyzerHandle>;
}

/// The abstraction boundary over the actual analyzer host (compiler +
/// analyzer runtime). All three methods are async because every one of
/// them may need to talk to an out-of-process or long-running host.
///
/// Implementations must be cancellation-safe: when the future is dropped
/// before completion (as happens on preemption), no partial mutation of
/// host state should be observable by a later call.
pub trait HostAdapter: Send + Sync {
    /// The opaque compilation unit this host produces, stored in
    /// [`crate::model::CacheEntry`] and reused across requests.
    type Compilation: Clone + Send + Sync + 'static;

    /// Builds (or rebuilds) the compilation for `project` at `language`.
    /// Called once per cache miss.
    fn compile(
        &self,
        project: &ProjectHandle,
    ) -> impl Future<Output = Result<Self::Compilation, CoordinatorError>> + Send;

    /// Binds `analyzers` to `compilation` under `options`, producing a
    /// reusable [`AnalysisContext`]. Called once per cache miss, and again
    /// (cheaply, ideally without recompiling) whenever a whole-project
    /// request needs a narrower analyzer subset than the cached context was
    /// built with.
    fn build_context(
        &self,
        compilation: Self::Compilation,
        analyzers: Vec<AnalyzerHandle>,
        options: crate::model::HostOptions,
    ) -> impl Future<Output = Result<AnalysisContext<Self::Compilation>, CoordinatorError>> + Send;

    /// Runs `context`'s analyzers and returns each one's diagnostics plus
    /// any suppression diagnostics attributable to no single analyzer.
    ///
    /// `scope` is `Some` for a document-scoped request (narrowing both the
    /// analyzer subset and the document/span/kind in play without touching
    /// `context` itself) and `None` for a whole-project request, where any
    /// narrowing already happened by specializing `context`.
    fn analyze(
        &self,
        context: &AnalysisContext<Self::Compilation>,
        scope: Option<&DocumentScope>,
        project: &ProjectHandle,
    ) -> impl Future<Output = Result<AnalyzeOutput, CoordinatorError>> + Send;
}

impl<H: HostAdapter> HostAdapter for std::sync::Arc<H> {
    type Compilation = H::Compilation;

    fn compile(
        &self,
        project: &ProjectHandle,
    ) -> impl Future<Output = Result<Self::Compilation, CoordinatorError>> + Send {
        H::compile(self, project)
    }

    fn build_context(
        &self,
        compilation: Self::Compilation,
        analyzers: Vec<AnalyzerHandle>,
        options: crate::model::HostOptions,
    ) -> impl Future<Output = Result<AnalysisContext<Self::Compilation>, CoordinatorError>> + Send
    {
        H::build_context(self, compilation, analyzers, options)
    }

    fn analyze(
        &self,
        context: &AnalysisContext<Self::Compilation>,
        scope: Option<&DocumentScope>,
        project: &ProjectHandle,
    ) -> impl Future<Output = Result<AnalyzeOutput, CoordinatorError>> + Send {
        H::analyze(self, context, scope, project)
    }
}
