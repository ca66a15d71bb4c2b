// SPDX-License-Identifier: Apache-2.0
//! C8: a deterministic Host Adapter used by integration tests to assert the
//! coordinator's idempotence, caching, and scheduling properties without a
//! real analyzer host.

use std::{
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
    sync::Arc,
    time::Duration,
};

use crate::{
    error::CoordinatorError,
    host::{AnalyzerReference, HostAdapter},
    model::{
        AnalysisContext, AnalysisKind, AnalyzerHandle, Diagnostic, DiagnosticMap, DocumentScope,
        HostOptions, ProjectHandle, ReferenceId, Severity, TelemetryInfo,
    },
};

static NEXT_REFERENCE_ID: AtomicU64 = AtomicU64::new(1);

/// Fixed set of analyzer names a [`StubAnalyzerReference`] hands out.
#[derive(Debug, Clone)]
pub struct StubAnalyzerReference {
    id: ReferenceId,
    names: Vec<&'static str>,
}

impl StubAnalyzerReference {
    /// Builds a reference contributing exactly `names`, for every language,
    /// with a fresh id distinct from every other `StubAnalyzerReference`.
    pub fn new(names: Vec<&'static str>) -> Self {
        Self {
            id: ReferenceId(NEXT_REFERENCE_ID.fetch_add(1, Ordering::Relaxed)),
            names,
        }
    }
}

impl AnalyzerReference for StubAnalyzerReference {
    fn id(&self) -> ReferenceId {
        self.id
    }

    fn analyzers_for(&self, _language: &str) -> Vec<AnalyzerHandle> {
        self.names.iter().map(|n| AnalyzerHandle::new(*n)).collect()
    }
}

/// Counters for how many times each host operation actually ran, so tests
/// can assert a cache hit skipped `compile`/`build_context` entirely.
#[derive(Debug, Default)]
pub struct HostCallCounts {
    /// Number of `compile` calls observed.
    pub compile: AtomicU64,
    /// Number of `build_context` calls observed.
    pub build_context: AtomicU64,
    /// Number of `analyze` calls observed.
    pub analyze: AtomicU64,
}

/// A compilation produced by [`MockHost`]: just the project id it was built
/// from, since there is no real source to compile.
#[derive(Debug, Clone)]
pub struct MockCompilation {
    /// The project this compilation was built for.
    pub project: rdc_common::ProjectId,
}

/// A deterministic, in-memory stand-in for a real analyzer host.
///
/// Every analyzer reports exactly one fixed diagnostic per document in
/// scope, unless `fail_compile`/`fail_analyze` is set, in which case the
/// corresponding call fails with [`CoordinatorError::HostFailure`]. A
/// configurable delay lets tests hold an `analyze` call open long enough to
/// be preempted, per SPEC_FULL.md §4.7.
#[derive(Default)]
pub struct MockHost {
    /// Running tallies of host calls, shared with the test that built this
    /// host.
    pub counts: Arc<HostCallCounts>,
    fail_compile: std::sync::atomic::AtomicBool,
    fail_analyze: std::sync::atomic::AtomicBool,
    analyze_delay_millis: AtomicU64,
}

impl MockHost {
    /// Builds a mock host with all counters at zero, no injected failures,
    /// and no artificial delay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next (and every subsequent) `compile` call fail.
    pub fn set_fail_compile(&self, fail: bool) {
        self.fail_compile.store(fail, Ordering::SeqCst);
    }

    /// Makes the next (and every subsequent) `analyze` call fail.
    pub fn set_fail_analyze(&self, fail: bool) {
        self.fail_analyze.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `analyze` call sleep for `delay` before
    /// computing its result. The delay in effect for a given call is the one
    /// set at the moment that call starts, not the one in effect when it
    /// finishes — a later `set_delay` does not shorten an attempt already
    /// sleeping.
    pub fn set_delay(&self, delay: Duration) {
        self.analyze_delay_millis
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

impl HostAdapter for MockHost {
    type Compilation = MockCompilation;

    fn compile(
        &self,
        project: &ProjectHandle,
    ) -> impl Future<Output = Result<Self::Compilation, CoordinatorError>> + Send {
        self.counts.compile.fetch_add(1, Ordering::SeqCst);
        let failed = self.fail_compile.load(Ordering::SeqCst);
        let project_id = project.id.clone();
        async move {
            if failed {
                Err(CoordinatorError::HostFailure(eyre::eyre!(
                    "mock compile failure"
                )))
            } else {
                Ok(MockCompilation {
                    project: project_id,
                })
            }
        }
    }

    fn build_context(
        &self,
        compilation: Self::Compilation,
        analyzers: Vec<AnalyzerHandle>,
        options: HostOptions,
    ) -> impl Future<Output = Result<AnalysisContext<Self::Compilation>, CoordinatorError>> + Send
    {
        self.counts.build_context.fetch_add(1, Ordering::SeqCst);
        async move {
            Ok(AnalysisContext {
                compilation,
                analyzers,
                options,
            })
        }
    }

    fn analyze(
        &self,
        context: &AnalysisContext<Self::Compilation>,
        scope: Option<&DocumentScope>,
        _project: &ProjectHandle,
    ) -> impl Future<
        Output = Result<
            (
                Vec<(AnalyzerHandle, DiagnosticMap, TelemetryInfo)>,
                Vec<Diagnostic>,
            ),
            CoordinatorError,
        >,
    > + Send {
        self.counts.analyze.fetch_add(1, Ordering::SeqCst);
        let failed = self.fail_analyze.load(Ordering::SeqCst);
        let delay = Duration::from_millis(self.analyze_delay_millis.load(Ordering::SeqCst));
        let scope = scope.cloned();
        let analyzers = match &scope {
            Some(scope) => context
                .analyzers
                .iter()
                .filter(|a| {
                    scope
                        .analyzer_subset
                        .iter()
                        .any(|id| id.as_str() == a.name())
                })
                .cloned()
                .collect(),
            None => context.analyzers.clone(),
        };
        async move {
            if delay > Duration::ZERO {
                tokio::time::sleep(delay).await;
            }
            if failed {
                return Err(CoordinatorError::HostFailure(eyre::eyre!(
                    "mock analyze failure"
                )));
            }
            let mut out = Vec::with_capacity(analyzers.len());
            for analyzer in analyzers {
                let diagnostic = Diagnostic {
                    rule_id: format!("{}.rule", analyzer.name()),
                    message: "stub finding".into(),
                    severity: Severity::Warning,
                    suppressed: false,
                };
                let map = match &scope {
                    Some(scope) => {
                        let entry = (scope.document_id.clone(), vec![diagnostic]);
                        match scope.kind {
                            AnalysisKind::Syntax => DiagnosticMap {
                                syntax_local: vec![entry],
                                ..Default::default()
                            },
                            AnalysisKind::Semantic => DiagnosticMap {
                                semantic_local: vec![entry],
                                ..Default::default()
                            },
                            AnalysisKind::NonLocal => DiagnosticMap {
                                nonlocal: vec![entry],
                                ..Default::default()
                            },
                        }
                    }
                    None => DiagnosticMap {
                        other: vec![diagnostic],
                        ..Default::default()
                    },
                };
                out.push((
                    analyzer,
                    map,
                    TelemetryInfo {
                        execution_time_micros: 1,
                        diagnostic_count: 1,
                    },
                ));
            }
            Ok((out, vec![]))
        }
    }
}
