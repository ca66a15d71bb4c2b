// SPDX-License-Identifier: Apache-2.0
//! End-to-end scenarios against [`rdc_core::Coordinator`], run with
//! [`rdc_core::testing::MockHost`] standing in for a real analyzer host.

use std::sync::{atomic::Ordering, Arc};
use std::time::Duration;

use rdc_common::{DocumentId, ProjectId, SnapshotId};
use rdc_core::{
    model::{AnalysisKind, DiagnosticsRequest, ProjectHandle},
    testing::{MockHost, StubAnalyzerReference},
    AnalyzerReference, Coordinator,
};
use tokio_util::sync::CancellationToken;

fn references() -> Vec<Box<dyn AnalyzerReference>> {
    vec![Box::new(StubAnalyzerReference::new(vec![
        "syntax", "semantic",
    ]))]
}

fn request(
    project: &ProjectId,
    snapshot: u64,
    document: Option<&DocumentId>,
) -> DiagnosticsRequest {
    DiagnosticsRequest {
        snapshot: SnapshotId::new(snapshot),
        project: project.clone(),
        document: document.cloned(),
        span: None,
        analysis_kind: document.map(|_| AnalysisKind::Semantic),
        analyzer_ids: vec![
            rdc_common::AnalyzerId::new("syntax"),
            rdc_common::AnalyzerId::new("semantic"),
        ],
        high_priority: false,
        report_suppressed: true,
        want_performance: false,
        want_telemetry: true,
    }
}

#[tokio::test]
async fn document_request_on_cold_cache_builds_and_returns_diagnostics() {
    let host = Arc::new(MockHost::new());
    let counts = host.counts.clone();
    let coordinator = Coordinator::new(host, references());

    let project_id = ProjectId::new("proj-1");
    let doc = DocumentId::new("main.rs");
    let project = ProjectHandle::new(project_id.clone(), "rust", [doc.clone()], []);

    let result = coordinator
        .get_diagnostics(
            project,
            request(&project_id, 1, Some(&doc)),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.per_analyzer.len(), 2);
    assert_eq!(counts.compile.load(Ordering::SeqCst), 1);
    assert_eq!(counts.build_context.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn repeating_the_same_request_does_not_rebuild() {
    let host = Arc::new(MockHost::new());
    let counts = host.counts.clone();
    let coordinator = Coordinator::new(host, references());

    let project_id = ProjectId::new("proj-1");
    let doc = DocumentId::new("main.rs");
    let project = ProjectHandle::new(project_id.clone(), "rust", [doc.clone()], []);

    coordinator
        .get_diagnostics(
            project.clone(),
            request(&project_id, 1, Some(&doc)),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    coordinator
        .get_diagnostics(
            project,
            request(&project_id, 1, Some(&doc)),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(counts.compile.load(Ordering::SeqCst), 1);
    assert_eq!(counts.build_context.load(Ordering::SeqCst), 1);
    assert_eq!(counts.analyze.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn distinct_project_identity_reconciles_against_cached_entry_with_same_snapshot() {
    let host = Arc::new(MockHost::new());
    let counts = host.counts.clone();
    let coordinator = Coordinator::new(host, references());

    let project_id = ProjectId::new("proj-1");
    let doc = DocumentId::new("main.rs");

    let first = ProjectHandle::new(project_id.clone(), "rust", [doc.clone()], []);
    coordinator
        .get_diagnostics(
            first,
            request(&project_id, 1, Some(&doc)),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    // Same snapshot, same project id, but a distinct handle instance (as if
    // respawned across a transient edit within one logical snapshot) — the
    // cache must reconcile this against the already-cached entry, not
    // rebuild.
    let second = ProjectHandle::new(project_id.clone(), "rust", [doc.clone()], []);
    coordinator
        .get_diagnostics(
            second,
            request(&project_id, 1, Some(&doc)),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(counts.compile.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn high_priority_preempts_in_flight_normal_whole_project_request() {
    let host = Arc::new(MockHost::new());
    let counts = host.counts.clone();
    // Long enough that the NORMAL attempt is still inside `analyze` when
    // HIGH arrives; captured at call time, so it holds the first NORMAL
    // attempt open without also slowing down its retry below.
    host.set_delay(Duration::from_millis(200));
    let coordinator = Coordinator::new(host.clone(), references());

    let project_id = ProjectId::new("proj-1");
    let project = ProjectHandle::new(project_id.clone(), "rust", [], []);

    let coordinator_clone = coordinator.clone();
    let project_clone = project.clone();
    let project_id_clone = project_id.clone();
    let normal = tokio::spawn(async move {
        coordinator_clone
            .get_diagnostics(
                project_clone,
                request(&project_id_clone, 1, None),
                CancellationToken::new(),
            )
            .await
    });

    // Give the NORMAL attempt time to register and enter `analyze` before
    // HIGH arrives and preempts it.
    tokio::time::sleep(Duration::from_millis(20)).await;
    host.set_delay(Duration::ZERO);

    let mut high_request = request(&project_id, 1, None);
    high_request.high_priority = true;
    coordinator
        .get_diagnostics(project, high_request, CancellationToken::new())
        .await
        .unwrap();

    normal.await.unwrap().unwrap();

    // normal attempt #1 (preempted mid-flight) + high's own attempt +
    // normal's successful retry.
    assert_eq!(counts.analyze.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn caller_cancellation_during_normal_drain_is_reported() {
    let host = Arc::new(MockHost::new());
    let coordinator = Coordinator::new(host, references());

    let project_id = ProjectId::new("proj-1");
    let project = ProjectHandle::new(project_id.clone(), "rust", [], []);

    let token = CancellationToken::new();
    token.cancel();

    let err = coordinator
        .get_diagnostics(project, request(&project_id, 1, None), token)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn host_failure_during_build_clears_the_cache_slot() {
    let host = Arc::new(MockHost::new());
    host.set_fail_compile(true);
    let coordinator = Coordinator::new(host, references());

    let project_id = ProjectId::new("proj-1");
    let doc = DocumentId::new("main.rs");
    let project = ProjectHandle::new(project_id.clone(), "rust", [doc.clone()], []);

    let err = coordinator
        .get_diagnostics(
            project,
            request(&project_id, 1, Some(&doc)),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(!err.is_cancelled());
    assert!(coordinator.cache_is_empty().await);
}

#[tokio::test]
async fn empty_analyzer_list_returns_empty_result_without_calling_host() {
    let host = Arc::new(MockHost::new());
    let counts = host.counts.clone();
    let coordinator = Coordinator::new(host, references());

    let project_id = ProjectId::new("proj-1");
    let project = ProjectHandle::new(project_id.clone(), "rust", [], []);
    let mut req = request(&project_id, 1, None);
    req.analyzer_ids = vec![];

    let result = coordinator
        .get_diagnostics(project, req, CancellationToken::new())
        .await
        .unwrap();

    assert!(result.per_analyzer.is_empty());
    assert_eq!(counts.compile.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn ten_consecutive_preemptions_eventually_succeed() {
    let host = Arc::new(MockHost::new());
    let coordinator = Coordinator::new(host, references());

    let project_id = ProjectId::new("proj-1");
    let project = ProjectHandle::new(project_id.clone(), "rust", [], []);

    let coordinator_clone = coordinator.clone();
    let project_clone = project.clone();
    let project_id_clone = project_id.clone();
    let normal = tokio::spawn(async move {
        coordinator_clone
            .get_diagnostics(
                project_clone,
                request(&project_id_clone, 1, None),
                CancellationToken::new(),
            )
            .await
    });

    for _ in 0..10 {
        coordinator
            .get_diagnostics(
                project.clone(),
                request(&project_id, 1, None),
                CancellationToken::new(),
            )
            .await
            .unwrap();
    }

    normal.await.unwrap().unwrap();
}
