// SPDX-License-Identifier: Apache-2.0
//! C7: the coordinator process's public surface. Bundles the cache, the
//! scheduler, and the host adapter, and exposes the single `get_diagnostics`
//! entry point every external interface (C6) is built on.

use tokio_util::sync::CancellationToken;

use tracing::instrument;

use crate::{
    cache::ContextCache,
    error::CoordinatorError,
    host::{AnalyzerReference, HostAdapter},
    model::{DiagnosticsRequest, DiagnosticsResult, ProjectHandle},
    pipeline,
    scheduler::Scheduler,
    state::SharedState,
};

/// The coordinator for one host process. Constructed once per running
/// service and shared (via `Clone`, which is cheap — everything inside is
/// reference-counted) across every concurrent request.
#[derive(Clone)]
pub struct Coordinator<H: HostAdapter> {
    cache: std::sync::Arc<ContextCache<H>>,
    scheduler: Scheduler<H::Compilation>,
}

impl<H: HostAdapter> Coordinator<H> {
    /// Builds a coordinator around `host`, using `references` to compute
    /// each project's analyzer set.
    pub fn new(host: H, references: Vec<Box<dyn AnalyzerReference>>) -> Self {
        let state = std::sync::Arc::new(tokio::sync::Mutex::new(SharedState::default()));
        Self {
            cache: std::sync::Arc::new(ContextCache::new(host, references, state.clone())),
            scheduler: Scheduler::new(state),
        }
    }

    /// Serves one `GetDiagnostics` request, admitting it under its declared
    /// priority and retrying transparently across HIGH preemptions until it
    /// either completes or `token` (the caller's own cancellation) fires.
    ///
    /// `project` identifies the exact project instance this request should
    /// run against; if its `ProjectId` doesn't match `request.project`, that
    /// is treated as a contract violation by the caller of this function
    /// rather than silently substituted.
    #[instrument(skip(self, project, token), fields(project = %request.project, snapshot = %request.snapshot))]
    pub async fn get_diagnostics(
        &self,
        project: ProjectHandle,
        mut request: DiagnosticsRequest,
        token: CancellationToken,
    ) -> Result<DiagnosticsResult, CoordinatorError> {
        request.validate()?;
        if project.id != request.project {
            return Err(CoordinatorError::ContractViolation(format!(
                "project handle id {} does not match request project {}",
                project.id, request.project
            )));
        }

        let (project, document) = self
            .cache
            .reconcile(request.snapshot, project, request.document.clone())
            .await;
        if document != request.document {
            request.document = document;
            if request.document.is_none() {
                request.analysis_kind = None;
                request.span = None;
            }
        }

        let priority = request.priority();
        let cache = self.cache.clone();
        let result =
            self.scheduler
                .run(priority, token, move |attempt_token| {
                    let cache = cache.clone();
                    let project = project.clone();
                    let request = request.clone();
                    async move {
                        pipeline::run_pipeline(&cache, &project, &request, attempt_token).await
                    }
                })
                .await?;

        tracing::debug!(
            analyzers = result.per_analyzer.len(),
            "diagnostics computed"
        );
        Ok(result)
    }

    /// True if the context cache currently holds no entry (diagnostic/test
    /// helper, mirrors the registries-return-to-zero testable property).
    pub async fn cache_is_empty(&self) -> bool {
        self.cache.is_empty().await
    }
}
