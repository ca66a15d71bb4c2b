// SPDX-License-Identifier: Apache-2.0
//! C2: the single-slot context cache.
//!
//! Deliberately not a map keyed by `(SnapshotId, ProjectId)`: the
//! coordinator only ever analyzes one project at a time, so a map would
//! accumulate stale entries for projects no caller has touched since. A
//! single slot that gets replaced on every miss is the entire cache.
//!
//! The slot lives in [`crate::state::SharedState`], the same mutex the
//! scheduler's admission registries use (§5) — not a lock of its own.

use rdc_common::{DocumentId, SnapshotId};

use crate::{
    error::CoordinatorError,
    host::{AnalyzerReference, HostAdapter},
    model::{AnalysisContext, CacheEntry, HostOptions, ProjectHandle},
    state::Shared,
};

/// Guards access to the host and analyzer references needed to (re)populate
/// the shared cache slot.
pub struct ContextCache<H: HostAdapter> {
    host: H,
    references: Vec<Box<dyn AnalyzerReference>>,
    state: Shared<H::Compilation>,
}

/// Outcome of [`ContextCache::acquire`]: whether the returned entry came
/// from the slot unchanged or required a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// The slot already held an entry for this exact snapshot and project
    /// identity.
    Hit,
    /// The slot was empty, held a different snapshot, or held a different
    /// project identity; a fresh entry was built.
    Miss,
}

impl<H: HostAdapter> ContextCache<H> {
    /// Builds a cache around `host` and `state`, using `references` to
    /// compute each project's analyzer set on a miss.
    pub(crate) fn new(
        host: H,
        references: Vec<Box<dyn AnalyzerReference>>,
        state: Shared<H::Compilation>,
    ) -> Self {
        Self {
            host,
            references,
            state,
        }
    }

    /// Returns the entry for `snapshot`/`project`, rebuilding it if the
    /// slot doesn't already hold an identity-identical match.
    ///
    /// On a build failure the slot is cleared (invariant 3 in
    /// `SPEC_FULL.md` §9): a partially constructed entry is never
    /// published, including when it would have overwritten a previously
    /// valid but unrelated entry.
    pub async fn acquire(
        &self,
        snapshot: SnapshotId,
        project: &ProjectHandle,
    ) -> Result<(CacheEntry<H::Compilation>, CacheOutcome), CoordinatorError> {
        {
            let state = self.state.lock().await;
            if let Some(entry) = state.cache_slot.as_ref() {
                if entry.snapshot == snapshot && entry.project.same_identity(project) {
                    return Ok((entry.clone(), CacheOutcome::Hit));
                }
            }
        }

        let built = self.build_entry(snapshot, project).await;
        let mut state = self.state.lock().await;
        match built {
            Ok(entry) => {
                state.cache_slot = Some(entry.clone());
                Ok((entry, CacheOutcome::Miss))
            }
            Err(err) => {
                state.cache_slot = None;
                Err(err)
            }
        }
    }

    /// Builds a fresh entry without touching the slot; used for
    /// whole-project requests, which bypass the cache entirely (§4.2) and
    /// so never clear or populate it regardless of success or failure.
    pub async fn build_uncached(
        &self,
        snapshot: SnapshotId,
        project: &ProjectHandle,
    ) -> Result<CacheEntry<H::Compilation>, CoordinatorError> {
        self.build_entry(snapshot, project).await
    }

    async fn build_entry(
        &self,
        snapshot: SnapshotId,
        project: &ProjectHandle,
    ) -> Result<CacheEntry<H::Compilation>, CoordinatorError> {
        let compilation = self.host.compile(project).await?;
        let (analyzers, map) = crate::analyzer_set::build_analyzer_set(project, &self.references);
        let options = HostOptions::default();
        let context = self
            .host
            .build_context(compilation, analyzers, options)
            .await?;
        Ok(CacheEntry {
            snapshot,
            project: project.clone(),
            context,
            map,
        })
    }

    /// Specializes `context` to a subset of its analyzers without touching
    /// the slot, reusing the already-built compilation.
    pub async fn specialize(
        &self,
        context: &AnalysisContext<H::Compilation>,
        subset: Vec<crate::model::AnalyzerHandle>,
    ) -> Result<AnalysisContext<H::Compilation>, CoordinatorError> {
        self.host
            .build_context(context.compilation.clone(), subset, context.options)
            .await
    }

    /// Reconciles `project`/`document` against the cached slot before
    /// scheduling (§4.2): if the slot holds an entry for the same
    /// `snapshot` whose project shares `project.id` but is a distinct
    /// handle instance, the caller's `project` (and `document`, if it still
    /// exists in the cached project) are rewritten to the cached ones so
    /// the subsequent cache lookup still hits. Otherwise `project` and
    /// `document` are returned unchanged.
    pub async fn reconcile(
        &self,
        snapshot: SnapshotId,
        project: ProjectHandle,
        document: Option<DocumentId>,
    ) -> (ProjectHandle, Option<DocumentId>) {
        let state = self.state.lock().await;
        let Some(entry) = state.cache_slot.as_ref() else {
            return (project, document);
        };
        if entry.snapshot != snapshot
            || entry.project.id != project.id
            || entry.project.same_identity(&project)
        {
            return (project, document);
        }
        let document = document.filter(|doc| entry.project.has_document(doc));
        (entry.project.clone(), document)
    }

    /// Reference to the underlying host, for the pipeline's `analyze` calls.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// True if the slot is currently empty (test/diagnostic helper).
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.cache_slot.is_none()
    }
}
