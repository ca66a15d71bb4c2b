// SPDX-License-Identifier: Apache-2.0
//! C4: the per-attempt compute pipeline. Resolves the request against the
//! cache (or bypasses it for whole-project requests), narrows to the
//! requested analyzer subset, runs analysis, and shapes the result — all
//! under the token the scheduler hands this attempt.

use tokio_util::sync::CancellationToken;

use rdc_common::AnalyzerId;

use crate::{
    cache::ContextCache,
    error::CoordinatorError,
    host::HostAdapter,
    model::{
        AnalyzerHandle, CacheEntry, DiagnosticsRequest, DiagnosticsResult, DocumentScope,
        ProjectHandle,
    },
    shaper,
};

/// Runs one scheduling attempt for `request` against `project`.
///
/// A document-scoped request resolves through the cache (a hit reuses the
/// cached compilation and id map unchanged; a miss rebuilds and publishes a
/// fresh entry, clearing the slot if the build fails) and narrows to its
/// analyzer subset via a [`DocumentScope`], leaving the cached context
/// itself untouched. A whole-project request (`request.document.is_none()`)
/// always builds fresh and never touches the slot, per §4.2's bypass rule;
/// if it asks for fewer analyzers than the built context has, the context
/// itself is specialized to that subset.
///
/// Returns `Ok` with an empty result, without calling the host at all, when
/// `request.analyzer_ids` is empty or none of the requested ids resolve
/// against the entry's analyzer map (`EmptyResolve`, not an error).
pub async fn run_pipeline<H: HostAdapter>(
    cache: &ContextCache<H>,
    project: &ProjectHandle,
    request: &DiagnosticsRequest,
    token: CancellationToken,
) -> Result<DiagnosticsResult, CoordinatorError> {
    request.validate()?;

    if request.analyzer_ids.is_empty() {
        return Ok(DiagnosticsResult::default());
    }

    if token.is_cancelled() {
        return Err(CoordinatorError::Cancelled);
    }

    let entry = if request.document.is_some() {
        let (entry, _outcome) = cache.acquire(request.snapshot, project).await?;
        entry
    } else {
        cache.build_uncached(request.snapshot, project).await?
    };

    if token.is_cancelled() {
        return Err(CoordinatorError::Cancelled);
    }

    let resolved = resolve_subset(&entry, request);
    if resolved.is_empty() {
        return Ok(DiagnosticsResult::default());
    }

    let document_present = request.document.is_some();
    let context = if !document_present && resolved.len() < entry.context.analyzers.len() {
        let subset = resolved.iter().map(|(_, handle)| handle.clone()).collect();
        cache.specialize(&entry.context, subset).await?
    } else {
        entry.context.clone()
    };

    let scope = request.document.clone().map(|document_id| DocumentScope {
        document_id,
        span: request.span,
        analyzer_subset: resolved.iter().map(|(id, _)| id.clone()).collect(),
        kind: request
            .analysis_kind
            .expect("validate() requires analysis_kind whenever document is set"),
    });

    if token.is_cancelled() {
        return Err(CoordinatorError::Cancelled);
    }

    let (raw, extra_suppressions) = cache
        .host()
        .analyze(&context, scope.as_ref(), project)
        .await?;

    if token.is_cancelled() {
        return Err(CoordinatorError::Cancelled);
    }

    shaper::dehydrate(request, &entry.map, raw, extra_suppressions)
}

/// Resolves `request.analyzer_ids` against `entry.map`, silently dropping
/// any id the map doesn't recognize (spec §4.4 step 2: unknown ids are not
/// a contract violation).
fn resolve_subset<C>(
    entry: &CacheEntry<C>,
    request: &DiagnosticsRequest,
) -> Vec<(AnalyzerId, AnalyzerHandle)> {
    request
        .analyzer_ids
        .iter()
        .filter_map(|id| entry.map.get(id).map(|handle| (id.clone(), handle.clone())))
        .collect()
}
