// SPDX-License-Identifier: Apache-2.0
//! Error taxonomy for the coordinator, per the propagation policy: `Cancelled`
//! is re-raised unchanged to callers, `HostFailure` is a single fatal error
//! with no partial results, and `ContractViolation` marks a programmer bug
//! in an adapter implementation rather than a caller-facing condition.

use thiserror::Error;

/// Errors that can cross the `GetDiagnostics` boundary.
///
/// `Preempted` (internal cancellation of a NORMAL attempt caused by a HIGH
/// arrival) is deliberately absent here: per the scheduler's retry rule it
/// is always consumed internally and never surfaces to a caller. Likewise
/// "all requested analyzer ids unknown" is not an error at all — the core
/// returns an empty [`crate::model::DiagnosticsResult`] for that case.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The caller's own cancellation token fired (or had already fired)
    /// before or during this attempt.
    #[error("request cancelled")]
    Cancelled,

    /// The analyzer host raised during compilation, context construction,
    /// or analysis. Carries the host's opaque error; no partial results are
    /// ever emitted alongside this variant.
    #[error("analyzer host failed: {0}")]
    HostFailure(#[source] eyre::Report),

    /// An adapter or internal invariant was violated — e.g. an analyzer
    /// the host reported results for has no reverse entry in the
    /// `AnalyzerIdMap` that produced it. Treated as a programmer bug.
    #[error("contract violation: {0}")]
    ContractViolation(String),
}

impl CoordinatorError {
    /// True for the `Cancelled` variant specifically.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<eyre::Report> for CoordinatorError {
    fn from(report: eyre::Report) -> Self {
        Self::HostFailure(report)
    }
}
