// SPDX-License-Identifier: Apache-2.0
//! Opaque identifiers shared across the coordinator boundary.
//!
//! All three types are intentionally "dumb": equality (and, where noted,
//! hashing) is the only operation the coordinator core requires of them.

use std::sync::Arc;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Content-addressed identity of a full workspace snapshot.
///
/// Two [`SnapshotId`]s compare equal iff the workspace state they were
/// derived from was identical; the core never inspects the value beyond
/// equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub struct SnapshotId(u64);

impl SnapshotId {
    /// Wraps a raw content hash as a snapshot identity.
    pub const fn new(hash: u64) -> Self {
        Self(hash)
    }

    /// Returns the raw hash backing this id.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Identity of a project within a workspace.
///
/// Stable across snapshots of the same logical project; two [`ProjectId`]s
/// from different in-flight snapshots may still compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize, From)]
pub struct ProjectId(Arc<str>);

impl ProjectId {
    /// Builds a project id from any string-like value.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Borrows the underlying slug.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProjectId {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

/// Identity of a document (source file) within a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize, From)]
pub struct DocumentId(Arc<str>);

impl DocumentId {
    /// Builds a document id from any string-like value.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Borrows the underlying slug.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

/// Short, process-stable key for an analyzer within one `AnalyzerIdMap`.
///
/// Stability is only required within a single process lifetime (see
/// `DESIGN.md` for the rationale) — it is never persisted or compared
/// across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize, From)]
pub struct AnalyzerId(Arc<str>);

impl AnalyzerId {
    /// Builds an analyzer id from any string-like value.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Borrows the underlying key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AnalyzerId {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}
