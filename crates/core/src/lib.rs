// SPDX-License-Identifier: Apache-2.0
//! Core of the remote diagnostic computation coordinator: a single-slot
//! context cache, a two-class preemptive scheduler, and the compute
//! pipeline that ties them to a pluggable analyzer host.
//!
//! Everything here is transport-agnostic; [`coordinator::Coordinator`] is
//! the one type external interfaces (a service binary, an in-process
//! embedding) need to depend on.

pub mod analyzer_set;
pub mod cache;
pub mod coordinator;
pub mod error;
pub mod host;
pub mod model;
pub mod pipeline;
pub mod scheduler;
pub mod shaper;
pub(crate) mod state;

#[cfg(feature = "testing")]
pub mod testing;

pub use coordinator::Coordinator;
pub use error::CoordinatorError;
pub use host::{AnalyzerReference, HostAdapter};
