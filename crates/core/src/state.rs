// SPDX-License-Identifier: Apache-2.0
//! The one mutex shared by the context cache and the scheduler's admission
//! registries.
//!
//! §5 requires a single mutex across the cache slot and both scheduler
//! registries, never held across a suspending operation. Splitting these
//! into independent locks would let a HIGH arrival race a cache rebuild in
//! ways the spec's ordering guarantees don't allow for.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::model::CacheEntry;

/// A registered HIGH attempt's completion signal, observed by NORMAL's
/// drain loop. `watch::Receiver` is `Clone`, unlike a `JoinHandle`, so many
/// NORMAL drains can each wait on the same HIGH ticket without racing to
/// own it.
pub(crate) type HighTicket = watch::Receiver<bool>;

/// Everything the coordinator's single mutex protects.
pub(crate) struct SharedState<C> {
    pub(crate) cache_slot: Option<CacheEntry<C>>,
    pub(crate) high_tasks: Vec<HighTicket>,
    pub(crate) normal_preempts: Vec<(u64, CancellationToken)>,
}

impl<C> Default for SharedState<C> {
    fn default() -> Self {
        Self {
            cache_slot: None,
            high_tasks: Vec::new(),
            normal_preempts: Vec::new(),
        }
    }
}

/// Shared handle to the coordinator's single mutex, cloned between the
/// cache and the scheduler so they lock the same state.
pub(crate) type Shared<C> = Arc<Mutex<SharedState<C>>>;
