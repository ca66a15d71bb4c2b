// SPDX-License-Identifier: Apache-2.0
//! C3: the two-class preemptive scheduler.
//!
//! HIGH requests run immediately and are never themselves preempted; a
//! HIGH arrival cancels every in-flight NORMAL attempt via a linked
//! cancellation token, and a preempted NORMAL retries from scratch
//! (unbounded, no backoff) once no HIGH ticket remains registered.
//!
//! The admission registries (`high_tasks`, `normal_preempts`) live in
//! [`crate::state::SharedState`], the same mutex the context cache's slot
//! uses (§5) — this type only ever borrows that lock, never owns one.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{error::CoordinatorError, model::Priority, state::Shared};

static NEXT_PREEMPT_ID: AtomicU64 = AtomicU64::new(1);

/// Scheduling logic over a [`Shared`] state cell. `C` is the cache's
/// compilation type; the scheduler itself never touches `cache_slot`, but
/// shares the mutex that guards it.
#[derive(Clone)]
pub struct Scheduler<C> {
    state: Shared<C>,
}

impl<C> Scheduler<C> {
    /// Builds a scheduler borrowing `state`'s admission registries.
    pub(crate) fn new(state: Shared<C>) -> Self {
        Self { state }
    }

    /// Runs `attempt` under the admission protocol for `priority`, retrying
    /// indefinitely on preemption, and returns its result once it either
    /// truly completes or the caller's own token fires.
    ///
    /// `attempt` is invoked with a token that is cancelled when either the
    /// caller cancels or (for NORMAL only) a HIGH request preempts this
    /// attempt; the closure must treat that token's cancellation as a
    /// reason to abandon work early rather than an error to surface.
    pub async fn run<F, Fut, T>(
        &self,
        priority: Priority,
        caller_token: CancellationToken,
        mut attempt: F,
    ) -> Result<T, CoordinatorError>
    where
        F: FnMut(CancellationToken) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoordinatorError>>,
    {
        match priority {
            Priority::High => self.run_high(caller_token, attempt).await,
            Priority::Normal => loop {
                if caller_token.is_cancelled() {
                    return Err(CoordinatorError::Cancelled);
                }
                self.wait_for_no_high().await;

                let preempt_id = NEXT_PREEMPT_ID.fetch_add(1, Ordering::Relaxed);
                let preempt = CancellationToken::new();
                {
                    let mut state = self.state.lock().await;
                    state.normal_preempts.push((preempt_id, preempt.clone()));
                }
                let run_token = link_tokens(caller_token.clone(), preempt.clone());

                let outcome = attempt(run_token.clone()).await;
                // The watcher task spawned by `link_tokens` only exits once its
                // child token is cancelled; an attempt that completes without
                // either parent firing would otherwise leak it forever.
                run_token.cancel();
                {
                    let mut state = self.state.lock().await;
                    state.normal_preempts.retain(|(id, _)| *id != preempt_id);
                }

                match outcome {
                    Ok(value) => return Ok(value),
                    Err(err) => {
                        if caller_token.is_cancelled() {
                            return Err(CoordinatorError::Cancelled);
                        }
                        if preempt.is_cancelled() {
                            // Preempted, not the caller's own cancellation: retry.
                            continue;
                        }
                        return Err(err);
                    }
                }
            },
        }
    }

    async fn run_high<F, Fut, T>(
        &self,
        caller_token: CancellationToken,
        mut attempt: F,
    ) -> Result<T, CoordinatorError>
    where
        F: FnMut(CancellationToken) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoordinatorError>>,
    {
        if caller_token.is_cancelled() {
            return Err(CoordinatorError::Cancelled);
        }

        let (tx, rx) = watch::channel(false);
        {
            let mut state = self.state.lock().await;
            state.high_tasks.push(rx);
            for (_, preempt) in state.normal_preempts.drain(..) {
                preempt.cancel();
            }
        }

        let result = attempt(caller_token).await;

        // Flip this ticket to done; `wait_for_no_high` prunes it out of
        // `high_tasks` the next time anyone walks the list.
        let _ = tx.send(true);

        result
    }

    /// Blocks until no HIGH ticket is currently registered, by waiting for
    /// every ticket observed at call time to report completion.
    async fn wait_for_no_high(&self) {
        loop {
            let tickets = {
                let state = self.state.lock().await;
                if state.high_tasks.is_empty() {
                    return;
                }
                state.high_tasks.clone()
            };
            for mut ticket in tickets {
                let _ = ticket.wait_for(|done| *done).await;
            }
            let mut state = self.state.lock().await;
            state.high_tasks.retain(|t| !*t.borrow());
        }
    }
}

/// Links two independent cancellation tokens into one child that fires
/// when either parent does. `tokio_util` only supports a single
/// `child_token()` per parent, so this spawns a small watcher task that
/// races both and cancels the child on whichever fires first.
pub fn link_tokens(a: CancellationToken, b: CancellationToken) -> CancellationToken {
    let child = CancellationToken::new();
    let child_for_task = child.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = a.cancelled() => {}
            _ = b.cancelled() => {}
            _ = child_for_task.cancelled() => {}
        }
        child_for_task.cancel();
    });
    child
}
