// SPDX-License-Identifier: MIT OR Apache-2.0

//! The controller runtime (spec §4.2, C2).
//!
//! A controller is invoked per-primary-id; invocations for distinct ids run
//! in parallel, invocations for the same id are serialized (spec §5). A
//! controller declares mapped input types via an [`InputMapper`] that turns
//! an event on that type into zero or more primary ids to requeue.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashSet;
use tokio::sync::{mpsc, Mutex};

use crate::error::CoreResult;
use crate::model::ResourceId;

/// What a single reconcile invocation asks the runtime to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing more to do until the next change event.
    Done,
    /// Re-invoke after `Duration` even without a new event (spec §4.2).
    RequeueAfter(Duration),
}

/// One controller, reconciling a single primary resource id at a time.
#[async_trait]
pub trait Controller: Send + Sync {
    fn name(&self) -> &str;

    async fn reconcile(&self, id: &ResourceId) -> CoreResult<ReconcileOutcome>;
}

/// Turns an event on a mapped (non-primary) input type into zero or more
/// primary ids to requeue (spec §4.2).
pub trait InputMapper<E>: Send + Sync {
    fn map(&self, event: &E) -> Vec<ResourceId>;
}

/// Drives one [`Controller`]: owns its requeue queue, serializes
/// invocations per id, and runs distinct ids concurrently.
pub struct ControllerRuntime {
    controller: Arc<dyn Controller>,
    queue_tx: mpsc::UnboundedSender<ResourceId>,
    queue_rx: Mutex<mpsc::UnboundedReceiver<ResourceId>>,
    running: DashSet<ResourceId>,
    pending_again: DashSet<ResourceId>,
}

impl ControllerRuntime {
    #[must_use]
    pub fn new(controller: Arc<dyn Controller>) -> Arc<Self> {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            controller,
            queue_tx,
            queue_rx: Mutex::new(queue_rx),
            running: DashSet::new(),
            pending_again: DashSet::new(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.controller.name()
    }

    /// Queue `id` for reconciliation. Safe to call from a watch loop or a
    /// mapped-input handler.
    pub fn enqueue(&self, id: ResourceId) {
        let _ = self.queue_tx.send(id);
    }

    /// Drive the queue until the channel is closed (all senders dropped).
    /// Distinct ids reconcile concurrently; repeat enqueues for an id
    /// already running are coalesced and re-run once it finishes.
    pub async fn run(self: Arc<Self>) {
        loop {
            let next = { self.queue_rx.lock().await.recv().await };
            let Some(id) = next else {
                break;
            };

            if !self.running.insert(id.clone()) {
                // Already in flight: remember to run it again afterwards.
                self.pending_again.insert(id);
                continue;
            }

            let this = Arc::clone(&self);
            tokio::spawn(async move {
                this.invoke_until_settled(id).await;
            });
        }
    }

    async fn invoke_until_settled(self: Arc<Self>, id: ResourceId) {
        loop {
            match self.controller.reconcile(&id).await {
                Ok(ReconcileOutcome::Done) => {}
                Ok(ReconcileOutcome::RequeueAfter(delay)) => {
                    let this = Arc::clone(&self);
                    let requeue_id = id.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        this.enqueue(requeue_id);
                    });
                }
                Err(err) => {
                    if err.skip_reconcile() {
                        tracing::debug!(controller = self.name(), %id, error = %err, "skip-reconcile");
                    } else {
                        tracing::error!(controller = self.name(), %id, error = %err, "reconcile failed");
                    }
                }
            }

            self.running.remove(&id);
            if self.pending_again.remove(&id).is_some() && self.running.insert(id.clone()) {
                continue;
            }
            break;
        }
    }
}

/// A very small "bridge" from N mapped-input event streams into one
/// controller's enqueue, deduplicating ids produced in the same batch
/// (spec §4.2).
pub fn dedup_ids(ids: Vec<ResourceId>) -> Vec<ResourceId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingController {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Controller for CountingController {
        fn name(&self) -> &str {
            "counting"
        }

        async fn reconcile(&self, _id: &ResourceId) -> CoreResult<ReconcileOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ReconcileOutcome::Done)
        }
    }

    #[tokio::test]
    async fn enqueue_invokes_reconcile() {
        let calls = Arc::new(AtomicUsize::new(0));
        let runtime = ControllerRuntime::new(Arc::new(CountingController {
            calls: calls.clone(),
        }));
        let handle = tokio::spawn(Arc::clone(&runtime).run());
        runtime.enqueue(ResourceId::new("default", "Widget", "a"));
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(runtime);
        handle.abort();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dedup_preserves_first_occurrence_order() {
        let ids = vec![
            ResourceId::new("d", "T", "a"),
            ResourceId::new("d", "T", "b"),
            ResourceId::new("d", "T", "a"),
        ];
        let deduped = dedup_ids(ids);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].id, "a");
        assert_eq!(deduped[1].id, "b");
    }
}
