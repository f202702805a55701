// SPDX-License-Identifier: MIT OR Apache-2.0

//! Power-stage watcher (spec §4.7, C8): joins `infra.MachineStatus` and
//! `ClusterMachine` on machine id to derive a `MachineStatusSnapshot`.

use std::sync::Arc;

use tokio::sync::{Mutex, Notify};

use crate::error::{CoreError, CoreResult};
use crate::model::{
    ClusterMachine, InfraMachineStatus, MachineStatusSnapshot, Metadata, PowerStage, PowerState,
    ResourceId,
};
use crate::store::{KindWatcher, MemoryStore, WatchEvent};

/// Drives [`MachineStatusSnapshot`] off two watched inputs (spec §4.7).
pub struct PowerStageWatcher {
    infra_machine_status: Arc<MemoryStore<InfraMachineStatus>>,
    cluster_machine: Arc<MemoryStore<ClusterMachine>>,
    snapshot: Arc<MemoryStore<MachineStatusSnapshot>>,
    // Subscribed eagerly in `new` so no event between construction and the
    // first poll of `run` is missed.
    status_watch: Mutex<KindWatcher<InfraMachineStatus>>,
    cluster_machine_watch: Mutex<KindWatcher<ClusterMachine>>,
    /// Closed once both watches are registered (spec §4.7 `StartCh`).
    start: Arc<Notify>,
    /// Notified after every processed event (spec §4.7 `PostHandleNotifyCh`
    /// test hook).
    post_handle: Arc<Notify>,
}

impl PowerStageWatcher {
    #[must_use]
    pub fn new(
        infra_machine_status: Arc<MemoryStore<InfraMachineStatus>>,
        cluster_machine: Arc<MemoryStore<ClusterMachine>>,
        snapshot: Arc<MemoryStore<MachineStatusSnapshot>>,
    ) -> Self {
        let status_watch = Mutex::new(infra_machine_status.watch_kind());
        let cluster_machine_watch = Mutex::new(cluster_machine.watch_kind());
        Self {
            infra_machine_status,
            cluster_machine,
            snapshot,
            status_watch,
            cluster_machine_watch,
            start: Arc::new(Notify::new()),
            post_handle: Arc::new(Notify::new()),
        }
    }

    #[must_use]
    pub fn start_notify(&self) -> Arc<Notify> {
        self.start.clone()
    }

    #[must_use]
    pub fn post_handle_notify(&self) -> Arc<Notify> {
        self.post_handle.clone()
    }

    /// Recomputes and writes (or clears) the snapshot for one machine id
    /// (spec §4.7's transition table).
    fn reconcile_machine(&self, machine_id: &str) -> CoreResult<()> {
        let status_id = ResourceId::new("infra", "MachineStatus", machine_id);
        let cluster_machine_id = ResourceId::new("cluster", "ClusterMachine", machine_id);

        let powered_off = self
            .infra_machine_status
            .get(&status_id)
            .map(|r| r.spec.power_state == PowerState::Off)
            .unwrap_or(false);
        let has_cluster_machine = self.cluster_machine.get(&cluster_machine_id).is_ok();

        let snapshot_id = ResourceId::new("infra", "MachineStatusSnapshot", machine_id);
        let wanted = match (powered_off, has_cluster_machine) {
            (true, true) => Some(PowerStage::PoweringOn),
            (true, false) => Some(PowerStage::PoweredOff),
            (false, _) => None,
        };

        match (wanted, self.snapshot.get(&snapshot_id)) {
            (Some(stage), Ok(existing)) => {
                self.snapshot.update(&snapshot_id, existing.metadata.version, |r| {
                    r.spec.power_stage = stage;
                })?;
            }
            (Some(stage), Err(CoreError::NotFound(_))) => {
                self.snapshot.create(
                    snapshot_id,
                    Metadata::new(),
                    MachineStatusSnapshot { power_stage: stage },
                )?;
            }
            (None, Ok(existing)) => {
                if existing.metadata.phase != crate::model::Phase::TearingDown {
                    self.snapshot.teardown(&snapshot_id)?;
                }
                match self.snapshot.destroy(&snapshot_id) {
                    Ok(()) | Err(CoreError::FailedPrecondition(_)) => {}
                    Err(err) => return Err(err),
                }
            }
            (None, Err(CoreError::NotFound(_))) => {}
            (_, Err(err)) => return Err(err),
        }

        Ok(())
    }

    /// Runs both watch loops until either source channel closes.
    pub async fn run(self: Arc<Self>) {
        let mut status_watch = self.status_watch.lock().await;
        let mut cluster_machine_watch = self.cluster_machine_watch.lock().await;
        self.start.notify_waiters();

        loop {
            tokio::select! {
                event = status_watch.recv() => {
                    match event {
                        Some(WatchEvent::Created(r) | WatchEvent::Updated(r)) => {
                            if r.spec.power_state == PowerState::Off {
                                let _ = self.reconcile_machine(&r.id.id);
                            }
                            self.post_handle.notify_waiters();
                        }
                        Some(WatchEvent::Destroyed(id)) => {
                            let _ = self.reconcile_machine(&id.id);
                            self.post_handle.notify_waiters();
                        }
                        Some(_) => {}
                        None => break,
                    }
                }
                event = cluster_machine_watch.recv() => {
                    match event {
                        Some(WatchEvent::Created(r)) => {
                            let _ = self.reconcile_machine(&r.id.id);
                            self.post_handle.notify_waiters();
                        }
                        Some(WatchEvent::Destroyed(id)) => {
                            let _ = self.reconcile_machine(&id.id);
                            self.post_handle.notify_waiters();
                        }
                        Some(_) => {}
                        None => break,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn power_off_then_cluster_machine_yields_powering_on() {
        let infra_status = Arc::new(MemoryStore::<InfraMachineStatus>::new());
        let cluster_machine = Arc::new(MemoryStore::<ClusterMachine>::new());
        let snapshot = Arc::new(MemoryStore::<MachineStatusSnapshot>::new());
        let watcher = Arc::new(PowerStageWatcher::new(
            infra_status.clone(),
            cluster_machine.clone(),
            snapshot.clone(),
        ));
        let post_handle = watcher.post_handle_notify();
        let handle = tokio::spawn(Arc::clone(&watcher).run());

        infra_status
            .create(
                ResourceId::new("infra", "MachineStatus", "m1"),
                Metadata::new(),
                InfraMachineStatus { power_state: PowerState::Off },
            )
            .unwrap();
        post_handle.notified().await;

        let snap_id = ResourceId::new("infra", "MachineStatusSnapshot", "m1");
        assert_eq!(snapshot.get(&snap_id).unwrap().spec.power_stage, PowerStage::PoweredOff);

        cluster_machine
            .create(
                ResourceId::new("cluster", "ClusterMachine", "m1"),
                Metadata::new(),
                ClusterMachine {
                    cluster_id: "prod".into(),
                    machine_set_id: "cp".into(),
                },
            )
            .unwrap();
        post_handle.notified().await;

        assert_eq!(snapshot.get(&snap_id).unwrap().spec.power_stage, PowerStage::PoweringOn);
        handle.abort();
    }
}
