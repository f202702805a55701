// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config-status & reset controller (spec §4.8, C9): applies rendered
//! machine configuration, enforces the config-lock/graceful-rollout
//! policies, and drives resets through the backoff ladder in [`reset`].

pub mod diff;
pub mod image_tag;
pub mod reset;
pub mod upgrade;

pub use diff::compute_diff;
pub use image_tag::get_tag;
pub use reset::{ResetMode, ResetTracker};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex as AsyncMutex;

use crate::config::CoreConfig;
use crate::controller::{Controller, ReconcileOutcome};
use crate::error::{CoreError, CoreResult};
use crate::model::{
    ClusterMachine, ClusterMachineConfig, ClusterMachineConfigStatus, MachinePendingUpdates,
    MachineSetNode, NodeForceDestroyRequest, Phase, ResourceId, CONFIG_UPDATE_FINALIZER,
    MACHINE_LOCKED_ANNOTATION,
};
use crate::store::MemoryStore;

const REQUEUE_ON_BUSY: Duration = Duration::from_secs(2);

/// External seam: the actual Talos API calls this controller drives (spec
/// §1 non-goal: no transport client lives in this crate).
#[async_trait]
pub trait ConfigApplier: Send + Sync {
    async fn apply(&self, machine_id: &str, data: &str, reboot: bool) -> CoreResult<()>;
    async fn reset(&self, machine_id: &str, mode: ResetMode) -> CoreResult<()>;
    async fn upgrade(&self, machine_id: &str, install_image: &str, stage: bool) -> CoreResult<()>;
}

fn config_id(machine_id: &str) -> ResourceId {
    ResourceId::new("cluster", "ClusterMachineConfig", machine_id)
}
fn status_id(machine_id: &str) -> ResourceId {
    ResourceId::new("cluster", "ClusterMachineConfigStatus", machine_id)
}
fn pending_updates_id(machine_id: &str) -> ResourceId {
    ResourceId::new("cluster", "MachinePendingUpdates", machine_id)
}
fn force_destroy_id(machine_id: &str) -> ResourceId {
    ResourceId::new("cluster", "NodeForceDestroyRequest", machine_id)
}
fn machine_set_node_id(machine_id: &str) -> ResourceId {
    ResourceId::new("cluster", "MachineSetNode", machine_id)
}

/// Drives `ClusterMachineConfigStatus` for one `ClusterMachine` id (spec
/// §4.8). One concurrent reboot-requiring apply is allowed fleet-wide at a
/// time; `no_reboot` updates bypass that serialization entirely.
pub struct ConfigStatusController {
    cluster_machine: Arc<MemoryStore<ClusterMachine>>,
    machine_set_node: Arc<MemoryStore<MachineSetNode>>,
    cluster_machine_config: Arc<MemoryStore<ClusterMachineConfig>>,
    cluster_machine_config_status: Arc<MemoryStore<ClusterMachineConfigStatus>>,
    machine_pending_updates: Arc<MemoryStore<MachinePendingUpdates>>,
    node_force_destroy_request: Arc<MemoryStore<NodeForceDestroyRequest>>,
    reset_tracker: Arc<ResetTracker>,
    applier: Arc<dyn ConfigApplier>,
    config: CoreConfig,
    /// Holds the machine id currently occupying the single reboot-requiring
    /// rollout slot (spec §4.8 "Graceful parallelism").
    reboot_slot: AsyncMutex<Option<String>>,
}

impl ConfigStatusController {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cluster_machine: Arc<MemoryStore<ClusterMachine>>,
        machine_set_node: Arc<MemoryStore<MachineSetNode>>,
        cluster_machine_config: Arc<MemoryStore<ClusterMachineConfig>>,
        cluster_machine_config_status: Arc<MemoryStore<ClusterMachineConfigStatus>>,
        machine_pending_updates: Arc<MemoryStore<MachinePendingUpdates>>,
        node_force_destroy_request: Arc<MemoryStore<NodeForceDestroyRequest>>,
        reset_tracker: Arc<ResetTracker>,
        applier: Arc<dyn ConfigApplier>,
        config: CoreConfig,
    ) -> Self {
        Self {
            cluster_machine,
            machine_set_node,
            cluster_machine_config,
            cluster_machine_config_status,
            machine_pending_updates,
            node_force_destroy_request,
            reset_tracker,
            applier,
            config,
            reboot_slot: AsyncMutex::new(None),
        }
    }

    fn is_locked(&self, machine_id: &str) -> bool {
        self.machine_set_node
            .get(&machine_set_node_id(machine_id))
            .map(|r| r.metadata.annotation(MACHINE_LOCKED_ANNOTATION).is_some())
            .unwrap_or(false)
    }

    fn destroy_if_present<S: Clone + Send + Sync + 'static>(
        store: &MemoryStore<S>,
        id: &ResourceId,
    ) -> CoreResult<()> {
        if let Ok(existing) = store.get(id) {
            if existing.metadata.phase != Phase::TearingDown {
                store.teardown(id)?;
            }
            store.destroy(id)?;
        }
        Ok(())
    }

    fn write_status(
        &self,
        machine_id: &str,
        mutate: impl FnOnce(&mut ClusterMachineConfigStatus),
    ) -> CoreResult<()> {
        let id = status_id(machine_id);
        match self.cluster_machine_config_status.get(&id) {
            Ok(existing) => {
                self.cluster_machine_config_status
                    .update(&id, existing.metadata.version, |r| mutate(&mut r.spec))?;
            }
            Err(CoreError::NotFound(_)) => {
                let mut status = ClusterMachineConfigStatus::default();
                mutate(&mut status);
                self.cluster_machine_config_status
                    .create(id, crate::model::Metadata::new(), status)?;
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    async fn handle_forced_destroy(&self, machine_id: &str) -> CoreResult<bool> {
        let id = force_destroy_id(machine_id);
        if self.node_force_destroy_request.get(&id).is_err() {
            return Ok(false);
        }
        self.applier.reset(machine_id, ResetMode::NonGraceful).await?;
        self.reset_tracker.clear(machine_id);
        Self::destroy_if_present(&self.node_force_destroy_request, &id)?;
        Self::destroy_if_present(&self.cluster_machine_config_status, &status_id(machine_id))?;
        Ok(true)
    }

    async fn apply_upgrade_if_needed(
        &self,
        machine_id: &str,
        config: &ClusterMachineConfig,
        applied_talos_version: &str,
    ) -> CoreResult<Option<String>> {
        if !config.wants_upgrade(applied_talos_version) {
            return Ok(None);
        }
        let schematic = if config.schematic_id.is_empty() {
            None
        } else {
            Some(config.schematic_id.as_str())
        };
        let image = upgrade::select_install_image(config.secure_boot, schematic);
        let stage = upgrade::needs_staged_upgrade(&config.desired_talos_version, &self.config);
        self.applier.upgrade(machine_id, &image, stage).await?;
        Ok(Some(config.desired_talos_version.clone()))
    }
}

#[async_trait]
impl Controller for ConfigStatusController {
    fn name(&self) -> &str {
        "config-status"
    }

    async fn reconcile(&self, id: &ResourceId) -> CoreResult<ReconcileOutcome> {
        let machine_id = id.id.clone();

        // Machine removed: drop state without talking to the (gone) node.
        if self.cluster_machine.get(id).is_err() {
            Self::destroy_if_present(&self.cluster_machine_config_status, &status_id(&machine_id))?;
            Self::destroy_if_present(&self.machine_pending_updates, &pending_updates_id(&machine_id))?;
            self.reset_tracker.clear(&machine_id);
            return Ok(ReconcileOutcome::Done);
        }

        if self.handle_forced_destroy(&machine_id).await? {
            return Ok(ReconcileOutcome::Done);
        }

        let Ok(config) = self.cluster_machine_config.get(&config_id(&machine_id)) else {
            return Ok(ReconcileOutcome::Done);
        };

        if config.spec.has_generation_error() {
            let error = config.spec.generation_error.clone();
            self.write_status(&machine_id, |s| s.last_config_error = error)?;
            return Ok(ReconcileOutcome::Done);
        }

        if self.is_locked(&machine_id) {
            let applied = self
                .cluster_machine_config_status
                .get(&status_id(&machine_id))
                .map(|r| r.spec.applied_data)
                .unwrap_or_default();
            let diff = compute_diff(&applied, &config.spec.data);
            let id = pending_updates_id(&machine_id);
            match self.machine_pending_updates.get(&id) {
                Ok(existing) => {
                    self.machine_pending_updates
                        .update(&id, existing.metadata.version, |r| r.spec.config_diff = diff)?;
                }
                Err(CoreError::NotFound(_)) => {
                    self.machine_pending_updates.create(
                        id,
                        crate::model::Metadata::new(),
                        MachinePendingUpdates { config_diff: diff },
                    )?;
                }
                Err(err) => return Err(err),
            }
            return Ok(ReconcileOutcome::Done);
        }

        // Unlocked: any stale pending-updates record is no longer relevant.
        Self::destroy_if_present(&self.machine_pending_updates, &pending_updates_id(&machine_id))?;

        let current_status = self
            .cluster_machine_config_status
            .get(&status_id(&machine_id))
            .map(|r| r.spec)
            .unwrap_or_default();
        let applied_data = current_status.applied_data;
        let applied_talos_version = current_status.applied_talos_version;

        let config_unchanged = applied_data == config.spec.data;
        let wants_upgrade = config.spec.wants_upgrade(&applied_talos_version);
        if config_unchanged && !wants_upgrade {
            return Ok(ReconcileOutcome::Done);
        }

        if !config.spec.no_reboot {
            let mut slot = self.reboot_slot.lock().await;
            match slot.as_deref() {
                Some(other) if other != machine_id.as_str() => {
                    return Ok(ReconcileOutcome::RequeueAfter(REQUEUE_ON_BUSY));
                }
                _ => *slot = Some(machine_id.clone()),
            }
            self.cluster_machine
                .add_finalizer(id, CONFIG_UPDATE_FINALIZER)?;
        }

        let apply_result = if !config_unchanged {
            self.applier
                .apply(&machine_id, &config.spec.data, !config.spec.no_reboot)
                .await
        } else {
            Ok(())
        };

        let upgrade_result = match &apply_result {
            Ok(()) => self
                .apply_upgrade_if_needed(&machine_id, &config.spec, &applied_talos_version)
                .await,
            Err(_) => Ok(None),
        };

        if !config.spec.no_reboot {
            self.cluster_machine
                .remove_finalizer(id, CONFIG_UPDATE_FINALIZER)?;
            *self.reboot_slot.lock().await = None;
        }

        match (apply_result, upgrade_result) {
            (Ok(()), Ok(new_version)) => {
                let new_data = config.spec.data.clone();
                self.write_status(&machine_id, |s| {
                    s.applied_data = new_data;
                    if let Some(v) = new_version {
                        s.applied_talos_version = v;
                    }
                    s.last_config_error.clear();
                })?;
                Ok(ReconcileOutcome::Done)
            }
            (Err(err), _) | (_, Err(err)) => {
                let message = err.to_string();
                self.write_status(&machine_id, |s| s.last_config_error = message)?;
                if err.skip_reconcile() {
                    Err(err)
                } else {
                    Ok(ReconcileOutcome::Done)
                }
            }
        }
    }
}

/// Builds the controller and its reset tracker from the process-wide store
/// plus the embedder-supplied Talos API seam.
#[must_use]
pub fn build(
    store: &crate::store::Store,
    applier: Arc<dyn ConfigApplier>,
    config: CoreConfig,
) -> ConfigStatusController {
    ConfigStatusController::new(
        store.cluster_machine.clone(),
        store.machine_set_node.clone(),
        store.cluster_machine_config.clone(),
        store.cluster_machine_config_status.clone(),
        store.machine_pending_updates.clone(),
        store.node_force_destroy_request.clone(),
        Arc::new(ResetTracker::new()),
        applier,
        config,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Metadata;

    struct RecordingApplier {
        apply_calls: std::sync::atomic::AtomicUsize,
        fail_apply: bool,
    }

    #[async_trait]
    impl ConfigApplier for RecordingApplier {
        async fn apply(&self, _machine_id: &str, _data: &str, _reboot: bool) -> CoreResult<()> {
            self.apply_calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if self.fail_apply {
                Err(CoreError::Internal("boom".into()))
            } else {
                Ok(())
            }
        }
        async fn reset(&self, _machine_id: &str, _mode: ResetMode) -> CoreResult<()> {
            Ok(())
        }
        async fn upgrade(&self, _machine_id: &str, _install_image: &str, _stage: bool) -> CoreResult<()> {
            Ok(())
        }
    }

    fn build(applier: Arc<dyn ConfigApplier>) -> ConfigStatusController {
        ConfigStatusController::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(ResetTracker::new()),
            applier,
            CoreConfig::default(),
        )
    }

    #[tokio::test]
    async fn applies_config_and_updates_status() {
        let applier = Arc::new(RecordingApplier {
            apply_calls: std::sync::atomic::AtomicUsize::new(0),
            fail_apply: false,
        });
        let controller = build(applier.clone());
        let machine_id = ResourceId::new("cluster", "ClusterMachine", "m1");
        controller
            .cluster_machine
            .create(
                machine_id.clone(),
                Metadata::new(),
                ClusterMachine { cluster_id: "c".into(), machine_set_id: "cp".into() },
            )
            .unwrap();
        controller
            .cluster_machine_config
            .create(
                config_id("m1"),
                Metadata::new(),
                ClusterMachineConfig { data: "new-config".into(), ..Default::default() },
            )
            .unwrap();

        let outcome = controller.reconcile(&machine_id).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Done);
        assert_eq!(applier.apply_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        let status = controller.cluster_machine_config_status.get(&status_id("m1")).unwrap();
        assert_eq!(status.spec.applied_data, "new-config");
    }

    #[tokio::test]
    async fn locked_machine_accumulates_pending_diff_without_applying() {
        let applier = Arc::new(RecordingApplier {
            apply_calls: std::sync::atomic::AtomicUsize::new(0),
            fail_apply: false,
        });
        let controller = build(applier.clone());
        let machine_id = ResourceId::new("cluster", "ClusterMachine", "m1");
        controller
            .cluster_machine
            .create(
                machine_id.clone(),
                Metadata::new(),
                ClusterMachine { cluster_id: "c".into(), machine_set_id: "cp".into() },
            )
            .unwrap();
        controller
            .machine_set_node
            .create(
                machine_set_node_id("m1"),
                Metadata::new().with_annotation(MACHINE_LOCKED_ANNOTATION, "true"),
                MachineSetNode { machine_set_id: "cp".into() },
            )
            .unwrap();
        controller
            .cluster_machine_config
            .create(
                config_id("m1"),
                Metadata::new(),
                ClusterMachineConfig { data: "new-config".into(), ..Default::default() },
            )
            .unwrap();

        controller.reconcile(&machine_id).await.unwrap();
        assert_eq!(applier.apply_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
        let pending = controller.machine_pending_updates.get(&pending_updates_id("m1")).unwrap();
        assert!(pending.spec.config_diff.contains("new-config"));
    }

    #[tokio::test]
    async fn generation_error_is_mirrored_without_applying() {
        let applier = Arc::new(RecordingApplier {
            apply_calls: std::sync::atomic::AtomicUsize::new(0),
            fail_apply: false,
        });
        let controller = build(applier.clone());
        let machine_id = ResourceId::new("cluster", "ClusterMachine", "m1");
        controller
            .cluster_machine
            .create(
                machine_id.clone(),
                Metadata::new(),
                ClusterMachine { cluster_id: "c".into(), machine_set_id: "cp".into() },
            )
            .unwrap();
        controller
            .cluster_machine_config
            .create(
                config_id("m1"),
                Metadata::new(),
                ClusterMachineConfig {
                    generation_error: "render failed".into(),
                    ..Default::default()
                },
            )
            .unwrap();

        controller.reconcile(&machine_id).await.unwrap();
        assert_eq!(applier.apply_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
        let status = controller.cluster_machine_config_status.get(&status_id("m1")).unwrap();
        assert_eq!(status.spec.last_config_error, "render failed");
    }

    #[tokio::test]
    async fn machine_removed_clears_status_without_reset_call() {
        let applier = Arc::new(RecordingApplier {
            apply_calls: std::sync::atomic::AtomicUsize::new(0),
            fail_apply: false,
        });
        let controller = build(applier.clone());
        let machine_id = ResourceId::new("cluster", "ClusterMachine", "m1");
        controller
            .cluster_machine_config_status
            .create(status_id("m1"), Metadata::new(), ClusterMachineConfigStatus::default())
            .unwrap();

        let outcome = controller.reconcile(&machine_id).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Done);
        assert!(controller.cluster_machine_config_status.get(&status_id("m1")).is_err());
    }
}
