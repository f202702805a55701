// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret-rotation orchestrator (spec §4.5, C6) and candidate gating
//! (spec §4.5 "Candidate ordering and gating", C7).

pub mod candidates;
pub mod certs;
pub mod stages;

pub use candidates::{viable, Candidate, CandidateSet, GatingPolicy};
pub use certs::{client_cert_plan_for_phase, machine_bundle_for_phase, ClientCertPlan};
pub use stages::{CaGenerator, CandidateValidator, RotationContext};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::controller::{Controller, ReconcileOutcome};
use crate::error::{CoreError, CoreResult};
use crate::model::{ClusterSecrets, ClusterSecretsRotationStatus, ResourceId, SecretRotation};
use crate::sequence::SequenceController;
use crate::store::MemoryStore;

use stages::{OkStage, PostRotateStage, PreRotateStage, RotateStage};

/// Wraps the `OK -> PRE_ROTATE -> ROTATE -> POST_ROTATE` sequence with the
/// finalizer-removal teardown path (spec §4.5.4): when the governing
/// `ClusterSecrets` is torn down, every `ClusterMachineSecrets` of the
/// cluster and the `SecretRotation` record itself are torn down and
/// destroyed before the controller reports done.
pub struct RotationController {
    cluster_secrets: Arc<MemoryStore<ClusterSecrets>>,
    secret_rotation: Arc<MemoryStore<SecretRotation>>,
    rotation_status: Arc<MemoryStore<ClusterSecretsRotationStatus>>,
    ctx: Arc<RotationContext>,
    sequence: SequenceController<SecretRotation, ClusterSecretsRotationStatus>,
}

impl RotationController {
    #[must_use]
    pub fn new(
        cluster_secrets: Arc<MemoryStore<ClusterSecrets>>,
        secret_rotation: Arc<MemoryStore<SecretRotation>>,
        rotation_status: Arc<MemoryStore<ClusterSecretsRotationStatus>>,
        ctx: Arc<RotationContext>,
    ) -> Self {
        let sequence = SequenceController::new(
            "secret-rotation",
            secret_rotation.clone(),
            rotation_status.clone(),
            "ClusterSecretsRotationStatus",
            vec![
                Box::new(OkStage { ctx: ctx.clone() }),
                Box::new(PreRotateStage { ctx: ctx.clone() }),
                Box::new(RotateStage { ctx: ctx.clone() }),
                Box::new(PostRotateStage { ctx: ctx.clone() }),
            ],
        );
        Self {
            cluster_secrets,
            secret_rotation,
            rotation_status,
            ctx,
            sequence,
        }
    }

    fn teardown_cascade(&self, cluster_id: &str) -> CoreResult<bool> {
        let mut dependents_remain = false;

        let machine_secrets = self
            .ctx
            .cluster_machine_secrets
            .list("cluster", &[])
            .into_iter()
            .filter(|s| s.spec.cluster_id == cluster_id)
            .collect::<Vec<_>>();

        for secret in machine_secrets {
            if secret.metadata.phase != crate::model::Phase::TearingDown {
                self.ctx.cluster_machine_secrets.teardown(&secret.id)?;
            }
            match self.ctx.cluster_machine_secrets.destroy(&secret.id) {
                Ok(()) => {}
                Err(CoreError::FailedPrecondition(_)) => dependents_remain = true,
                Err(err) => return Err(err),
            }
        }

        let rotation_id = ResourceId::new("cluster", "SecretRotation", cluster_id);
        if let Ok(rotation) = self.secret_rotation.get(&rotation_id) {
            if rotation.metadata.phase != crate::model::Phase::TearingDown {
                self.secret_rotation.teardown(&rotation_id)?;
            }
            match self.secret_rotation.destroy(&rotation_id) {
                Ok(()) => {}
                Err(CoreError::FailedPrecondition(_)) => dependents_remain = true,
                Err(err) => return Err(err),
            }
        }

        let status_id = ResourceId::new("cluster", "ClusterSecretsRotationStatus", cluster_id);
        if let Ok(status) = self.rotation_status.get(&status_id) {
            if status.metadata.phase != crate::model::Phase::TearingDown {
                self.rotation_status.teardown(&status_id)?;
            }
            match self.rotation_status.destroy(&status_id) {
                Ok(()) => {}
                Err(CoreError::FailedPrecondition(_)) => dependents_remain = true,
                Err(err) => return Err(err),
            }
        }

        Ok(!dependents_remain)
    }
}

#[async_trait]
impl Controller for RotationController {
    fn name(&self) -> &str {
        "secret-rotation"
    }

    async fn reconcile(&self, id: &ResourceId) -> CoreResult<ReconcileOutcome> {
        let cluster_id = &id.id;
        if let Ok(cluster_secrets) = self.cluster_secrets.get(id) {
            if cluster_secrets.metadata.phase == crate::model::Phase::TearingDown {
                let done = self.teardown_cascade(cluster_id)?;
                if done {
                    return Ok(ReconcileOutcome::Done);
                }
                return Err(CoreError::Conflict(format!(
                    "{cluster_id} rotation dependents still tearing down"
                )));
            }
        }

        self.sequence.reconcile(id).await
    }
}

/// Builds the rotation controller and its shared context from the
/// process-wide [`crate::store::Store`] plus the two embedder-supplied
/// seams (spec §4.5's CA generation and candidate validation).
#[must_use]
pub fn build(
    store: &crate::store::Store,
    ca_generator: Arc<dyn CaGenerator>,
    validator: Arc<dyn CandidateValidator>,
) -> RotationController {
    let ctx = Arc::new(RotationContext {
        cluster_machine: store.cluster_machine.clone(),
        cluster_machine_secrets: store.cluster_machine_secrets.clone(),
        cluster_status: store.cluster_status.clone(),
        rotate_talos_ca: store.rotate_talos_ca.clone(),
        rotate_kubernetes_ca: store.rotate_kubernetes_ca.clone(),
        ca_generator,
        validator,
    });
    RotationController::new(
        store.cluster_secrets.clone(),
        store.secret_rotation.clone(),
        store.cluster_secrets_rotation_status.clone(),
        ctx,
    )
}

/// Candidate validation uses this timeout for the underlying Talos API
/// call (spec §5 "Cancellation / timeouts").
pub const VALIDATION_TIMEOUT: Duration = Duration::from_secs(10);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CaBundle, ClusterMachineSecrets, ClusterStatus, Metadata, RotateTalosCa, RotationComponent,
        RotationPhase, RotationStatus,
    };
    use crate::rotation::candidates::Candidate;
    use crate::rotation::certs::ClientCertPlan;
    use crate::store::Store;

    struct FixedCaGenerator;
    #[async_trait]
    impl CaGenerator for FixedCaGenerator {
        async fn generate(&self, _component: RotationComponent) -> CoreResult<CaBundle> {
            Ok(CaBundle::new(b"new-crt".to_vec(), b"new-key".to_vec()))
        }
    }

    struct AlwaysValidates;
    #[async_trait]
    impl CandidateValidator for AlwaysValidates {
        async fn validate(
            &self,
            _candidate: &Candidate,
            _component: RotationComponent,
            _plan: &ClientCertPlan,
        ) -> CoreResult<()> {
            Ok(())
        }
    }

    fn secret_rotation_id(cluster_id: &str) -> ResourceId {
        ResourceId::new("cluster", "SecretRotation", cluster_id)
    }

    fn rotation_status_id(cluster_id: &str) -> ResourceId {
        ResourceId::new("cluster", "ClusterSecretsRotationStatus", cluster_id)
    }

    /// One ready, unlocked control-plane machine with a matching
    /// `ClusterMachineSecrets`, plus an unlocked/ready/running cluster and a
    /// fresh `RotateTalosCA` trigger.
    fn seeded_cluster(cluster_id: &str) -> Store {
        let store = Store::new();
        store
            .cluster_status
            .create(
                ResourceId::new("cluster", "ClusterStatus", cluster_id),
                Metadata::new(),
                ClusterStatus { running: true, ready: true, locked: false },
            )
            .unwrap();
        store
            .cluster_machine
            .create(
                ResourceId::new("cluster", "ClusterMachine", "m1"),
                Metadata::new().with_label("role", "controlplane").with_label("ready", "true"),
                crate::model::ClusterMachine {
                    cluster_id: cluster_id.to_string(),
                    machine_set_id: "ms1".to_string(),
                },
            )
            .unwrap();
        store
            .cluster_machine_secrets
            .create(
                ResourceId::new("cluster", "ClusterMachineSecrets", "m1"),
                Metadata::new(),
                ClusterMachineSecrets { cluster_id: cluster_id.to_string(), ..Default::default() },
            )
            .unwrap();
        store
            .secret_rotation
            .create(secret_rotation_id(cluster_id), Metadata::new(), SecretRotation::default())
            .unwrap();
        store
            .rotate_talos_ca
            .create(
                ResourceId::new("cluster", "RotateTalosCA", cluster_id),
                Metadata::new(),
                RotateTalosCa,
            )
            .unwrap();
        store
    }

    #[tokio::test]
    async fn full_cycle_advances_ok_through_post_rotate_and_back_to_ok() {
        let store = seeded_cluster("c1");
        let controller = build(&store, Arc::new(FixedCaGenerator), Arc::new(AlwaysValidates));
        let id = secret_rotation_id("c1");

        // OK: sees the fresh RotateTalosCA trigger, starts the rotation.
        controller.reconcile(&id).await.unwrap();
        let rotation = store.secret_rotation.get(&id).unwrap();
        assert_eq!(rotation.spec.phase, RotationPhase::PreRotate);
        assert_eq!(rotation.spec.status, RotationStatus::InProgress);
        assert_eq!(rotation.spec.component, RotationComponent::TalosCa);

        // PRE_ROTATE: marks the candidate in-progress (Wait), then observes
        // it validated (Advance to ROTATE).
        controller.reconcile(&id).await.unwrap();
        controller.reconcile(&id).await.unwrap();
        assert_eq!(store.secret_rotation.get(&id).unwrap().spec.phase, RotationPhase::Rotate);

        // ROTATE: same two-step dance.
        controller.reconcile(&id).await.unwrap();
        controller.reconcile(&id).await.unwrap();
        assert_eq!(store.secret_rotation.get(&id).unwrap().spec.phase, RotationPhase::PostRotate);

        // POST_ROTATE: same dance, then swaps the CA and returns to OK.
        controller.reconcile(&id).await.unwrap();
        controller.reconcile(&id).await.unwrap();
        let settled = store.secret_rotation.get(&id).unwrap();
        assert_eq!(settled.spec.phase, RotationPhase::Ok);
        assert_eq!(settled.spec.status, RotationStatus::Idle);
        assert_eq!(settled.spec.component, RotationComponent::None);
        assert_eq!(settled.spec.certs.os.crt, b"new-crt");
        assert!(settled.spec.extra_certs.os.is_none());
        assert_eq!(settled.spec.backup_certs_os().len(), 1);

        // Stage index wrapped back to 0 (OK) on the output resource.
        let output = store.cluster_secrets_rotation_status.get(&rotation_status_id("c1")).unwrap();
        assert_eq!(SequenceController::<SecretRotation, ClusterSecretsRotationStatus>::stage_index(&output), 0);

        // OK again: the trigger's version is already latched, nothing to do.
        controller.reconcile(&id).await.unwrap();
        assert_eq!(store.secret_rotation.get(&id).unwrap().spec.phase, RotationPhase::Ok);
    }

    #[tokio::test]
    async fn pause_on_cluster_lock_surfaces_status_text() {
        let store = seeded_cluster("c1");
        store
            .cluster_status
            .update(&ResourceId::new("cluster", "ClusterStatus", "c1"), 1, |r| {
                r.spec.locked = true;
            })
            .unwrap();
        let controller = build(&store, Arc::new(FixedCaGenerator), Arc::new(AlwaysValidates));
        let id = secret_rotation_id("c1");

        controller.reconcile(&id).await.unwrap(); // OK -> PRE_ROTATE
        controller.reconcile(&id).await.unwrap(); // PRE_ROTATE, but cluster is locked

        let output = store.cluster_secrets_rotation_status.get(&rotation_status_id("c1")).unwrap();
        assert_eq!(output.spec.status, "rotation paused");
        assert_eq!(output.spec.step, "waiting for the cluster to be unlocked");
        assert_eq!(store.secret_rotation.get(&id).unwrap().spec.phase, RotationPhase::PreRotate);
    }

    #[tokio::test]
    async fn teardown_cascade_destroys_dependents_when_unblocked() {
        let store = seeded_cluster("c1");
        store
            .cluster_secrets_rotation_status
            .create(rotation_status_id("c1"), Metadata::new(), ClusterSecretsRotationStatus::default())
            .unwrap();
        let ctx = Arc::new(RotationContext {
            cluster_machine: store.cluster_machine.clone(),
            cluster_machine_secrets: store.cluster_machine_secrets.clone(),
            cluster_status: store.cluster_status.clone(),
            rotate_talos_ca: store.rotate_talos_ca.clone(),
            rotate_kubernetes_ca: store.rotate_kubernetes_ca.clone(),
            ca_generator: Arc::new(FixedCaGenerator),
            validator: Arc::new(AlwaysValidates),
        });
        let controller = RotationController::new(
            store.cluster_secrets.clone(),
            store.secret_rotation.clone(),
            store.cluster_secrets_rotation_status.clone(),
            ctx,
        );

        let done = controller.teardown_cascade("c1").unwrap();
        assert!(done);
        assert!(store
            .cluster_machine_secrets
            .get(&ResourceId::new("cluster", "ClusterMachineSecrets", "m1"))
            .is_err());
        assert!(store.secret_rotation.get(&secret_rotation_id("c1")).is_err());
        assert!(store.cluster_secrets_rotation_status.get(&rotation_status_id("c1")).is_err());
    }

    #[tokio::test]
    async fn teardown_cascade_blocks_on_outstanding_finalizer() {
        let store = seeded_cluster("c1");
        store
            .cluster_machine_secrets
            .add_finalizer(&ResourceId::new("cluster", "ClusterMachineSecrets", "m1"), "rotation")
            .unwrap();
        let ctx = Arc::new(RotationContext {
            cluster_machine: store.cluster_machine.clone(),
            cluster_machine_secrets: store.cluster_machine_secrets.clone(),
            cluster_status: store.cluster_status.clone(),
            rotate_talos_ca: store.rotate_talos_ca.clone(),
            rotate_kubernetes_ca: store.rotate_kubernetes_ca.clone(),
            ca_generator: Arc::new(FixedCaGenerator),
            validator: Arc::new(AlwaysValidates),
        });
        let controller = RotationController::new(
            store.cluster_secrets.clone(),
            store.secret_rotation.clone(),
            store.cluster_secrets_rotation_status.clone(),
            ctx,
        );

        let done = controller.teardown_cascade("c1").unwrap();
        assert!(!done, "finalizer should block the cascade");
        assert!(store
            .cluster_machine_secrets
            .get(&ResourceId::new("cluster", "ClusterMachineSecrets", "m1"))
            .is_ok());
    }
}
