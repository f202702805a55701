// SPDX-License-Identifier: MIT OR Apache-2.0

//! The four rotation stages (spec §4.5): `OK`, `PRE_ROTATE`, `ROTATE`,
//! `POST_ROTATE`, run as a [`crate::sequence::SequenceController`] over the
//! `(SecretRotation, ClusterSecretsRotationStatus)` input/output pair —
//! stage progress and trigger-version latches live on the output, the
//! cert material and phase live on the input.
//!
//! Open question (resolved per spec §9's invitation to pick a reading where
//! the source text is ambiguous): a stage labelled `P` requires
//! `SecretRotation.Phase == P` to already hold on entry — `OK`'s
//! `startCARotation` sets `Phase = PRE_ROTATE` directly, so the `PRE_ROTATE`
//! stage runs exactly when that's already true, not `previousPhase(P)`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{CoreError, CoreResult};
use crate::model::{
    CaBundle, ClusterMachine, ClusterMachineSecrets, ClusterSecretsRotationStatus, ClusterStatus,
    MachineRotation, Metadata, Resource, ResourceId, RotateKubernetesCa, RotateTalosCa,
    RotationComponent, RotationPhase, RotationStatus, SecretRotation,
    ROTATE_KUBERNETES_CA_VERSION_ANNOTATION, ROTATE_TALOS_CA_VERSION_ANNOTATION,
};
use crate::sequence::{Stage, StageOutcome};
use crate::store::MemoryStore;

use super::candidates::{self, Candidate, GatingPolicy};
use super::certs::{client_cert_plan_for_phase, machine_bundle_for_phase, ClientCertPlan};

/// Mints a fresh CA of whatever shape the component needs. The core never
/// performs the actual cryptography; this is the seam an embedder wires to
/// their own CA generator.
#[async_trait]
pub trait CaGenerator: Send + Sync {
    async fn generate(&self, component: RotationComponent) -> CoreResult<CaBundle>;
}

/// Proves a candidate machine is reachable and trusts the right material
/// for `phase` (spec §4.5 step 5). Wraps whatever Talos/Kubernetes API
/// client the embedder has; the core only decides *which* cert material to
/// present and trust (see [`client_cert_plan_for_phase`]).
#[async_trait]
pub trait CandidateValidator: Send + Sync {
    async fn validate(
        &self,
        candidate: &Candidate,
        component: RotationComponent,
        plan: &ClientCertPlan,
    ) -> CoreResult<()>;
}

/// Shared state every rotation stage needs beyond its own `SecretRotation`
/// resource (spec §4.5 steps operate across `ClusterMachine`,
/// `ClusterMachineSecrets`, and `ClusterStatus`) and its
/// `ClusterSecretsRotationStatus` output, which the sequence controller
/// passes into each stage directly.
pub struct RotationContext {
    pub cluster_machine: Arc<MemoryStore<ClusterMachine>>,
    pub cluster_machine_secrets: Arc<MemoryStore<ClusterMachineSecrets>>,
    pub cluster_status: Arc<MemoryStore<ClusterStatus>>,
    pub rotate_talos_ca: Arc<MemoryStore<RotateTalosCa>>,
    pub rotate_kubernetes_ca: Arc<MemoryStore<RotateKubernetesCa>>,
    pub ca_generator: Arc<dyn CaGenerator>,
    pub validator: Arc<dyn CandidateValidator>,
}

fn set_status(output: &mut Resource<ClusterSecretsRotationStatus>, status: &str, step: &str, error: &str) {
    output.spec.status = status.to_string();
    output.spec.step = step.to_string();
    output.spec.error = error.to_string();
}

/// Creates a `ClusterMachineSecrets` for every `ClusterMachine` of this
/// cluster that lacks one, and tears down/destroys any whose machine is
/// gone (spec §4.5 "apply scaling"). Returns `true` if anything changed.
fn reconcile_scaling(ctx: &RotationContext, cluster_id: &str) -> CoreResult<bool> {
    let machines: Vec<_> = ctx
        .cluster_machine
        .list("cluster", &[])
        .into_iter()
        .filter(|m| m.spec.cluster_id == cluster_id)
        .collect();
    let secrets: Vec<_> = ctx
        .cluster_machine_secrets
        .list("cluster", &[])
        .into_iter()
        .filter(|s| s.spec.cluster_id == cluster_id)
        .collect();

    let mut changed = false;

    for machine in &machines {
        let secrets_id = ResourceId::new("cluster", "ClusterMachineSecrets", &machine.id.id);
        if ctx.cluster_machine_secrets.get(&secrets_id).is_err() {
            ctx.cluster_machine_secrets.create(
                secrets_id,
                Metadata::new(),
                ClusterMachineSecrets {
                    cluster_id: cluster_id.to_string(),
                    ..Default::default()
                },
            )?;
            changed = true;
        }
    }

    for secret in &secrets {
        let still_exists = machines.iter().any(|m| m.id.id == secret.id.id);
        if !still_exists {
            if secret.metadata.phase != crate::model::Phase::TearingDown {
                ctx.cluster_machine_secrets.teardown(&secret.id)?;
            }
            match ctx.cluster_machine_secrets.destroy(&secret.id) {
                Ok(()) | Err(CoreError::FailedPrecondition(_)) => {}
                Err(err) => return Err(err),
            }
            changed = true;
        }
    }

    Ok(changed)
}

fn candidates_for(ctx: &RotationContext, cluster_id: &str) -> Vec<(Candidate, ClusterMachineSecrets)> {
    ctx.cluster_machine
        .list("cluster", &[])
        .into_iter()
        .filter(|m| m.spec.cluster_id == cluster_id)
        .filter_map(|machine| {
            let secrets_id = ResourceId::new("cluster", "ClusterMachineSecrets", &machine.id.id);
            let secrets = ctx.cluster_machine_secrets.get(&secrets_id).ok()?;
            Some((
                Candidate {
                    id: machine.id.clone(),
                    control_plane: machine.metadata.label("role") == Some("controlplane"),
                    ready: machine.metadata.label("ready") == Some("true"),
                    locked: machine.metadata.annotation(crate::model::MACHINE_LOCKED_ANNOTATION).is_some(),
                    hostname: machine.id.id.clone(),
                },
                secrets.spec,
            ))
        })
        .collect()
}

/// Runs the steps common to `PRE_ROTATE`, `ROTATE`, `POST_ROTATE` (spec
/// §4.5 "Stages PRE_ROTATE, ROTATE, POST_ROTATE").
async fn run_active_phase(
    ctx: &RotationContext,
    phase: RotationPhase,
    resource: &mut Resource<SecretRotation>,
    output: &mut Resource<ClusterSecretsRotationStatus>,
) -> CoreResult<StageOutcome> {
    let cluster_id = resource.id.id.clone();

    if resource.spec.status != RotationStatus::InProgress || resource.spec.phase != phase {
        return Ok(StageOutcome::Wait);
    }

    if reconcile_scaling(ctx, &cluster_id)? {
        return Ok(StageOutcome::Wait);
    }

    let cluster_status_id = ResourceId::new("cluster", "ClusterStatus", &cluster_id);
    let status = ctx
        .cluster_status
        .get(&cluster_status_id)
        .map(|r| r.spec)
        .unwrap_or_default();
    if !status.rotation_allowed() {
        set_status(output, "rotation paused", "waiting for the cluster to be unlocked", "");
        return Ok(StageOutcome::Wait);
    }

    let component = resource.spec.component;
    let all = candidates_for(ctx, &cluster_id);

    let mut pending = Vec::new();
    for (candidate, secrets) in &all {
        if secrets.rotation.is_ongoing(resource.spec.version) {
            let plan = client_cert_plan_for_phase(
                component,
                phase,
                &resource.spec.certs,
                &resource.spec.extra_certs,
            );
            match ctx.validator.validate(candidate, component, &plan).await {
                Ok(()) => {
                    let id = ResourceId::new("cluster", "ClusterMachineSecrets", &candidate.id.id);
                    if let Ok(existing) = ctx.cluster_machine_secrets.get(&id) {
                        ctx.cluster_machine_secrets
                            .update(&id, existing.metadata.version, |r| {
                                r.spec.rotation.status = RotationStatus::Idle;
                            })?;
                    }
                }
                Err(err) if err.skip_reconcile() => {}
                Err(err) => return Err(err),
            }
        } else if secrets.rotation.is_pending(phase, resource.spec.version) {
            pending.push(candidate.clone());
        }
    }

    let refreshed = candidates_for(ctx, &cluster_id);
    let still_pending_or_ongoing = refreshed.iter().any(|(_, s)| {
        s.rotation.is_pending(phase, resource.spec.version)
            || s.rotation.is_ongoing(resource.spec.version)
    });

    if !still_pending_or_ongoing {
        if phase == RotationPhase::PostRotate {
            let old_os = resource.spec.certs.os.clone();
            let old_k8s = resource.spec.certs.k8s.clone();
            match component {
                RotationComponent::TalosCa => {
                    resource.spec.push_backup(RotationComponent::TalosCa, old_os);
                    if let Some(new_ca) = resource.spec.extra_certs.os.take() {
                        resource.spec.certs.os = new_ca;
                    }
                }
                RotationComponent::KubernetesCa => {
                    resource.spec.push_backup(RotationComponent::KubernetesCa, old_k8s);
                    if let Some(new_ca) = resource.spec.extra_certs.k8s.take() {
                        resource.spec.certs.k8s = new_ca;
                    }
                }
                RotationComponent::None => {}
            }
            resource.spec.status = RotationStatus::Idle;
            resource.spec.component = RotationComponent::None;
        }
        resource.spec.phase = phase.next();
        set_status(output, "rotation complete", "returning to steady state", "");
        return Ok(StageOutcome::Advance);
    }

    if !pending.is_empty() {
        let set = candidates::viable(pending, GatingPolicy::Serial, GatingPolicy::Parallel);
        for candidate in &set.viable {
            let id = ResourceId::new("cluster", "ClusterMachineSecrets", &candidate.id.id);
            let (bundle, extra) =
                machine_bundle_for_phase(component, phase, &resource.spec.certs, &resource.spec.extra_certs);
            if let Ok(existing) = ctx.cluster_machine_secrets.get(&id) {
                ctx.cluster_machine_secrets
                    .update(&id, existing.metadata.version, |r| {
                        r.spec.rotation = MachineRotation {
                            status: RotationStatus::InProgress,
                            component,
                            phase,
                            extra_certs: crate::model::ExtraCertPair::default(),
                            secret_rotation_version: resource.spec.version,
                        };
                        match component {
                            RotationComponent::TalosCa => {
                                r.spec.certs.os = bundle.clone();
                                r.spec.rotation.extra_certs.os = extra.clone();
                            }
                            RotationComponent::KubernetesCa => {
                                r.spec.certs.k8s = bundle.clone();
                                r.spec.rotation.extra_certs.k8s = extra.clone();
                            }
                            RotationComponent::None => {}
                        }
                    })?;
            }
        }
    }

    set_status(
        output,
        &format!("rotation phase {phase:?}"),
        "rotating candidate machines",
        "",
    );
    Ok(StageOutcome::Wait)
}

pub struct OkStage {
    pub ctx: Arc<RotationContext>,
}

#[async_trait]
impl Stage<SecretRotation, ClusterSecretsRotationStatus> for OkStage {
    fn name(&self) -> &str {
        "OK"
    }

    async fn run(
        &self,
        resource: &mut Resource<SecretRotation>,
        output: &mut Resource<ClusterSecretsRotationStatus>,
    ) -> CoreResult<StageOutcome> {
        let cluster_id = resource.id.id.clone();
        reconcile_scaling(&self.ctx, &cluster_id)?;

        if resource.spec.status != RotationStatus::InProgress {
            resource.spec.component = RotationComponent::None;
        }

        let talos_trigger = ResourceId::new("cluster", "RotateTalosCA", &cluster_id);
        let k8s_trigger = ResourceId::new("cluster", "RotateKubernetesCA", &cluster_id);

        if let Ok(trigger) = self.ctx.rotate_talos_ca.get(&talos_trigger) {
            // Latched on the output, not the input, so the trigger's
            // resource version survives independently of the rotation
            // record's own lifecycle (spec §3.2 "RotateTalosCA").
            let latched = output
                .metadata
                .annotation(ROTATE_TALOS_CA_VERSION_ANNOTATION)
                .and_then(|v| v.parse::<u64>().ok());
            if latched != Some(trigger.metadata.version) {
                let new_ca = self.ctx.ca_generator.generate(RotationComponent::TalosCa).await?;
                resource.spec.extra_certs.os = Some(new_ca);
                resource.spec.status = RotationStatus::InProgress;
                resource.spec.component = RotationComponent::TalosCa;
                resource.spec.phase = RotationPhase::PreRotate;
                resource.spec.version += 1;
                output.metadata.set_annotation(
                    ROTATE_TALOS_CA_VERSION_ANNOTATION,
                    trigger.metadata.version.to_string(),
                );
                return Ok(StageOutcome::Advance);
            }
        }

        if let Ok(trigger) = self.ctx.rotate_kubernetes_ca.get(&k8s_trigger) {
            let latched = output
                .metadata
                .annotation(ROTATE_KUBERNETES_CA_VERSION_ANNOTATION)
                .and_then(|v| v.parse::<u64>().ok());
            if latched != Some(trigger.metadata.version) {
                let new_ca = self
                    .ctx
                    .ca_generator
                    .generate(RotationComponent::KubernetesCa)
                    .await?;
                resource.spec.extra_certs.k8s = Some(new_ca);
                resource.spec.status = RotationStatus::InProgress;
                resource.spec.component = RotationComponent::KubernetesCa;
                resource.spec.phase = RotationPhase::PreRotate;
                resource.spec.version += 1;
                output.metadata.set_annotation(
                    ROTATE_KUBERNETES_CA_VERSION_ANNOTATION,
                    trigger.metadata.version.to_string(),
                );
                return Ok(StageOutcome::Advance);
            }
        }

        Ok(StageOutcome::Wait)
    }
}

pub struct PreRotateStage {
    pub ctx: Arc<RotationContext>,
}

#[async_trait]
impl Stage<SecretRotation, ClusterSecretsRotationStatus> for PreRotateStage {
    fn name(&self) -> &str {
        "PRE_ROTATE"
    }

    async fn run(
        &self,
        resource: &mut Resource<SecretRotation>,
        output: &mut Resource<ClusterSecretsRotationStatus>,
    ) -> CoreResult<StageOutcome> {
        run_active_phase(&self.ctx, RotationPhase::PreRotate, resource, output).await
    }
}

pub struct RotateStage {
    pub ctx: Arc<RotationContext>,
}

#[async_trait]
impl Stage<SecretRotation, ClusterSecretsRotationStatus> for RotateStage {
    fn name(&self) -> &str {
        "ROTATE"
    }

    async fn run(
        &self,
        resource: &mut Resource<SecretRotation>,
        output: &mut Resource<ClusterSecretsRotationStatus>,
    ) -> CoreResult<StageOutcome> {
        run_active_phase(&self.ctx, RotationPhase::Rotate, resource, output).await
    }
}

pub struct PostRotateStage {
    pub ctx: Arc<RotationContext>,
}

#[async_trait]
impl Stage<SecretRotation, ClusterSecretsRotationStatus> for PostRotateStage {
    fn name(&self) -> &str {
        "POST_ROTATE"
    }

    async fn run(
        &self,
        resource: &mut Resource<SecretRotation>,
        output: &mut Resource<ClusterSecretsRotationStatus>,
    ) -> CoreResult<StageOutcome> {
        run_active_phase(&self.ctx, RotationPhase::PostRotate, resource, output).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopGenerator;
    #[async_trait]
    impl CaGenerator for NoopGenerator {
        async fn generate(&self, _component: RotationComponent) -> CoreResult<CaBundle> {
            Ok(CaBundle::default())
        }
    }

    struct NoopValidator;
    #[async_trait]
    impl CandidateValidator for NoopValidator {
        async fn validate(
            &self,
            _candidate: &Candidate,
            _component: RotationComponent,
            _plan: &ClientCertPlan,
        ) -> CoreResult<()> {
            Ok(())
        }
    }

    fn test_ctx() -> RotationContext {
        RotationContext {
            cluster_machine: Arc::new(MemoryStore::new()),
            cluster_machine_secrets: Arc::new(MemoryStore::new()),
            cluster_status: Arc::new(MemoryStore::new()),
            rotate_talos_ca: Arc::new(MemoryStore::new()),
            rotate_kubernetes_ca: Arc::new(MemoryStore::new()),
            ca_generator: Arc::new(NoopGenerator),
            validator: Arc::new(NoopValidator),
        }
    }

    #[test]
    fn set_status_overwrites_all_three_fields() {
        let mut output = Resource::new(
            ResourceId::new("cluster", "ClusterSecretsRotationStatus", "c1"),
            ClusterSecretsRotationStatus::default(),
        );
        set_status(&mut output, "busy", "rotating", "boom");
        assert_eq!(output.spec.status, "busy");
        assert_eq!(output.spec.step, "rotating");
        assert_eq!(output.spec.error, "boom");
    }

    #[test]
    fn reconcile_scaling_creates_missing_and_tears_down_orphaned_secrets() {
        let ctx = test_ctx();
        ctx.cluster_machine
            .create(
                ResourceId::new("cluster", "ClusterMachine", "m1"),
                crate::model::Metadata::new(),
                ClusterMachine { cluster_id: "c1".to_string(), machine_set_id: "ms1".to_string() },
            )
            .unwrap();
        ctx.cluster_machine_secrets
            .create(
                ResourceId::new("cluster", "ClusterMachineSecrets", "stale"),
                crate::model::Metadata::new(),
                ClusterMachineSecrets { cluster_id: "c1".to_string(), ..Default::default() },
            )
            .unwrap();

        let changed = reconcile_scaling(&ctx, "c1").unwrap();
        assert!(changed);
        assert!(ctx
            .cluster_machine_secrets
            .get(&ResourceId::new("cluster", "ClusterMachineSecrets", "m1"))
            .is_ok());
        assert!(ctx
            .cluster_machine_secrets
            .get(&ResourceId::new("cluster", "ClusterMachineSecrets", "stale"))
            .is_err());
    }

    #[tokio::test]
    async fn run_active_phase_waits_when_phase_does_not_match() {
        let ctx = test_ctx();
        let mut resource = Resource::new(
            ResourceId::new("cluster", "SecretRotation", "c1"),
            SecretRotation { phase: RotationPhase::Ok, status: RotationStatus::Idle, ..Default::default() },
        );
        let mut output = Resource::new(
            ResourceId::new("cluster", "ClusterSecretsRotationStatus", "c1"),
            ClusterSecretsRotationStatus::default(),
        );
        let outcome = run_active_phase(&ctx, RotationPhase::PreRotate, &mut resource, &mut output)
            .await
            .unwrap();
        assert_eq!(outcome, StageOutcome::Wait);
    }

    #[tokio::test]
    async fn run_active_phase_pauses_when_cluster_locked() {
        let ctx = test_ctx();
        ctx.cluster_status
            .create(
                ResourceId::new("cluster", "ClusterStatus", "c1"),
                crate::model::Metadata::new(),
                ClusterStatus { running: true, ready: true, locked: true },
            )
            .unwrap();
        let mut resource = Resource::new(
            ResourceId::new("cluster", "SecretRotation", "c1"),
            SecretRotation {
                phase: RotationPhase::PreRotate,
                status: RotationStatus::InProgress,
                ..Default::default()
            },
        );
        let mut output = Resource::new(
            ResourceId::new("cluster", "ClusterSecretsRotationStatus", "c1"),
            ClusterSecretsRotationStatus::default(),
        );
        let outcome = run_active_phase(&ctx, RotationPhase::PreRotate, &mut resource, &mut output)
            .await
            .unwrap();
        assert_eq!(outcome, StageOutcome::Wait);
        assert_eq!(output.spec.status, "rotation paused");
        assert_eq!(output.spec.step, "waiting for the cluster to be unlocked");
    }
}
