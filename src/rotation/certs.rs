// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-phase CA bundle derivation (spec §4.5.1) and client-cert derivation
//! for candidate validation (spec §4.5.2).

use crate::model::{CaBundle, CertPair, ExtraCertPair, RotationComponent, RotationPhase};

fn current(certs: &CertPair, component: RotationComponent) -> CaBundle {
    match component {
        RotationComponent::TalosCa => certs.os.clone(),
        RotationComponent::KubernetesCa => certs.k8s.clone(),
        RotationComponent::None => CaBundle::default(),
    }
}

fn staged(extra: &ExtraCertPair, component: RotationComponent) -> Option<CaBundle> {
    match component {
        RotationComponent::TalosCa => extra.os.clone(),
        RotationComponent::KubernetesCa => extra.k8s.clone(),
        RotationComponent::None => None,
    }
}

/// What a per-machine `ClusterMachineSecrets.{Certs,ExtraCerts}` pair should
/// hold for `component` at `phase` (spec §4.5.1's table; Kubernetes CA is
/// structurally identical, operating on the `K8s` fields).
#[must_use]
pub fn machine_bundle_for_phase(
    component: RotationComponent,
    phase: RotationPhase,
    cluster_certs: &CertPair,
    cluster_extra: &ExtraCertPair,
) -> (CaBundle, Option<CaBundle>) {
    let old_ca = current(cluster_certs, component);
    let new_ca = staged(cluster_extra, component).unwrap_or_default();

    match phase {
        RotationPhase::PreRotate => (old_ca, Some(new_ca)),
        RotationPhase::Rotate => (new_ca, Some(old_ca)),
        RotationPhase::PostRotate | RotationPhase::Ok => (new_ca, None),
    }
}

/// A plan for the client certificate a candidate validation call signs and
/// presents (spec §4.5.2). `role` is always `"os:admin"` per spec.
#[derive(Debug, Clone)]
pub struct ClientCertPlan {
    pub signing_ca: CaBundle,
    pub trusted_ca: CaBundle,
    pub role: &'static str,
}

/// Derives the client-cert plan for validating a candidate at `phase`
/// (spec §4.5.2). `certs`/`extra_certs` are the cluster-wide rotation
/// record's fields for `component`.
#[must_use]
pub fn client_cert_plan_for_phase(
    component: RotationComponent,
    phase: RotationPhase,
    certs: &CertPair,
    extra_certs: &ExtraCertPair,
) -> ClientCertPlan {
    let old_ca = current(certs, component);
    let new_ca = staged(extra_certs, component).unwrap_or_else(|| old_ca.clone());

    let (signing_ca, trusted_ca) = match phase {
        RotationPhase::PreRotate => (new_ca, old_ca),
        RotationPhase::Rotate => (new_ca.clone(), new_ca),
        RotationPhase::PostRotate => (new_ca.clone(), new_ca),
        RotationPhase::Ok => (old_ca.clone(), old_ca),
    };

    ClientCertPlan {
        signing_ca,
        trusted_ca,
        role: "os:admin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundles() -> (CertPair, ExtraCertPair) {
        let certs = CertPair {
            os: CaBundle::new(b"old-crt".to_vec(), b"old-key".to_vec()),
            k8s: CaBundle::default(),
        };
        let extra = ExtraCertPair {
            os: Some(CaBundle::new(b"new-crt".to_vec(), b"new-key".to_vec())),
            k8s: None,
        };
        (certs, extra)
    }

    #[test]
    fn pre_rotate_keeps_current_and_stages_new() {
        let (certs, extra) = bundles();
        let (bundle, staged) = machine_bundle_for_phase(
            RotationComponent::TalosCa,
            RotationPhase::PreRotate,
            &certs,
            &extra,
        );
        assert_eq!(bundle, certs.os);
        assert_eq!(staged.unwrap(), extra.os.unwrap());
    }

    #[test]
    fn rotate_swaps_in_new_and_keeps_old_as_extra() {
        let (certs, extra) = bundles();
        let (bundle, staged) = machine_bundle_for_phase(
            RotationComponent::TalosCa,
            RotationPhase::Rotate,
            &certs,
            &extra,
        );
        assert_eq!(bundle, extra.os.clone().unwrap());
        assert_eq!(staged.unwrap(), certs.os);
    }

    #[test]
    fn post_rotate_and_ok_clear_extra() {
        let (certs, extra) = bundles();
        for phase in [RotationPhase::PostRotate, RotationPhase::Ok] {
            let (bundle, staged) =
                machine_bundle_for_phase(RotationComponent::TalosCa, phase, &certs, &extra);
            assert_eq!(bundle, extra.os.clone().unwrap());
            assert!(staged.is_none());
        }
    }

    #[test]
    fn client_cert_plan_trusts_old_ca_during_pre_rotate() {
        let (certs, extra) = bundles();
        let plan = client_cert_plan_for_phase(
            RotationComponent::TalosCa,
            RotationPhase::PreRotate,
            &certs,
            &extra,
        );
        assert_eq!(plan.trusted_ca, certs.os);
        assert_eq!(plan.signing_ca, extra.os.unwrap());
    }

    #[test]
    fn client_cert_plan_signs_and_trusts_new_ca_during_post_rotate() {
        let (certs, extra) = bundles();
        let plan = client_cert_plan_for_phase(
            RotationComponent::TalosCa,
            RotationPhase::PostRotate,
            &certs,
            &extra,
        );
        assert_eq!(plan.signing_ca, extra.os.clone().unwrap());
        assert_eq!(plan.trusted_ca, extra.os.unwrap());
    }

    #[test]
    fn client_cert_plan_uses_settled_ca_when_idle() {
        let (certs, extra) = bundles();
        let plan = client_cert_plan_for_phase(RotationComponent::TalosCa, RotationPhase::Ok, &certs, &extra);
        assert_eq!(plan.signing_ca, certs.os);
        assert_eq!(plan.trusted_ca, certs.os);
    }
}
