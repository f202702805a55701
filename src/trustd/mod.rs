// SPDX-License-Identifier: MIT OR Apache-2.0

//! Virtual trustd CA-selection policy (spec §4.9, C11).
//!
//! This is policy only: which CA issues a worker's server cert and which
//! CAs a peer should accept while a Talos CA rotation is in flight. The
//! trustd gRPC surface and the actual X.509 construction are external
//! collaborators (spec §1 non-goal); this module hands them an issuing
//! [`CaBundle`], a set of accepted ones, and a go/no-go on the CSR subject.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{CoreError, CoreResult};
use crate::model::{
    CaBundle, ClusterMachine, ClusterMachineStatus, ClusterSecrets, ResourceId, RotationComponent,
    RotationPhase, RotationStatus, SecretRotation,
};
use crate::store::MemoryStore;

/// A signing request for a worker `apid` server certificate.
#[derive(Debug, Clone)]
pub struct CsrSigningRequest {
    /// The peer IP the CSR arrived over; used to locate the requesting
    /// machine (spec §4.9 step 1).
    pub peer_ip: String,
    /// Opaque CSR bytes, handed to [`CsrSigner`] unexamined.
    pub csr: Vec<u8>,
    /// Whether the CSR's Subject carries an Organization — computed by the
    /// trustd transport layer, which owns X.509 parsing.
    pub subject_has_organization: bool,
}

/// `{Ca, Crt}` (spec §4.9 step 4).
#[derive(Debug, Clone)]
pub struct SignedCert {
    /// Concatenation of every accepted CA's certificate bytes.
    pub ca: Vec<u8>,
    pub crt: Vec<u8>,
}

/// Performs the actual signing once [`TrustdService`] has picked the
/// issuing CA. Kept as a seam: the core selects policy, the collaborator
/// does cryptography.
#[async_trait]
pub trait CsrSigner: Send + Sync {
    async fn sign(&self, issuing_ca: &CaBundle, csr: &[u8]) -> CoreResult<Vec<u8>>;
}

/// Picks the issuing/accepted CA set and signs worker CSRs (spec §4.9).
pub struct TrustdService {
    cluster_machine: Arc<MemoryStore<ClusterMachine>>,
    cluster_machine_status: Arc<MemoryStore<ClusterMachineStatus>>,
    cluster_secrets: Arc<MemoryStore<ClusterSecrets>>,
    secret_rotation: Arc<MemoryStore<SecretRotation>>,
    signer: Arc<dyn CsrSigner>,
}

impl TrustdService {
    #[must_use]
    pub fn new(
        cluster_machine: Arc<MemoryStore<ClusterMachine>>,
        cluster_machine_status: Arc<MemoryStore<ClusterMachineStatus>>,
        cluster_secrets: Arc<MemoryStore<ClusterSecrets>>,
        secret_rotation: Arc<MemoryStore<SecretRotation>>,
        signer: Arc<dyn CsrSigner>,
    ) -> Self {
        Self {
            cluster_machine,
            cluster_machine_status,
            cluster_secrets,
            secret_rotation,
            signer,
        }
    }

    fn locate_machine(&self, peer_ip: &str) -> CoreResult<String> {
        self.cluster_machine_status
            .list("cluster", &[])
            .into_iter()
            .find(|r| r.spec.management_address.as_deref() == Some(peer_ip))
            .map(|r| r.id.id)
            .ok_or_else(|| CoreError::PermissionDenied(format!("no machine for peer {peer_ip}")))
    }

    /// Which CA issues, and which CAs are accepted, for `cluster_id` right
    /// now (spec §4.9 step 2). Falls back to the cluster's steady-state CA
    /// when no Talos-CA rotation is in flight.
    fn select_cas(&self, cluster_id: &str) -> CoreResult<(CaBundle, Vec<CaBundle>)> {
        let secrets = self
            .cluster_secrets
            .get(&ResourceId::new("cluster", "ClusterSecrets", cluster_id))?;

        let rotation = self
            .secret_rotation
            .get(&ResourceId::new("cluster", "SecretRotation", cluster_id))
            .ok();

        let rotating_talos_ca = rotation
            .as_ref()
            .is_some_and(|r| r.spec.status == RotationStatus::InProgress && r.spec.component == RotationComponent::TalosCa);

        if !rotating_talos_ca {
            let os = secrets.spec.certs.os;
            return Ok((os.clone(), vec![os]));
        }

        let rotation = rotation.expect("checked above");
        let mut accepted = vec![rotation.spec.certs.os.clone()];
        if let Some(extra) = &rotation.spec.extra_certs.os {
            accepted.push(extra.clone());
        }
        let issuing = match rotation.spec.phase {
            RotationPhase::Ok | RotationPhase::PostRotate => rotation.spec.certs.os.clone(),
            RotationPhase::PreRotate | RotationPhase::Rotate => rotation
                .spec
                .extra_certs
                .os
                .clone()
                .unwrap_or_else(|| rotation.spec.certs.os.clone()),
        };
        Ok((issuing, accepted))
    }

    /// Runs the full CSR signing policy (spec §4.9).
    pub async fn sign_csr(&self, req: CsrSigningRequest) -> CoreResult<SignedCert> {
        if req.subject_has_organization {
            return Err(CoreError::InvalidArgument(
                "CSR subject must not carry an Organization".into(),
            ));
        }

        let machine_id = self.locate_machine(&req.peer_ip)?;
        let machine = self
            .cluster_machine
            .get(&ResourceId::new("cluster", "ClusterMachine", &machine_id))?;
        let (issuing_ca, accepted_cas) = self.select_cas(&machine.spec.cluster_id)?;

        let crt = self.signer.sign(&issuing_ca, &req.csr).await?;
        let ca = accepted_cas.into_iter().flat_map(|bundle| bundle.crt).collect();
        Ok(SignedCert { ca, crt })
    }
}

/// Wires a [`TrustdService`] against the shared store (spec §9's explicit
/// construction step).
#[must_use]
pub fn build(store: &crate::store::Store, signer: Arc<dyn CsrSigner>) -> TrustdService {
    TrustdService::new(
        store.cluster_machine.clone(),
        store.cluster_machine_status.clone(),
        store.cluster_secrets.clone(),
        store.secret_rotation.clone(),
        signer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CertPair, ExtraCertPair, Metadata};

    struct StubSigner;

    #[async_trait]
    impl CsrSigner for StubSigner {
        async fn sign(&self, issuing_ca: &CaBundle, _csr: &[u8]) -> CoreResult<Vec<u8>> {
            Ok(issuing_ca.key.clone())
        }
    }

    fn setup(cluster_id: &str, machine_id: &str, peer_ip: &str) -> (TrustdService, Arc<MemoryStore<SecretRotation>>) {
        let cluster_machine = Arc::new(MemoryStore::<ClusterMachine>::new());
        cluster_machine
            .create(
                ResourceId::new("cluster", "ClusterMachine", machine_id),
                Metadata::new(),
                ClusterMachine { cluster_id: cluster_id.to_string(), machine_set_id: "cp".into() },
            )
            .unwrap();

        let cluster_machine_status = Arc::new(MemoryStore::<ClusterMachineStatus>::new());
        cluster_machine_status
            .create(
                ResourceId::new("cluster", "ClusterMachineStatus", machine_id),
                Metadata::new(),
                ClusterMachineStatus {
                    ready: true,
                    management_address: Some(peer_ip.to_string()),
                    role_labels: vec![],
                },
            )
            .unwrap();

        let cluster_secrets = Arc::new(MemoryStore::<ClusterSecrets>::new());
        cluster_secrets
            .create(
                ResourceId::new("cluster", "ClusterSecrets", cluster_id),
                Metadata::new(),
                ClusterSecrets {
                    certs: CertPair { os: CaBundle::new(b"steady-os-crt".to_vec(), b"steady-os-key".to_vec()), k8s: CaBundle::default() },
                    ..Default::default()
                },
            )
            .unwrap();

        let secret_rotation = Arc::new(MemoryStore::<SecretRotation>::new());

        let service = TrustdService::new(
            cluster_machine,
            cluster_machine_status,
            cluster_secrets,
            secret_rotation.clone(),
            Arc::new(StubSigner),
        );
        (service, secret_rotation)
    }

    #[tokio::test]
    async fn no_rotation_uses_steady_state_ca() {
        let (service, _) = setup("c1", "m1", "10.0.0.5");
        let signed = service
            .sign_csr(CsrSigningRequest { peer_ip: "10.0.0.5".into(), csr: vec![1, 2, 3], subject_has_organization: false })
            .await
            .unwrap();
        assert_eq!(signed.crt, b"steady-os-key");
        assert_eq!(signed.ca, b"steady-os-crt");
    }

    #[tokio::test]
    async fn pre_rotate_issues_from_new_ca_but_accepts_both() {
        let (service, secret_rotation) = setup("c1", "m1", "10.0.0.5");
        secret_rotation
            .create(
                ResourceId::new("cluster", "SecretRotation", "c1"),
                Metadata::new(),
                SecretRotation {
                    status: RotationStatus::InProgress,
                    component: RotationComponent::TalosCa,
                    phase: RotationPhase::PreRotate,
                    certs: CertPair { os: CaBundle::new(b"old-os-crt".to_vec(), b"old-os-key".to_vec()), k8s: CaBundle::default() },
                    extra_certs: ExtraCertPair { os: Some(CaBundle::new(b"new-os-crt".to_vec(), b"new-os-key".to_vec())), k8s: None },
                    ..Default::default()
                },
            )
            .unwrap();

        let signed = service
            .sign_csr(CsrSigningRequest { peer_ip: "10.0.0.5".into(), csr: vec![], subject_has_organization: false })
            .await
            .unwrap();
        assert_eq!(signed.crt, b"new-os-key");
        assert_eq!(signed.ca, b"old-os-crtnew-os-crt");
    }

    #[tokio::test]
    async fn post_rotate_issues_from_settled_ca() {
        let (service, secret_rotation) = setup("c1", "m1", "10.0.0.5");
        secret_rotation
            .create(
                ResourceId::new("cluster", "SecretRotation", "c1"),
                Metadata::new(),
                SecretRotation {
                    status: RotationStatus::InProgress,
                    component: RotationComponent::TalosCa,
                    phase: RotationPhase::PostRotate,
                    certs: CertPair { os: CaBundle::new(b"settled-crt".to_vec(), b"settled-key".to_vec()), k8s: CaBundle::default() },
                    extra_certs: ExtraCertPair { os: Some(CaBundle::new(b"stale-crt".to_vec(), b"stale-key".to_vec())), k8s: None },
                    ..Default::default()
                },
            )
            .unwrap();

        let signed = service
            .sign_csr(CsrSigningRequest { peer_ip: "10.0.0.5".into(), csr: vec![], subject_has_organization: false })
            .await
            .unwrap();
        assert_eq!(signed.crt, b"settled-key");
    }

    #[tokio::test]
    async fn organization_in_subject_is_rejected() {
        let (service, _) = setup("c1", "m1", "10.0.0.5");
        let err = service
            .sign_csr(CsrSigningRequest { peer_ip: "10.0.0.5".into(), csr: vec![], subject_has_organization: true })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn unknown_peer_is_rejected() {
        let (service, _) = setup("c1", "m1", "10.0.0.5");
        let err = service
            .sign_csr(CsrSigningRequest { peer_ip: "10.9.9.9".into(), csr: vec![], subject_has_organization: false })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::PermissionDenied(_)));
    }
}
