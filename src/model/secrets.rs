// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret-bundle resources and the cluster-wide rotation state machine
//! (spec §3.2, driven by the orchestrator in [`crate::rotation`]).

use std::collections::VecDeque;

/// `SecretRotation` may hold at most this many historical CA records per
/// component (spec §3.2 invariant, FIFO).
pub const BACKED_UP_ROTATED_SECRETS_LIMIT: usize = 5;

pub const ROTATE_TALOS_CA_VERSION_ANNOTATION: &str = "omni.RotateTalosCAVersion";
pub const ROTATE_TALOS_CA_TIMESTAMP_ANNOTATION: &str = "omni.RotateTalosCATimestamp";
pub const ROTATE_KUBERNETES_CA_VERSION_ANNOTATION: &str = "omni.RotateKubernetesCAVersion";
pub const ROTATE_KUBERNETES_CA_TIMESTAMP_ANNOTATION: &str = "omni.RotateKubernetesCATimestamp";

/// An opaque (cert, key) pair. The core never inspects the bytes beyond
/// passing them to the Talos/Kubernetes API clients; actual PEM/DER
/// handling lives with those external collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaBundle {
    pub crt: Vec<u8>,
    pub key: Vec<u8>,
}

impl CaBundle {
    #[must_use]
    pub fn new(crt: impl Into<Vec<u8>>, key: impl Into<Vec<u8>>) -> Self {
        Self {
            crt: crt.into(),
            key: key.into(),
        }
    }
}

/// The pair of CAs a cluster carries: Talos ("Os") and Kubernetes ("K8S").
#[derive(Debug, Clone, Default)]
pub struct CertPair {
    pub os: CaBundle,
    pub k8s: CaBundle,
}

/// The in-flight replacement material during a rotation; cleared once the
/// rotation reaches `POST_ROTATE`/`OK`.
#[derive(Debug, Clone, Default)]
pub struct ExtraCertPair {
    pub os: Option<CaBundle>,
    pub k8s: Option<CaBundle>,
}

/// Cluster-scoped secret bundle (spec §3.2).
#[derive(Debug, Clone, Default)]
pub struct ClusterSecrets {
    pub certs: CertPair,
    pub encryption_secret: Vec<u8>,
    pub trustd_token: String,
    /// `true` when this bundle was imported from an existing cluster rather
    /// than generated by the bootstrap stage.
    pub imported: bool,
}

/// User-writable trigger resources. Their *resource version* (tracked by
/// the store, not this spec) is what the `OK` stage latches to detect a
/// fresh request (spec §4.5).
#[derive(Debug, Clone, Copy, Default)]
pub struct RotateTalosCa;

#[derive(Debug, Clone, Copy, Default)]
pub struct RotateKubernetesCa;

/// Which CA is being rotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationComponent {
    #[default]
    None,
    TalosCa,
    KubernetesCa,
}

/// Cluster-wide rotation phase (spec §3.2, §4.4-4.5). Monotonically
/// advances `Ok -> PreRotate -> Rotate -> PostRotate -> Ok` and never skips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationPhase {
    #[default]
    Ok,
    PreRotate,
    Rotate,
    PostRotate,
}

impl RotationPhase {
    /// The phase that must precede `self` for a stage to proceed
    /// (spec §4.5 stage precondition: "Phase == previousPhase(P)").
    #[must_use]
    pub fn previous(self) -> RotationPhase {
        match self {
            RotationPhase::Ok => RotationPhase::PostRotate,
            RotationPhase::PreRotate => RotationPhase::Ok,
            RotationPhase::Rotate => RotationPhase::PreRotate,
            RotationPhase::PostRotate => RotationPhase::Rotate,
        }
    }

    /// The phase reached once the current stage completes.
    #[must_use]
    pub fn next(self) -> RotationPhase {
        match self {
            RotationPhase::Ok => RotationPhase::PreRotate,
            RotationPhase::PreRotate => RotationPhase::Rotate,
            RotationPhase::Rotate => RotationPhase::PostRotate,
            RotationPhase::PostRotate => RotationPhase::Ok,
        }
    }
}

/// IDLE/IN_PROGRESS for both the cluster-wide and per-machine rotation
/// records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationStatus {
    #[default]
    Idle,
    InProgress,
}

/// Authoritative, cluster-wide rotation record (spec §3.2's `SecretRotation`).
///
/// Invariant: exactly one component may be rotating at a time (spec §3.2,
/// §4.5.3) — enforced by [`crate::rotation::orchestrator`], not this type.
#[derive(Debug, Clone, Default)]
pub struct SecretRotation {
    pub status: RotationStatus,
    pub component: RotationComponent,
    pub phase: RotationPhase,
    pub certs: CertPair,
    pub extra_certs: ExtraCertPair,
    backup_certs_os: VecDeque<CaBundle>,
    backup_certs_k8s: VecDeque<CaBundle>,
    /// Bumped whenever a new rotation round is initiated; per-machine
    /// records compare against this to tell stale validations from current
    /// ones (spec §4.5 step 5 "SecretRotationVersion matches").
    pub version: u64,
}

impl SecretRotation {
    #[must_use]
    pub fn backup_certs_os(&self) -> &VecDeque<CaBundle> {
        &self.backup_certs_os
    }

    #[must_use]
    pub fn backup_certs_k8s(&self) -> &VecDeque<CaBundle> {
        &self.backup_certs_k8s
    }

    /// Push `bundle` as the newest backup for `component`'s CA, evicting the
    /// oldest once the cap (spec §3.2: 5) is exceeded.
    pub fn push_backup(&mut self, component: RotationComponent, bundle: CaBundle) {
        let queue = match component {
            RotationComponent::TalosCa => &mut self.backup_certs_os,
            RotationComponent::KubernetesCa => &mut self.backup_certs_k8s,
            RotationComponent::None => return,
        };
        queue.push_front(bundle);
        while queue.len() > BACKED_UP_ROTATED_SECRETS_LIMIT {
            queue.pop_back();
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.status == RotationStatus::Idle
    }
}

/// Per-machine copy of secrets plus rotation sub-record (spec §3.2).
#[derive(Debug, Clone, Default)]
pub struct ClusterMachineSecrets {
    /// Owning cluster id; lets the rotation orchestrator scope its
    /// scaling/candidate scan to one cluster at a time (spec §4.5).
    pub cluster_id: String,
    pub certs: CertPair,
    pub rotation: MachineRotation,
}

#[derive(Debug, Clone, Default)]
pub struct MachineRotation {
    pub status: RotationStatus,
    pub component: RotationComponent,
    pub phase: RotationPhase,
    pub extra_certs: ExtraCertPair,
    pub secret_rotation_version: u64,
}

impl MachineRotation {
    /// A machine is "pending" for the current stage when its phase hasn't
    /// caught up yet, or its rotation sub-status is stale relative to the
    /// cluster's current rotation version (spec §4.5 step 3).
    #[must_use]
    pub fn is_pending(&self, target_phase: RotationPhase, current_version: u64) -> bool {
        self.phase != target_phase || self.secret_rotation_version != current_version
    }

    /// A machine is "ongoing" when it is mid-validation for the current
    /// rotation round (spec §4.5 step 3).
    #[must_use]
    pub fn is_ongoing(&self, current_version: u64) -> bool {
        self.status == RotationStatus::InProgress && self.secret_rotation_version == current_version
    }
}

/// User-visible status surfaced by the rotation orchestrator (spec §7).
#[derive(Debug, Clone, Default)]
pub struct ClusterSecretsRotationStatus {
    pub status: String,
    pub step: String,
    pub error: String,
}

impl ClusterSecretsRotationStatus {
    pub fn clear_error(&mut self) {
        self.error.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_cycle_is_total_and_ordered() {
        assert_eq!(RotationPhase::Ok.next(), RotationPhase::PreRotate);
        assert_eq!(RotationPhase::PreRotate.next(), RotationPhase::Rotate);
        assert_eq!(RotationPhase::Rotate.next(), RotationPhase::PostRotate);
        assert_eq!(RotationPhase::PostRotate.next(), RotationPhase::Ok);
        for phase in [
            RotationPhase::Ok,
            RotationPhase::PreRotate,
            RotationPhase::Rotate,
            RotationPhase::PostRotate,
        ] {
            assert_eq!(phase.next().previous(), phase);
        }
    }

    #[test]
    fn backup_fifo_caps_at_five() {
        let mut rotation = SecretRotation::default();
        for i in 0..8u8 {
            rotation.push_backup(RotationComponent::TalosCa, CaBundle::new(vec![i], vec![i]));
        }
        assert_eq!(rotation.backup_certs_os().len(), BACKED_UP_ROTATED_SECRETS_LIMIT);
        // Newest pushed (7) is at the front, oldest surviving is 3.
        assert_eq!(rotation.backup_certs_os().front().unwrap().crt, vec![7]);
        assert_eq!(rotation.backup_certs_os().back().unwrap().crt, vec![3]);
    }

    #[test]
    fn backup_is_component_isolated() {
        let mut rotation = SecretRotation::default();
        rotation.push_backup(RotationComponent::TalosCa, CaBundle::new(vec![1], vec![1]));
        assert_eq!(rotation.backup_certs_os().len(), 1);
        assert_eq!(rotation.backup_certs_k8s().len(), 0);
    }

    #[test]
    fn machine_rotation_pending_vs_ongoing() {
        let mr = MachineRotation {
            status: RotationStatus::InProgress,
            phase: RotationPhase::PreRotate,
            secret_rotation_version: 3,
            ..Default::default()
        };
        assert!(!mr.is_pending(RotationPhase::PreRotate, 3));
        assert!(mr.is_pending(RotationPhase::Rotate, 3));
        assert!(mr.is_ongoing(3));
        assert!(!mr.is_ongoing(4));
    }
}
