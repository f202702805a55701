// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cluster and machine-set resources (spec §3.2).

/// User-created cluster. Holds the versions to install/manage; teardown
/// only completes once every owned child resource is gone.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub talos_version: String,
    pub kubernetes_version: String,
}

impl Cluster {
    #[must_use]
    pub fn new(talos_version: impl Into<String>, kubernetes_version: impl Into<String>) -> Self {
        Self {
            talos_version: talos_version.into(),
            kubernetes_version: kubernetes_version.into(),
        }
    }
}

/// Derived, controller-written view of cluster health/lock state.
///
/// `ClusterLocked` and `Ready`/`Running` are read by the rotation
/// orchestrator (spec §4.5 step 4) to decide whether to pause.
#[derive(Debug, Clone, Default)]
pub struct ClusterStatus {
    pub running: bool,
    pub ready: bool,
    pub locked: bool,
}

impl ClusterStatus {
    /// `true` when the cluster is in a state rotation may proceed in
    /// (spec §4.5 step 4: "cluster is not `Running+Ready`" pauses rotation).
    #[must_use]
    pub fn rotation_allowed(&self) -> bool {
        self.running && self.ready && !self.locked
    }
}

/// Either control-plane or worker role for a [`MachineSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineSetRole {
    ControlPlane,
    Worker,
}

/// Points a [`MachineSet`] at a backup snapshot to restore from.
#[derive(Debug, Clone)]
pub struct BootstrapSpec {
    pub cluster_uuid: String,
    pub snapshot: String,
}

/// Control-plane or worker group within a cluster.
#[derive(Debug, Clone)]
pub struct MachineSet {
    pub cluster_id: String,
    pub role: MachineSetRole,
    pub bootstrap_spec: Option<BootstrapSpec>,
}

impl MachineSet {
    #[must_use]
    pub fn new(cluster_id: impl Into<String>, role: MachineSetRole) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            role,
            bootstrap_spec: None,
        }
    }

    #[must_use]
    pub fn is_control_plane(&self) -> bool {
        self.role == MachineSetRole::ControlPlane
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_allowed_requires_running_ready_unlocked() {
        let mut status = ClusterStatus {
            running: true,
            ready: true,
            locked: false,
        };
        assert!(status.rotation_allowed());
        status.locked = true;
        assert!(!status.rotation_allowed());
        status.locked = false;
        status.ready = false;
        assert!(!status.rotation_allowed());
    }

    #[test]
    fn machine_set_role() {
        let ms = MachineSet::new("prod", MachineSetRole::ControlPlane);
        assert!(ms.is_control_plane());
    }
}
