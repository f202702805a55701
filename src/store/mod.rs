// SPDX-License-Identifier: MIT OR Apache-2.0

//! The resource store (spec §4.1, C1).

pub mod memory;
pub mod watch;

pub use memory::MemoryStore;
pub use watch::{KindWatcher, WatchEvent};

use std::sync::Arc;

use crate::model::{
    Cluster, ClusterMachine, ClusterMachineConfig, ClusterMachineConfigStatus,
    ClusterMachineSecrets, ClusterMachineStatus, ClusterSecrets, ClusterSecretsRotationStatus,
    ClusterStatus, DefaultJoinToken, InfraMachineStatus, InfraProvider, JoinTokenResource, Link,
    MachinePendingUpdates, MachineSet, MachineSetNode, MachineStatusSnapshot,
    NodeForceDestroyRequest, NodeUniqueToken, PendingMachine, ProviderJoinConfig,
    RotateKubernetesCa, RotateTalosCa, SecretRotation, SideroLinkConfig,
};

/// The process-wide registry of typed stores, one per resource kind (spec
/// §9's "explicit construction step called once during server start-up"
/// in place of scattered module-init side effects).
#[derive(Default)]
pub struct Store {
    pub cluster: Arc<MemoryStore<Cluster>>,
    pub cluster_status: Arc<MemoryStore<ClusterStatus>>,
    pub machine_set: Arc<MemoryStore<MachineSet>>,
    pub machine_set_node: Arc<MemoryStore<MachineSetNode>>,
    pub cluster_machine: Arc<MemoryStore<ClusterMachine>>,
    pub cluster_machine_status: Arc<MemoryStore<ClusterMachineStatus>>,
    pub infra_machine_status: Arc<MemoryStore<InfraMachineStatus>>,
    pub machine_status_snapshot: Arc<MemoryStore<MachineStatusSnapshot>>,
    pub cluster_secrets: Arc<MemoryStore<ClusterSecrets>>,
    pub cluster_machine_secrets: Arc<MemoryStore<ClusterMachineSecrets>>,
    pub secret_rotation: Arc<MemoryStore<SecretRotation>>,
    pub cluster_secrets_rotation_status: Arc<MemoryStore<ClusterSecretsRotationStatus>>,
    pub rotate_talos_ca: Arc<MemoryStore<RotateTalosCa>>,
    pub rotate_kubernetes_ca: Arc<MemoryStore<RotateKubernetesCa>>,
    pub cluster_machine_config: Arc<MemoryStore<ClusterMachineConfig>>,
    pub cluster_machine_config_status: Arc<MemoryStore<ClusterMachineConfigStatus>>,
    pub machine_pending_updates: Arc<MemoryStore<MachinePendingUpdates>>,
    pub node_force_destroy_request: Arc<MemoryStore<NodeForceDestroyRequest>>,
    pub sidero_link_config: Arc<MemoryStore<SideroLinkConfig>>,
    pub link: Arc<MemoryStore<Link>>,
    pub pending_machine: Arc<MemoryStore<PendingMachine>>,
    pub node_unique_token: Arc<MemoryStore<NodeUniqueToken>>,
    pub join_token: Arc<MemoryStore<JoinTokenResource>>,
    pub default_join_token: Arc<MemoryStore<DefaultJoinToken>>,
    pub provider_join_config: Arc<MemoryStore<ProviderJoinConfig>>,
    pub infra_provider: Arc<MemoryStore<InfraProvider>>,
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
