// SPDX-License-Identifier: MIT OR Apache-2.0

//! Node-to-cluster binding and live status resources (spec §3.2).

/// Binds a physical node id into a [`crate::model::cluster::MachineSet`].
#[derive(Debug, Clone)]
pub struct MachineSetNode {
    pub machine_set_id: String,
}

/// The annotation name that freezes config application for a machine
/// (spec §3.2, §4.8 "Config lock").
pub const MACHINE_LOCKED_ANNOTATION: &str = "omni.MachineLocked";

/// Cluster-scoped identity of a node bound to a cluster.
#[derive(Debug, Clone)]
pub struct ClusterMachine {
    pub cluster_id: String,
    pub machine_set_id: String,
}

/// Live status of a [`ClusterMachine`].
#[derive(Debug, Clone, Default)]
pub struct ClusterMachineStatus {
    pub ready: bool,
    pub management_address: Option<String>,
    pub role_labels: Vec<String>,
}

/// Power state reported by the infra provider for a bare machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
}

/// `infra.MachineStatus` — the infra-provider-reported status of a machine
/// not yet necessarily bound to any cluster.
#[derive(Debug, Clone)]
pub struct InfraMachineStatus {
    pub power_state: PowerState,
}

/// Derived power-stage transitions (spec §4.7, C8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerStage {
    PoweredOff,
    PoweringOn,
}

/// `ClusterMachineStatusSnapshot` / `MachineStatusSnapshot` — the output of
/// the power-stage watcher.
#[derive(Debug, Clone)]
pub struct MachineStatusSnapshot {
    pub power_stage: PowerStage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_state_variants_distinct() {
        assert_ne!(PowerState::On, PowerState::Off);
    }
}
