// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config-application resources driven by [`crate::configstatus`] (spec §4.8).

/// Finalizer serializing reboot-requiring config updates during a graceful
/// rollout (spec §4.8 "Graceful parallelism").
pub const CONFIG_UPDATE_FINALIZER: &str = "omni.ConfigUpdateFinalizer";

/// The desired, rendered machine configuration.
#[derive(Debug, Clone, Default)]
pub struct ClusterMachineConfig {
    pub data: String,
    /// Non-empty when config generation itself failed; mirrored to
    /// `ClusterMachineConfigStatus.last_config_error` and suppresses
    /// emitting a status at all (spec §8 invariant).
    pub generation_error: String,
    /// `true` when this update can be applied without a reboot, letting it
    /// proceed in parallel with others rather than serializing through
    /// `CONFIG_UPDATE_FINALIZER` (spec §4.8 "Graceful parallelism").
    pub no_reboot: bool,
    /// Non-empty when this config change also carries a Talos version bump
    /// (spec §4.8 "Upgrades").
    pub desired_talos_version: String,
    pub secure_boot: bool,
    pub schematic_id: String,
}

impl ClusterMachineConfig {
    #[must_use]
    pub fn has_generation_error(&self) -> bool {
        !self.generation_error.is_empty()
    }

    #[must_use]
    pub fn wants_upgrade(&self, applied_talos_version: &str) -> bool {
        !self.desired_talos_version.is_empty() && self.desired_talos_version != applied_talos_version
    }
}

/// What was actually applied, and the last error observed applying it.
#[derive(Debug, Clone, Default)]
pub struct ClusterMachineConfigStatus {
    pub applied_data: String,
    pub applied_talos_version: String,
    pub last_config_error: String,
}

/// Exposes a pending, not-yet-applied config diff while the machine is
/// locked (spec §4.8 "Config lock").
#[derive(Debug, Clone, Default)]
pub struct MachinePendingUpdates {
    pub config_diff: String,
}

/// Created to short-circuit safety checks and force a non-graceful reset
/// on a specific machine (spec §4.8 "Forced destroy").
#[derive(Debug, Clone, Default)]
pub struct NodeForceDestroyRequest;
