// SPDX-License-Identifier: MIT OR Apache-2.0

//! SideroLink / admission-pipeline resources (spec §3.2, driven by
//! [`crate::admission`]).

/// Annotation marking a [`Link`] whose `NodeUniqueToken` fingerprint must
/// match on every re-contact (spec §4.6 step 3).
pub const FORCE_VALID_NODE_UNIQUE_TOKEN_ANNOTATION: &str = "omni.ForceValidNodeUniqueToken";

/// Annotation marking a [`PendingMachine`] created because an existing
/// `Link`'s UUID was claimed with a different public key (spec §4.6 step 4).
pub const PENDING_MACHINE_UUID_CONFLICT_ANNOTATION: &str = "omni.PendingMachineUUIDConflict";

/// Cluster-wide overlay configuration. `kernel_args` holds `ConnectionParams.Args`
/// before it is split (spec §6).
#[derive(Debug, Clone, Default)]
pub struct SideroLinkConfig {
    pub server_address: String,
    pub server_public_key: String,
    pub kernel_args: String,
}

impl SideroLinkConfig {
    /// Split `ConnectionParams.Args` on ASCII space into kernel args
    /// (spec §6).
    #[must_use]
    pub fn kernel_args(&self) -> Vec<&str> {
        self.kernel_args.split(' ').filter(|s| !s.is_empty()).collect()
    }
}

/// A durable, fully-trusted node-to-overlay binding.
#[derive(Debug, Clone)]
pub struct Link {
    pub node_public_key: String,
    pub node_subnet: String,
}

/// A transient registration awaiting promotion to a [`Link`].
#[derive(Debug, Clone)]
pub struct PendingMachine {
    pub node_public_key: String,
    pub node_subnet: String,
}

/// `{Fingerprint, Token}`, JSON-encoded on the wire (spec §4.6, §6).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NodeUniqueToken {
    #[serde(rename = "Fingerprint")]
    pub fingerprint: String,
    #[serde(rename = "Token")]
    pub token: String,
}

/// ACTIVE/REVOKED lifecycle state for a [`JoinTokenResource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinTokenState {
    #[default]
    Active,
    Revoked,
}

/// A named join token's lifecycle record (spec §4.6 step 6). The token
/// secret itself lives outside the resource graph (it's the thing the
/// resource's id or an external secret store names); this resource only
/// tracks whether it may still be used.
#[derive(Debug, Clone, Default)]
pub struct JoinTokenResource {
    pub state: JoinTokenState,
}

impl JoinTokenResource {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == JoinTokenState::Active
    }
}

/// Identifies which [`JoinTokenResource`] is the cluster-wide default.
#[derive(Debug, Clone, Default)]
pub struct DefaultJoinToken {
    pub token_id: String,
}

/// A per-infra-provider join secret (spec §4.6 step 2, v2 tokens).
#[derive(Debug, Clone, Default)]
pub struct ProviderJoinConfig {
    pub provider_secret: String,
}

/// `infra.Provider` — marker resource naming a registered infra provider.
#[derive(Debug, Clone, Default)]
pub struct InfraProvider;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_args_split_on_space() {
        let cfg = SideroLinkConfig {
            kernel_args: "siderolink.api=https://x talos.platform=metal".to_string(),
            ..Default::default()
        };
        assert_eq!(
            cfg.kernel_args(),
            vec!["siderolink.api=https://x", "talos.platform=metal"]
        );
    }

    #[test]
    fn node_unique_token_round_trips_json() {
        let t = NodeUniqueToken {
            fingerprint: "abc".to_string(),
            token: "def".to_string(),
        };
        let encoded = serde_json::to_string(&t).unwrap();
        let decoded: NodeUniqueToken = serde_json::from_str(&encoded).unwrap();
        assert_eq!(t, decoded);
    }
}
