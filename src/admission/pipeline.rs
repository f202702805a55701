// SPDX-License-Identifier: MIT OR Apache-2.0

//! The SideroLink provision state machine (spec §4.6 "Provision state
//! machine", §6 "SideroLink provision RPC").

use std::sync::Arc;

use crate::config::{CoreConfig, JoinTokensMode};
use crate::error::{CoreError, CoreResult};
use crate::model::{
    DefaultJoinToken, JoinTokenResource, Link, Metadata, NodeUniqueToken, PendingMachine,
    ProviderJoinConfig, ResourceId, SideroLinkConfig, FORCE_VALID_NODE_UNIQUE_TOKEN_ANNOTATION,
    PENDING_MACHINE_UUID_CONFLICT_ANNOTATION,
};
use crate::store::MemoryStore;

use super::token::JoinToken;

const DEFAULT_TOKEN_ID: &str = "default";

/// `{NodeUUID, NodePublicKey, TalosVersion, JoinToken?, NodeUniqueToken?}`
/// (spec §4.6 "Provision request inputs").
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub node_uuid: String,
    pub node_public_key: String,
    pub node_subnet: String,
    pub talos_version: String,
    pub join_token: Option<String>,
    pub node_unique_token: Option<NodeUniqueToken>,
}

/// `{ServerAddress, ServerPublicKey, NodeAddressPrefix, …}` (spec §6).
#[derive(Debug, Clone)]
pub struct ProvisionResponse {
    pub server_address: String,
    pub server_public_key: String,
    pub node_address_prefix: String,
}

fn link_id(uuid: &str) -> ResourceId {
    ResourceId::new("sidero", "SideroLink.Link", uuid)
}
fn pending_machine_id(public_key: &str) -> ResourceId {
    ResourceId::new("sidero", "PendingMachine", public_key)
}
fn node_unique_token_id(uuid: &str) -> ResourceId {
    ResourceId::new("sidero", "NodeUniqueToken", uuid)
}
fn join_token_id(token: &str) -> ResourceId {
    ResourceId::new("sidero", "JoinToken", token)
}
fn provider_join_config_id(provider: &str) -> ResourceId {
    ResourceId::new("sidero", "ProviderJoinConfig", provider)
}
fn default_join_token_id() -> ResourceId {
    ResourceId::new("sidero", "DefaultJoinToken", DEFAULT_TOKEN_ID)
}

/// Drives the provision RPC (spec §4.6, §6).
pub struct AdmissionService {
    link: Arc<MemoryStore<Link>>,
    pending_machine: Arc<MemoryStore<PendingMachine>>,
    node_unique_token: Arc<MemoryStore<NodeUniqueToken>>,
    join_token: Arc<MemoryStore<JoinTokenResource>>,
    default_join_token: Arc<MemoryStore<DefaultJoinToken>>,
    provider_join_config: Arc<MemoryStore<ProviderJoinConfig>>,
    sidero_link_config: Arc<MemoryStore<SideroLinkConfig>>,
    config: CoreConfig,
}

impl AdmissionService {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        link: Arc<MemoryStore<Link>>,
        pending_machine: Arc<MemoryStore<PendingMachine>>,
        node_unique_token: Arc<MemoryStore<NodeUniqueToken>>,
        join_token: Arc<MemoryStore<JoinTokenResource>>,
        default_join_token: Arc<MemoryStore<DefaultJoinToken>>,
        provider_join_config: Arc<MemoryStore<ProviderJoinConfig>>,
        sidero_link_config: Arc<MemoryStore<SideroLinkConfig>>,
        config: CoreConfig,
    ) -> Self {
        Self {
            link,
            pending_machine,
            node_unique_token,
            join_token,
            default_join_token,
            provider_join_config,
            sidero_link_config,
            config,
        }
    }

    /// Step 1: version gate (spec §4.6).
    fn check_version_gate(&self, req: &ProvisionRequest) -> CoreResult<()> {
        let supports_unique_token = !version_less_than(&req.talos_version, &self.config.unique_token_min_version);
        if supports_unique_token {
            if req.node_unique_token.is_none() {
                return Err(CoreError::FailedPrecondition(
                    "node unique token required for this Talos version".into(),
                ));
            }
            return Ok(());
        }
        match self.config.join_tokens_mode {
            JoinTokensMode::Strict => Err(CoreError::FailedPrecondition(format!(
                "Talos {} is below the minimum version supporting unique tokens",
                req.talos_version
            ))),
            JoinTokensMode::Legacy => Ok(()),
        }
    }

    /// Step 2: join-token validation, including the uncached V2
    /// provider-scoped lookup (spec §4.6 step 2).
    fn validate_join_token(&self, req: &ProvisionRequest) -> CoreResult<()> {
        let Some(raw) = &req.join_token else {
            return Err(CoreError::PermissionDenied("missing join token".into()));
        };
        let token = JoinToken::parse(raw)?;

        match &token {
            JoinToken::Plain(value) => {
                let resource = self
                    .join_token
                    .get(&join_token_id(value))
                    .map_err(|_| CoreError::PermissionDenied("unknown join token".into()))?;
                if !resource.spec.is_active() {
                    return Err(CoreError::PermissionDenied("join token revoked".into()));
                }
                let default = self.active_default_id()?;
                if *value != default {
                    return Err(CoreError::PermissionDenied("not the active default join token".into()));
                }
                Ok(())
            }
            JoinToken::V1 { .. } => {
                let default = self.active_default_id()?;
                let resource = self
                    .join_token
                    .get(&join_token_id(&default))
                    .map_err(|_| CoreError::PermissionDenied("unknown join token".into()))?;
                if !resource.spec.is_active() {
                    return Err(CoreError::PermissionDenied("join token revoked".into()));
                }
                if !token.verify(&default) {
                    return Err(CoreError::PermissionDenied("invalid join token signature".into()));
                }
                Ok(())
            }
            JoinToken::V2 { extra_data, .. } => {
                let provider_id = extra_data
                    .infra_provider_id
                    .as_deref()
                    .ok_or_else(|| CoreError::InvalidArgument("V2 token missing InfraProviderID".into()))?;
                // Uncached: a provider's secret can rotate independently of
                // anything this controller watches (spec §4.6 step 2).
                let provider = self
                    .provider_join_config
                    .get_uncached(&provider_join_config_id(provider_id))
                    .map_err(|_| CoreError::PermissionDenied(format!("unknown infra provider {provider_id}")))?;
                if !token.verify(&provider.spec.provider_secret) {
                    return Err(CoreError::PermissionDenied("invalid join token signature".into()));
                }
                Ok(())
            }
        }
    }

    fn active_default_id(&self) -> CoreResult<String> {
        let default = self
            .default_join_token
            .get(&default_join_token_id())
            .map_err(|_| CoreError::PermissionDenied("no active default join token".into()))?;
        Ok(default.spec.token_id)
    }

    /// Step 3: fingerprint anti-replay (spec §4.6 step 3).
    fn check_fingerprint_replay(&self, req: &ProvisionRequest) -> CoreResult<()> {
        let Some(incoming) = &req.node_unique_token else {
            return Ok(());
        };
        let Ok(link) = self.link.get(&link_id(&req.node_uuid)) else {
            return Ok(());
        };
        if link.metadata.annotation(FORCE_VALID_NODE_UNIQUE_TOKEN_ANNOTATION).is_none() {
            return Ok(());
        }
        if let Ok(existing) = self.node_unique_token.get(&node_unique_token_id(&req.node_uuid)) {
            if existing.spec.fingerprint == incoming.fingerprint && existing.spec.token != incoming.token {
                return Err(CoreError::PermissionDenied(
                    "node unique token fingerprint replay detected".into(),
                ));
            }
        }
        Ok(())
    }

    /// Step 4: UUID-conflict detection (spec §4.6 step 4). Returns `true`
    /// when a conflict was recorded and admission must stop.
    fn detect_uuid_conflict(&self, req: &ProvisionRequest) -> CoreResult<bool> {
        let Ok(existing) = self.link.get(&link_id(&req.node_uuid)) else {
            return Ok(false);
        };
        if existing.spec.node_public_key == req.node_public_key {
            return Ok(false);
        }
        let id = pending_machine_id(&req.node_public_key);
        let metadata = Metadata::new().with_annotation(PENDING_MACHINE_UUID_CONFLICT_ANNOTATION, "true");
        let spec = PendingMachine {
            node_public_key: req.node_public_key.clone(),
            node_subnet: req.node_subnet.clone(),
        };
        match self.pending_machine.get(&id) {
            Ok(current) => {
                self.pending_machine.update(&id, current.metadata.version, |r| {
                    r.spec = spec;
                    r.metadata = metadata.clone();
                })?;
            }
            Err(CoreError::NotFound(_)) => {
                self.pending_machine.create(id, metadata, spec)?;
            }
            Err(err) => return Err(err),
        }
        Ok(true)
    }

    /// Step 5: admission outcome (spec §4.6 step 5). First contact (no
    /// unique token yet) just records a `PendingMachine`. Re-contact with a
    /// valid unique token promotes that `PendingMachine` to a `Link`,
    /// carrying over its metadata/annotations, then writes the
    /// `NodeUniqueToken`.
    fn admit(&self, req: &ProvisionRequest) -> CoreResult<()> {
        let Some(token) = &req.node_unique_token else {
            let id = pending_machine_id(&req.node_public_key);
            let spec = PendingMachine {
                node_public_key: req.node_public_key.clone(),
                node_subnet: req.node_subnet.clone(),
            };
            match self.pending_machine.get(&id) {
                Ok(current) => {
                    self.pending_machine
                        .update(&id, current.metadata.version, |r| r.spec = spec)?;
                }
                Err(CoreError::NotFound(_)) => {
                    self.pending_machine.create(id, Metadata::new(), spec)?;
                }
                Err(err) => return Err(err),
            }
            return Ok(());
        };

        let pending_id = pending_machine_id(&req.node_public_key);
        let promoted_metadata = match self.pending_machine.get(&pending_id) {
            Ok(pending) => pending.metadata.clone(),
            Err(CoreError::NotFound(_)) => Metadata::new(),
            Err(err) => return Err(err),
        };
        let link_spec = Link {
            node_public_key: req.node_public_key.clone(),
            node_subnet: req.node_subnet.clone(),
        };
        let id = link_id(&req.node_uuid);
        match self.link.get(&id) {
            Ok(current) => {
                self.link
                    .update(&id, current.metadata.version, |r| r.spec = link_spec)?;
            }
            Err(CoreError::NotFound(_)) => {
                self.link.create(id, promoted_metadata, link_spec)?;
            }
            Err(err) => return Err(err),
        }

        let id = node_unique_token_id(&req.node_uuid);
        match self.node_unique_token.get(&id) {
            Ok(current) => {
                self.node_unique_token
                    .update(&id, current.metadata.version, |r| r.spec = token.clone())?;
            }
            Err(CoreError::NotFound(_)) => {
                self.node_unique_token.create(id, Metadata::new(), token.clone())?;
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    fn response(&self) -> CoreResult<ProvisionResponse> {
        let config = self
            .sidero_link_config
            .list("sidero", &[])
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::Unavailable("SideroLink config not available".into()))?;
        Ok(ProvisionResponse {
            server_address: config.spec.server_address,
            server_public_key: config.spec.server_public_key,
            node_address_prefix: String::new(),
        })
    }

    /// Runs the full provision state machine (spec §4.6).
    pub async fn provision(&self, req: ProvisionRequest) -> CoreResult<ProvisionResponse> {
        self.check_version_gate(&req)?;
        self.validate_join_token(&req)?;
        self.check_fingerprint_replay(&req)?;
        if self.detect_uuid_conflict(&req)? {
            return Err(CoreError::PermissionDenied(
                "node UUID already bound to a different public key".into(),
            ));
        }
        self.admit(&req)?;
        self.response()
    }
}

fn version_less_than(version: &str, bound: &str) -> bool {
    let parse = |v: &str| -> Vec<u64> {
        v.trim_start_matches('v')
            .split('.')
            .map(|part| part.parse::<u64>().unwrap_or(u64::MAX))
            .collect()
    };
    parse(version) < parse(bound)
}
