// SPDX-License-Identifier: MIT OR Apache-2.0

//! Join/admission pipeline (spec §4.6, C10): join-token shapes and
//! signing, node fingerprinting, and the provision state machine the
//! SideroLink gRPC surface drives.

pub mod fingerprint;
pub mod pipeline;
pub mod token;

pub use fingerprint::{compute_fingerprint, InterfaceMac};
pub use pipeline::{AdmissionService, ProvisionRequest, ProvisionResponse};
pub use token::{JoinToken, TokenExtraData};

use crate::config::CoreConfig;
use crate::store::Store;

/// Wires an [`AdmissionService`] against the shared [`Store`] (spec §9's
/// explicit construction step).
#[must_use]
pub fn build(store: &Store, config: CoreConfig) -> AdmissionService {
    AdmissionService::new(
        store.link.clone(),
        store.pending_machine.clone(),
        store.node_unique_token.clone(),
        store.join_token.clone(),
        store.default_join_token.clone(),
        store.provider_join_config.clone(),
        store.sidero_link_config.clone(),
        config,
    )
}
