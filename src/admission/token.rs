// SPDX-License-Identifier: MIT OR Apache-2.0

//! Join-token shapes and HMAC signing (spec §4.6 "Token shapes", §6
//! "Join-token encoding on the wire").

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{CoreError, CoreResult};

type HmacSha256 = Hmac<Sha256>;

const V1_PREFIX: &str = "v1:";
const V2_PREFIX: &str = "v2:";

/// Extra data carried alongside a signed token. `infra_provider_id` is only
/// meaningful for V2 (per-provider) tokens (spec §4.6 step 2).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenExtraData {
    #[serde(rename = "InfraProviderID", default, skip_serializing_if = "Option::is_none")]
    pub infra_provider_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Envelope {
    extra_data: TokenExtraData,
    signature: String,
}

/// A join token in any of the three wire shapes (spec §4.6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinToken {
    /// Opaque string, matched verbatim against the active secret.
    Plain(String),
    /// `v1:` prefixed, signed with the cluster-wide default secret.
    V1 { extra_data: TokenExtraData, signature: String },
    /// `v2:` prefixed, signed with a per-provider secret.
    V2 { extra_data: TokenExtraData, signature: String },
}

fn sign(secret: &str, extra_data: &TokenExtraData) -> CoreResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| CoreError::Internal(format!("hmac key: {e}")))?;
    let payload = serde_json::to_vec(extra_data)
        .map_err(|e| CoreError::Internal(format!("encode extra data: {e}")))?;
    mac.update(&payload);
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

impl JoinToken {
    /// Mints a signed V1 token (cluster-wide default secret).
    #[must_use]
    pub fn mint_v1(secret: &str, extra_data: TokenExtraData) -> CoreResult<Self> {
        Ok(JoinToken::V1 {
            signature: sign(secret, &extra_data)?,
            extra_data,
        })
    }

    /// Mints a signed V2 token (per-provider secret).
    #[must_use]
    pub fn mint_v2(secret: &str, extra_data: TokenExtraData) -> CoreResult<Self> {
        Ok(JoinToken::V2 {
            signature: sign(secret, &extra_data)?,
            extra_data,
        })
    }

    /// Parses any of the three wire shapes (spec §6).
    pub fn parse(encoded: &str) -> CoreResult<JoinToken> {
        if let Some(rest) = encoded.strip_prefix(V1_PREFIX) {
            let envelope = decode_envelope(rest)?;
            return Ok(JoinToken::V1 {
                extra_data: envelope.extra_data,
                signature: envelope.signature,
            });
        }
        if let Some(rest) = encoded.strip_prefix(V2_PREFIX) {
            let envelope = decode_envelope(rest)?;
            return Ok(JoinToken::V2 {
                extra_data: envelope.extra_data,
                signature: envelope.signature,
            });
        }
        Ok(JoinToken::Plain(encoded.to_string()))
    }

    /// Encodes back to the wire form (spec §8 round-trip law:
    /// `Parse(Encode(t)) = t`).
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            JoinToken::Plain(token) => token.clone(),
            JoinToken::V1 { extra_data, signature } => {
                format!("{V1_PREFIX}{}", encode_envelope(extra_data, signature))
            }
            JoinToken::V2 { extra_data, signature } => {
                format!("{V2_PREFIX}{}", encode_envelope(extra_data, signature))
            }
        }
    }

    /// Verifies a V1/V2 token's signature against `secret`. Always `false`
    /// for a `Plain` token — verbatim comparison is the caller's job.
    #[must_use]
    pub fn verify(&self, secret: &str) -> bool {
        let (extra_data, signature) = match self {
            JoinToken::Plain(_) => return false,
            JoinToken::V1 { extra_data, signature } | JoinToken::V2 { extra_data, signature } => {
                (extra_data, signature)
            }
        };
        let Ok(expected) = sign(secret, extra_data) else {
            return false;
        };
        expected == *signature
    }

    #[must_use]
    pub fn extra_data(&self) -> Option<&TokenExtraData> {
        match self {
            JoinToken::Plain(_) => None,
            JoinToken::V1 { extra_data, .. } | JoinToken::V2 { extra_data, .. } => Some(extra_data),
        }
    }
}

fn encode_envelope(extra_data: &TokenExtraData, signature: &str) -> String {
    let envelope = Envelope {
        extra_data: extra_data.clone(),
        signature: signature.to_string(),
    };
    let json = serde_json::to_vec(&envelope).expect("envelope always serializes");
    URL_SAFE_NO_PAD.encode(json)
}

fn decode_envelope(encoded: &str) -> CoreResult<Envelope> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| CoreError::InvalidArgument(format!("malformed token encoding: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| CoreError::InvalidArgument(format!("malformed token payload: {e}")))
}
