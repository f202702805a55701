// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide configuration for the control-plane core (ambient stack).

/// Whether admission requires every node to present a node-unique token
/// (spec §4.6 step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinTokensMode {
    /// Nodes below the unique-token-capable Talos version may still join
    /// with only a `JoinToken`.
    Legacy,
    /// Every node must present a `NodeUniqueToken`.
    Strict,
}

/// Tunables for the control-plane core that the source left as version
/// comparisons baked into the code (spec §9 "staged upgrade" open question).
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Talos versions strictly below this use `Stage=true` upgrades
    /// (spec §4.8 "Upgrades").
    pub staged_upgrade_below_version: String,
    /// Minimum Talos version that can present a `NodeUniqueToken` at all
    /// (spec §4.6 step 1).
    pub unique_token_min_version: String,
    pub join_tokens_mode: JoinTokensMode,
    /// Resets stay graceful (etcd leave first) below this attempt count
    /// (spec §4.8 "Reset backoff").
    pub graceful_reset_attempt_count: u32,
    /// Etcd-leave is skipped at/above this attempt count.
    pub etcd_leave_attempts_limit: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            staged_upgrade_below_version: "1.10.0".to_string(),
            unique_token_min_version: "1.5.0".to_string(),
            join_tokens_mode: JoinTokensMode::Strict,
            graceful_reset_attempt_count: 3,
            etcd_leave_attempts_limit: 3,
        }
    }
}

impl CoreConfig {
    #[must_use]
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

/// Builder for [`CoreConfig`], following the same pattern as
/// [`crate::runtime::RetryConfigBuilder`].
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    inner: CoreConfigBuilderFields,
}

#[derive(Debug, Clone)]
struct CoreConfigBuilderFields {
    staged_upgrade_below_version: Option<String>,
    unique_token_min_version: Option<String>,
    join_tokens_mode: Option<JoinTokensMode>,
    graceful_reset_attempt_count: Option<u32>,
    etcd_leave_attempts_limit: Option<u32>,
}

impl Default for CoreConfigBuilderFields {
    fn default() -> Self {
        Self {
            staged_upgrade_below_version: None,
            unique_token_min_version: None,
            join_tokens_mode: None,
            graceful_reset_attempt_count: None,
            etcd_leave_attempts_limit: None,
        }
    }
}

impl CoreConfigBuilder {
    #[must_use]
    pub fn staged_upgrade_below_version(mut self, version: impl Into<String>) -> Self {
        self.inner.staged_upgrade_below_version = Some(version.into());
        self
    }

    #[must_use]
    pub fn unique_token_min_version(mut self, version: impl Into<String>) -> Self {
        self.inner.unique_token_min_version = Some(version.into());
        self
    }

    #[must_use]
    pub fn join_tokens_mode(mut self, mode: JoinTokensMode) -> Self {
        self.inner.join_tokens_mode = Some(mode);
        self
    }

    #[must_use]
    pub fn graceful_reset_attempt_count(mut self, count: u32) -> Self {
        self.inner.graceful_reset_attempt_count = Some(count);
        self
    }

    #[must_use]
    pub fn etcd_leave_attempts_limit(mut self, count: u32) -> Self {
        self.inner.etcd_leave_attempts_limit = Some(count);
        self
    }

    #[must_use]
    pub fn build(self) -> CoreConfig {
        let default = CoreConfig::default();
        CoreConfig {
            staged_upgrade_below_version: self
                .inner
                .staged_upgrade_below_version
                .unwrap_or(default.staged_upgrade_below_version),
            unique_token_min_version: self
                .inner
                .unique_token_min_version
                .unwrap_or(default.unique_token_min_version),
            join_tokens_mode: self.inner.join_tokens_mode.unwrap_or(default.join_tokens_mode),
            graceful_reset_attempt_count: self
                .inner
                .graceful_reset_attempt_count
                .unwrap_or(default.graceful_reset_attempt_count),
            etcd_leave_attempts_limit: self
                .inner
                .etcd_leave_attempts_limit
                .unwrap_or(default.etcd_leave_attempts_limit),
        }
    }
}
