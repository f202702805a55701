// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reset-backoff bookkeeping (spec §4.8 "Reset backoff").
//!
//! These counters are process-local, in-memory state rather than resource-
//! graph state — mirroring the source's `ongoingResets.statuses` pattern
//! called out by spec §5 ("Shared resources"): a short mutex-guarded map,
//! no I/O performed while the lock is held.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::config::CoreConfig;

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    reset_attempts: u32,
    etcd_leave_attempts: u32,
    maintenance_check_attempts: u32,
}

/// What kind of reset to issue for a machine right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// Leave etcd first, then reset.
    Graceful,
    /// Skip the etcd-leave step.
    NonGraceful,
}

/// Tracks per-machine reset/etcd-leave/maintenance-check attempt counts
/// (spec §4.8).
#[derive(Default)]
pub struct ResetTracker {
    counters: Mutex<HashMap<String, Counters>>,
}

impl ResetTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one reset attempt for `machine_id` and reports which mode the
    /// *next* attempt should use, per `config.graceful_reset_attempt_count`.
    #[must_use]
    pub fn record_reset_attempt(&self, machine_id: &str, config: &CoreConfig) -> ResetMode {
        let mut counters = self.counters.lock().expect("reset tracker mutex poisoned");
        let entry = counters.entry(machine_id.to_string()).or_default();
        entry.reset_attempts += 1;
        if entry.reset_attempts <= config.graceful_reset_attempt_count {
            ResetMode::Graceful
        } else {
            ResetMode::NonGraceful
        }
    }

    /// Whether the etcd-leave step should be skipped for `machine_id`
    /// (spec §4.8: `etcdLeaveAttempts >= etcdLeaveAttemptsLimit`).
    #[must_use]
    pub fn should_skip_etcd_leave(&self, machine_id: &str, config: &CoreConfig) -> bool {
        let counters = self.counters.lock().expect("reset tracker mutex poisoned");
        counters
            .get(machine_id)
            .is_some_and(|c| c.etcd_leave_attempts >= config.etcd_leave_attempts_limit)
    }

    pub fn record_etcd_leave_attempt(&self, machine_id: &str) {
        let mut counters = self.counters.lock().expect("reset tracker mutex poisoned");
        counters.entry(machine_id.to_string()).or_default().etcd_leave_attempts += 1;
    }

    pub fn record_maintenance_check(&self, machine_id: &str) {
        let mut counters = self.counters.lock().expect("reset tracker mutex poisoned");
        counters
            .entry(machine_id.to_string())
            .or_default()
            .maintenance_check_attempts += 1;
    }

    /// Clears all counters for a machine once a reset has completed.
    pub fn clear(&self, machine_id: &str) {
        self.counters.lock().expect("reset tracker mutex poisoned").remove(machine_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_mode_flips_after_graceful_attempt_count() {
        let tracker = ResetTracker::new();
        let config = CoreConfig::builder().graceful_reset_attempt_count(2).build();
        assert_eq!(tracker.record_reset_attempt("m1", &config), ResetMode::Graceful);
        assert_eq!(tracker.record_reset_attempt("m1", &config), ResetMode::Graceful);
        assert_eq!(tracker.record_reset_attempt("m1", &config), ResetMode::NonGraceful);
    }

    #[test]
    fn etcd_leave_skipped_once_limit_reached() {
        let tracker = ResetTracker::new();
        let config = CoreConfig::builder().etcd_leave_attempts_limit(1).build();
        assert!(!tracker.should_skip_etcd_leave("m1", &config));
        tracker.record_etcd_leave_attempt("m1");
        assert!(tracker.should_skip_etcd_leave("m1", &config));
    }

    #[test]
    fn clear_resets_all_counters() {
        let tracker = ResetTracker::new();
        let config = CoreConfig::default();
        tracker.record_reset_attempt("m1", &config);
        tracker.record_etcd_leave_attempt("m1");
        tracker.clear("m1");
        assert!(!tracker.should_skip_etcd_leave("m1", &config));
    }
}
