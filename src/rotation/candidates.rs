// SPDX-License-Identifier: MIT OR Apache-2.0

//! Candidate ordering and gating for the rotation orchestrator (spec §4.5,
//! "Candidate ordering and gating (C7)").

use crate::model::ResourceId;

/// How many machines of a role may be mid-rotation at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatingPolicy {
    /// Only the head of the sorted list is viable this cycle.
    Serial,
    /// Every ready, unlocked machine of the role is viable at once.
    Parallel,
}

/// One machine under consideration for this rotation cycle.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: ResourceId,
    pub control_plane: bool,
    pub ready: bool,
    pub locked: bool,
    pub hostname: String,
}

/// The result of a gating pass: who may be rotated now, and who is held
/// back (still pending or explicitly locked).
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    pub viable: Vec<Candidate>,
    pub blocked: Vec<Candidate>,
}

impl CandidateSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.viable.is_empty() && self.blocked.is_empty()
    }
}

/// Sorts by control-plane-first, ready-first, not-locked-first, then
/// hostname (spec §4.5 candidate ordering step 1).
fn sort_key(candidate: &Candidate) -> (std::cmp::Reverse<bool>, std::cmp::Reverse<bool>, std::cmp::Reverse<bool>, &str) {
    (
        std::cmp::Reverse(candidate.control_plane),
        std::cmp::Reverse(candidate.ready),
        std::cmp::Reverse(!candidate.locked),
        candidate.hostname.as_str(),
    )
}

fn gate(mut sorted: Vec<Candidate>, policy: GatingPolicy) -> CandidateSet {
    let split_at = sorted
        .iter()
        .position(|c| !c.ready || c.locked)
        .unwrap_or(sorted.len());
    let mut blocked: Vec<Candidate> = sorted.split_off(split_at);
    let mut viable = sorted;

    if policy == GatingPolicy::Serial && viable.len() > 1 {
        let rest = viable.split_off(1);
        blocked.splice(0..0, rest);
    }

    CandidateSet { viable, blocked }
}

/// `Candidates.Viable(controlPlaneFilter, workerFilter)` (spec §4.5).
///
/// Control-plane candidates are resolved first; if any exist (viable or
/// blocked) workers are not considered this cycle.
#[must_use]
pub fn viable(
    candidates: Vec<Candidate>,
    control_plane_policy: GatingPolicy,
    worker_policy: GatingPolicy,
) -> CandidateSet {
    let mut sorted = candidates;
    sorted.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));

    let (cp, workers): (Vec<_>, Vec<_>) = sorted.into_iter().partition(|c| c.control_plane);

    let cp_set = gate(cp, control_plane_policy);
    if !cp_set.is_empty() {
        return cp_set;
    }

    gate(workers, worker_policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, cp: bool, ready: bool, locked: bool) -> Candidate {
        Candidate {
            id: ResourceId::new("cluster", "ClusterMachine", id),
            control_plane: cp,
            ready,
            locked,
            hostname: id.to_string(),
        }
    }

    #[test]
    fn serial_cp_only_surfaces_the_head() {
        let candidates = vec![
            candidate("cp-b", true, true, false),
            candidate("cp-a", true, true, false),
            candidate("worker-a", false, true, false),
        ];
        let set = viable(candidates, GatingPolicy::Serial, GatingPolicy::Parallel);
        assert_eq!(set.viable.len(), 1);
        assert_eq!(set.viable[0].id.id, "cp-a");
        assert_eq!(set.blocked.len(), 1);
        assert_eq!(set.blocked[0].id.id, "cp-b");
    }

    #[test]
    fn parallel_workers_all_viable_when_no_cp_present() {
        let candidates = vec![
            candidate("worker-b", false, true, false),
            candidate("worker-a", false, true, false),
        ];
        let set = viable(candidates, GatingPolicy::Serial, GatingPolicy::Parallel);
        assert_eq!(set.viable.len(), 2);
        assert_eq!(set.viable[0].id.id, "worker-a");
    }

    #[test]
    fn locked_or_not_ready_candidates_are_blocked() {
        let candidates = vec![
            candidate("cp-a", true, true, false),
            candidate("cp-b", true, false, false),
            candidate("cp-c", true, true, true),
        ];
        let set = viable(candidates, GatingPolicy::Parallel, GatingPolicy::Parallel);
        assert_eq!(set.viable.len(), 1);
        assert_eq!(set.viable[0].id.id, "cp-a");
        assert_eq!(set.blocked.len(), 2);
    }

    #[test]
    fn workers_not_considered_while_any_cp_row_exists() {
        let candidates = vec![
            candidate("cp-a", true, false, false),
            candidate("worker-a", false, true, false),
        ];
        let set = viable(candidates, GatingPolicy::Serial, GatingPolicy::Parallel);
        assert!(set.viable.is_empty());
        assert_eq!(set.blocked.len(), 1, "cp-a blocked, worker not considered");
    }
}
