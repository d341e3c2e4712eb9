//! Fuzzification and fuzzy logical relationship groups.

use crate::fts::partition::Partition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index of a fuzzy set, i.e. an interval in the partition.
pub type LabelIndex = usize;

/// Map every observation to its containing interval.
pub fn fuzzify(values: &[f64], partition: &Partition) -> Vec<LabelIndex> {
    values.iter().map(|v| partition.label_of(*v)).collect()
}

/// Observed share of transitions from one label to one successor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportEntry {
    pub successor: LabelIndex,
    pub count: u32,
    /// `count / total_transitions_from_this_label`.
    pub share: f64,
}

/// Fuzzy logical relationship groups learned from a training label sequence.
///
/// For each label the group holds the multiset of successor labels observed
/// to follow it, aggregated by frequency. Labels never seen on the left-hand
/// side of a transition keep an empty group; the forecast engine treats that
/// as "no evidence" and falls back to the label's own midpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Flrg {
    groups: Vec<BTreeMap<LabelIndex, u32>>,
}

impl Flrg {
    /// Scan consecutive label pairs and accumulate successor counts.
    pub fn build(labels: &[LabelIndex], n_states: usize) -> Self {
        let mut groups = vec![BTreeMap::new(); n_states];
        for pair in labels.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if prev < n_states && next < n_states {
                *groups[prev].entry(next).or_insert(0) += 1;
            }
        }
        Self { groups }
    }

    /// Number of states (intervals) the groups are defined over.
    pub fn n_states(&self) -> usize {
        self.groups.len()
    }

    /// Successor counts for `label`, in ascending successor order.
    pub fn successors(&self, label: LabelIndex) -> &BTreeMap<LabelIndex, u32> {
        &self.groups[label]
    }

    /// Total observed transitions out of `label`.
    pub fn total_from(&self, label: LabelIndex) -> u32 {
        self.groups[label].values().sum()
    }

    /// Whether `label` was a terminal state in training (no successors).
    pub fn is_terminal(&self, label: LabelIndex) -> bool {
        self.groups[label].is_empty()
    }

    /// Total number of transitions in the training sequence.
    pub fn transition_count(&self) -> u32 {
        self.groups.iter().map(|g| g.values().sum::<u32>()).sum()
    }

    /// Per-label successor supports for diagnostic reporting, sorted by
    /// descending share (ties by ascending successor index).
    pub fn support(&self) -> Vec<Vec<SupportEntry>> {
        self.groups
            .iter()
            .map(|group| {
                let total: u32 = group.values().sum();
                let mut entries: Vec<SupportEntry> = group
                    .iter()
                    .map(|(successor, count)| SupportEntry {
                        successor: *successor,
                        count: *count,
                        share: *count as f64 / total as f64,
                    })
                    .collect();
                entries.sort_by(|a, b| b.share.total_cmp(&a.share).then(a.successor.cmp(&b.successor)));
                entries
            })
            .collect()
    }
}
