// 🍩 Minor-Slice Collapser
// Slices under the share threshold are merged into one "Other" slice,
// and the merged labels are kept for the disclosure note under the charts.

use crate::format::{format_rand, format_share};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Synthetic label the minor slices are merged into
pub const OTHER_LABEL: &str = "Other";

/// Default relative-share threshold (5%)
pub const DEFAULT_MINOR_SHARE: f64 = 0.05;

// ============================================================================
// COLLAPSED DISTRIBUTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapsedDistribution {
    /// Surviving slices in input order, then "Other" if anything was merged
    pub slices: Vec<(String, f64)>,

    /// Original (label, value) of every merged slice with value > 0
    pub minor: Vec<(String, f64)>,

    /// Sum of the input values
    pub total: f64,
}

impl CollapsedDistribution {
    /// Share of the input total; 0 when the total is 0
    pub fn share_of(&self, value: f64) -> f64 {
        if self.total > 0.0 {
            value / self.total
        } else {
            0.0
        }
    }

    /// "{label} ({pct}%)" for each slice, in slice order
    pub fn display_labels(&self) -> Vec<String> {
        self.slices
            .iter()
            .map(|(label, value)| format!("{} ({})", label, format_share(self.share_of(*value))))
            .collect()
    }

    pub fn has_other(&self) -> bool {
        self.slices.iter().any(|(label, _)| label == OTHER_LABEL)
    }

    /// Note listing what went into "Other"; None when nothing was merged
    pub fn disclosure_note(&self, group: &str) -> Option<DisclosureNote> {
        if self.minor.is_empty() {
            return None;
        }

        let breakdown = self
            .minor
            .iter()
            .map(|(label, value)| format!("{} ({})", label, format_rand(*value)))
            .collect::<Vec<_>>()
            .join(", ");

        Some(DisclosureNote {
            group: group.to_string(),
            breakdown,
        })
    }
}

/// Footnote for one group's "Other" slice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisclosureNote {
    /// Dimension value the distribution belongs to, e.g. "Female"
    pub group: String,

    /// "B (R10), C (R5)"
    pub breakdown: String,
}

impl DisclosureNote {
    pub fn heading(&self) -> String {
        format!("{} – '{}' includes:", self.group, OTHER_LABEL)
    }
}

impl fmt::Display for DisclosureNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.heading(), self.breakdown)
    }
}

// ============================================================================
// COLLAPSER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinorSliceCollapser {
    pub threshold: f64,
}

impl Default for MinorSliceCollapser {
    fn default() -> Self {
        MinorSliceCollapser {
            threshold: DEFAULT_MINOR_SHARE,
        }
    }
}

impl MinorSliceCollapser {
    pub fn new(threshold: f64) -> Self {
        MinorSliceCollapser { threshold }
    }

    /// Merge every slice whose share is below the threshold into "Other".
    ///
    /// A zero total has no shares to compare, so the input comes back as is.
    /// An all-zero minor set is dropped without adding an "Other" slice.
    pub fn collapse(&self, distribution: &[(String, f64)]) -> CollapsedDistribution {
        let total: f64 = distribution.iter().map(|(_, v)| v).sum();

        if !(total > 0.0) {
            return CollapsedDistribution {
                slices: distribution.to_vec(),
                minor: Vec::new(),
                total,
            };
        }

        let (major, minor): (Vec<(String, f64)>, Vec<(String, f64)>) = distribution
            .iter()
            .cloned()
            .partition(|(_, value)| value / total >= self.threshold);

        if minor.is_empty() {
            return CollapsedDistribution {
                slices: major,
                minor,
                total,
            };
        }

        let other_total: f64 = minor.iter().map(|(_, v)| v).sum();
        let mut slices = major;
        if other_total > 0.0 {
            match slices.iter_mut().find(|(label, _)| label == OTHER_LABEL) {
                Some((_, value)) => *value += other_total,
                None => slices.push((OTHER_LABEL.to_string(), other_total)),
            }
        }

        CollapsedDistribution {
            slices,
            minor: minor.into_iter().filter(|(_, v)| *v > 0.0).collect(),
            total,
        }
    }
}
