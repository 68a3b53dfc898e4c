//! Edge-weighting policies for repeated correspondence.
//!
//! A new edge starts at [`WeightingPolicy::initial`]; each further message
//! over the same sender→recipient pair passes the current weight through
//! [`WeightingPolicy::reinforce`].

use commap_core::config::WeightingKind;

pub trait WeightingPolicy {
    /// Weight of a freshly observed edge.
    fn initial(&self) -> f64 {
        1.0
    }

    /// Weight after one more observation of an existing edge.
    fn reinforce(&self, weight: f64) -> f64;

    fn kind(&self) -> WeightingKind;
}

/// `w ← w·w / (w + 1)`.
///
/// Repeats shrink the weight: 1 → 0.5 → 0.1667 → …
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RescaleWeighting;

impl WeightingPolicy for RescaleWeighting {
    fn reinforce(&self, weight: f64) -> f64 {
        weight * weight / (weight + 1.0)
    }

    fn kind(&self) -> WeightingKind {
        WeightingKind::Rescale
    }
}

/// `w ← w + 1`: the weight counts messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncrementWeighting;

impl WeightingPolicy for IncrementWeighting {
    fn reinforce(&self, weight: f64) -> f64 {
        weight + 1.0
    }

    fn kind(&self) -> WeightingKind {
        WeightingKind::Increment
    }
}

/// Resolve a configured [`WeightingKind`] to its policy.
#[must_use]
pub fn policy_for(kind: WeightingKind) -> &'static dyn WeightingPolicy {
    match kind {
        WeightingKind::Rescale => &RescaleWeighting,
        WeightingKind::Increment => &IncrementWeighting,
    }
}
