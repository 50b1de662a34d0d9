use std::collections::BTreeSet;

use super::types::ComputeTier;

/// Allow-by-default compatibility policy over compute-capability tiers.
///
/// Every tier is supported unless it has been explicitly recorded as
/// incompatible (for example after the model runtime rejected it). There is no
/// threshold or ceiling: an unrecognized newer tier is supported like any other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatibilityPolicy {
    incompatible: BTreeSet<ComputeTier>,
}

impl CompatibilityPolicy {
    /// Policy that supports every tier.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Records `tier` as proven incompatible.
    pub fn with_incompatible(mut self, tier: ComputeTier) -> Self {
        self.incompatible.insert(tier);
        self
    }

    /// Lifts a previous incompatibility record, extending the supported set.
    pub fn allow(mut self, tier: ComputeTier) -> Self {
        self.incompatible.remove(&tier);
        self
    }

    pub fn supported(&self, tier: ComputeTier) -> bool {
        !self.incompatible.contains(&tier)
    }

    pub fn incompatible_tiers(&self) -> impl Iterator<Item = ComputeTier> + '_ {
        self.incompatible.iter().copied()
    }

    /// Returns `true` if every tier `previous` supports is still supported.
    ///
    /// Policy updates are expected to satisfy this; a `false` result means the
    /// update disables hardware that used to work.
    pub fn extends(&self, previous: &CompatibilityPolicy) -> bool {
        self.incompatible.is_subset(&previous.incompatible)
    }
}
