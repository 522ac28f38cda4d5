use serde::{Deserialize, Serialize};

use stockroute_core::LocationId;

/// Behavioral switches for the waterfall walk.
///
/// The two presets correspond to the two allocation flavours the order system
/// has historically run:
///
/// - [`AllocationPolicy::self_included`]: the source location is tried first,
///   every target is visited, unmet quantity stays visible only in the ledger.
/// - [`AllocationPolicy::skip_exhausted`]: targets with nothing available are
///   skipped, and unmet quantity is written back onto the source bin-rack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPolicy {
    /// Walk the source location first when the target list does not contain it.
    pub include_source_in_targets: bool,
    /// Skip a target whose running available is exactly zero (no record, no commit).
    pub skip_zero_available_targets: bool,
    /// Add the unmet remainder onto the source location's bin-rack entry.
    pub backorder_to_source_bin_rack: bool,
}

impl AllocationPolicy {
    pub const fn self_included() -> Self {
        Self {
            include_source_in_targets: true,
            skip_zero_available_targets: false,
            backorder_to_source_bin_rack: false,
        }
    }

    pub const fn skip_exhausted() -> Self {
        Self {
            include_source_in_targets: false,
            skip_zero_available_targets: true,
            backorder_to_source_bin_rack: true,
        }
    }

    /// Ordered, de-duplicated list of locations the walk visits for `source`.
    pub fn walk_order(&self, source: LocationId, targets: &[LocationId]) -> Vec<LocationId> {
        let mut walk = Vec::with_capacity(targets.len() + 1);
        if self.include_source_in_targets && !targets.contains(&source) {
            walk.push(source);
        }
        for target in targets {
            if !walk.contains(target) {
                walk.push(*target);
            }
        }
        walk
    }
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self::self_included()
    }
}
