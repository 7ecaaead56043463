//! Region epoch ordering
//!
//! A region epoch is the pair `(conf_ver, version)`. `conf_ver` is bumped on
//! every membership change and `version` on every split or merge. Two reports
//! for the same region are ordered lexicographically by that pair.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Configuration/range version pair of a region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionEpoch {
    /// Membership (configuration) version
    pub conf_ver: u64,

    /// Key range version
    pub version: u64,
}

impl RegionEpoch {
    /// Create a new epoch
    pub fn new(conf_ver: u64, version: u64) -> Self {
        Self { conf_ver, version }
    }
}

impl Ord for RegionEpoch {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_epoch(self, other)
    }
}

impl PartialOrd for RegionEpoch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RegionEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conf_ver={} version={}", self.conf_ver, self.version)
    }
}

/// Order two epochs: `Greater` if `a` is newer, `Less` if `b` is newer.
///
/// `conf_ver` dominates; `version` only breaks ties.
pub fn compare_epoch(a: &RegionEpoch, b: &RegionEpoch) -> Ordering {
    a.conf_ver
        .cmp(&b.conf_ver)
        .then_with(|| a.version.cmp(&b.version))
}
