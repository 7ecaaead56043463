//! Named metrics and predicate filters exposed to the query layer
//!
//! Both are closed enumerations; a new ranking is added by extending
//! [`RegionMetric`] and its comparator table.

use region_core::{Error, RegionRecord};
use std::fmt;
use std::str::FromStr;

/// Strict less-than over two region records
pub type RegionLess = fn(&RegionRecord, &RegionRecord) -> bool;

/// Metric a top-N query ranks regions by (greatest first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionMetric {
    /// Bytes written since the last heartbeat
    WriteFlow,
    /// Bytes read since the last heartbeat
    ReadFlow,
    /// Epoch configuration version
    ConfVer,
    /// Epoch range version
    Version,
    /// Approximate region size
    Size,
    /// Approximate key count
    Keys,
}

impl RegionMetric {
    pub const ALL: [RegionMetric; 6] = [
        RegionMetric::WriteFlow,
        RegionMetric::ReadFlow,
        RegionMetric::ConfVer,
        RegionMetric::Version,
        RegionMetric::Size,
        RegionMetric::Keys,
    ];

    /// Canonical name used by the API
    pub fn name(&self) -> &'static str {
        match self {
            RegionMetric::WriteFlow => "write-flow",
            RegionMetric::ReadFlow => "read-flow",
            RegionMetric::ConfVer => "confver",
            RegionMetric::Version => "version",
            RegionMetric::Size => "size",
            RegionMetric::Keys => "keys",
        }
    }

    /// Comparator handed to the top-N selector
    pub fn comparator(&self) -> RegionLess {
        match self {
            RegionMetric::WriteFlow => |a, b| a.written_bytes < b.written_bytes,
            RegionMetric::ReadFlow => |a, b| a.read_bytes < b.read_bytes,
            RegionMetric::ConfVer => |a, b| a.epoch.conf_ver < b.epoch.conf_ver,
            RegionMetric::Version => |a, b| a.epoch.version < b.epoch.version,
            RegionMetric::Size => |a, b| a.approximate_size < b.approximate_size,
            RegionMetric::Keys => |a, b| a.approximate_keys < b.approximate_keys,
        }
    }
}

impl FromStr for RegionMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "write-flow" | "writeflow" => Ok(RegionMetric::WriteFlow),
            "read-flow" | "readflow" => Ok(RegionMetric::ReadFlow),
            "confver" => Ok(RegionMetric::ConfVer),
            "version" => Ok(RegionMetric::Version),
            "size" => Ok(RegionMetric::Size),
            "keys" => Ok(RegionMetric::Keys),
            other => Err(Error::InvalidMetric {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for RegionMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Predicate selecting regions with unhealthy replicas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionFilter {
    /// At least one replica reported down
    DownPeer,
    /// At least one replica mid-configuration-change
    PendingPeer,
}

impl RegionFilter {
    pub fn name(&self) -> &'static str {
        match self {
            RegionFilter::DownPeer => "down-peer",
            RegionFilter::PendingPeer => "pending-peer",
        }
    }

    /// Evaluate the predicate against one record
    pub fn matches(&self, region: &RegionRecord) -> bool {
        match self {
            RegionFilter::DownPeer => region.has_down_peers(),
            RegionFilter::PendingPeer => region.has_pending_peers(),
        }
    }
}

impl FromStr for RegionFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "down-peer" => Ok(RegionFilter::DownPeer),
            "pending-peer" => Ok(RegionFilter::PendingPeer),
            other => Err(Error::InvalidFilter {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for RegionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
