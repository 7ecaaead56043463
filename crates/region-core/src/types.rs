//! Core type definitions for the region placement coordinator

use crate::{Error, RegionEpoch, Result};
use serde::{Deserialize, Serialize};

/// Unique identifier types
pub type RegionId = u64;
pub type StoreId = u64;
pub type PeerId = u64;

/// One replica of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Peer {
    /// Peer identifier
    pub id: PeerId,

    /// Storage node hosting the replica
    pub store_id: StoreId,
}

impl Peer {
    pub fn new(id: PeerId, store_id: StoreId) -> Self {
        Self { id, store_id }
    }
}

/// A replica reported unreachable by the region leader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownPeer {
    /// The unreachable replica
    pub peer: Peer,

    /// How long the replica has been down, in seconds
    pub down_seconds: u64,
}

/// Snapshot of one region's metadata, as derived from a leader heartbeat.
///
/// Records are never edited in place once installed in a catalog; every
/// accepted heartbeat replaces the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRecord {
    /// Unique region identifier
    pub id: RegionId,

    /// Start of the key range (inclusive)
    pub start_key: Vec<u8>,

    /// End of the key range (exclusive, empty = unbounded)
    pub end_key: Vec<u8>,

    /// Configuration/range version
    pub epoch: RegionEpoch,

    /// All replicas
    pub peers: Vec<Peer>,

    /// Current leader, if the region has one
    pub leader: Option<Peer>,

    /// Replicas reported offline
    pub down_peers: Vec<DownPeer>,

    /// Replicas that have not caught up with a configuration change
    pub pending_peers: Vec<Peer>,

    /// Estimated size of the range in bytes
    pub approximate_size: u64,

    /// Estimated number of keys in the range
    pub approximate_keys: u64,

    /// Bytes written since the previous report
    pub written_bytes: u64,

    /// Bytes read since the previous report
    pub read_bytes: u64,
}

impl RegionRecord {
    /// Create a record with a single peer that is also the leader
    pub fn new(id: RegionId, start_key: Vec<u8>, end_key: Vec<u8>, leader: Peer) -> Self {
        Self {
            id,
            start_key,
            end_key,
            epoch: RegionEpoch::default(),
            peers: vec![leader],
            leader: Some(leader),
            down_peers: Vec::new(),
            pending_peers: Vec::new(),
            approximate_size: 0,
            approximate_keys: 0,
            written_bytes: 0,
            read_bytes: 0,
        }
    }

    pub fn with_epoch(mut self, conf_ver: u64, version: u64) -> Self {
        self.epoch = RegionEpoch::new(conf_ver, version);
        self
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.epoch.version = version;
        self
    }

    pub fn with_written_bytes(mut self, bytes: u64) -> Self {
        self.written_bytes = bytes;
        self
    }

    pub fn with_read_bytes(mut self, bytes: u64) -> Self {
        self.read_bytes = bytes;
        self
    }

    pub fn with_approximate_size(mut self, size: u64) -> Self {
        self.approximate_size = size;
        self
    }

    pub fn with_approximate_keys(mut self, keys: u64) -> Self {
        self.approximate_keys = keys;
        self
    }

    /// Add a peer; no-op if a peer with the same id is already present
    pub fn with_added_peer(mut self, peer: Peer) -> Self {
        if !self.peers.iter().any(|p| p.id == peer.id) {
            self.peers.push(peer);
        }
        self
    }

    pub fn with_leader(mut self, leader: Option<Peer>) -> Self {
        self.leader = leader;
        self
    }

    pub fn with_down_peers(mut self, down_peers: Vec<DownPeer>) -> Self {
        self.down_peers = down_peers;
        self
    }

    pub fn with_pending_peers(mut self, pending_peers: Vec<Peer>) -> Self {
        self.pending_peers = pending_peers;
        self
    }

    /// Returns true if `key` falls in `[start_key, end_key)`
    pub fn contains_key(&self, key: &[u8]) -> bool {
        key >= self.start_key.as_slice()
            && (self.end_key.is_empty() || key < self.end_key.as_slice())
    }

    /// Distinct stores hosting a replica, in peer order
    pub fn store_ids(&self) -> Vec<StoreId> {
        let mut stores: Vec<StoreId> = Vec::with_capacity(self.peers.len());
        for peer in &self.peers {
            if !stores.contains(&peer.store_id) {
                stores.push(peer.store_id);
            }
        }
        stores
    }

    pub fn has_down_peers(&self) -> bool {
        !self.down_peers.is_empty()
    }

    pub fn has_pending_peers(&self) -> bool {
        !self.pending_peers.is_empty()
    }

    /// Check the structural invariants a heartbeat must satisfy
    pub fn validate(&self) -> Result<()> {
        if !self.end_key.is_empty() && self.start_key >= self.end_key {
            return Err(Error::InvalidRegion {
                region_id: self.id,
                reason: "start key must sort before end key".to_string(),
            });
        }

        if let Some(leader) = &self.leader {
            if !self.peers.contains(leader) {
                return Err(Error::InvalidRegion {
                    region_id: self.id,
                    reason: format!("leader peer {} is not a member", leader.id),
                });
            }
        }

        let peer_ids = self
            .down_peers
            .iter()
            .map(|d| d.peer)
            .chain(self.pending_peers.iter().copied());
        for peer in peer_ids {
            if !self.peers.contains(&peer) {
                return Err(Error::InvalidRegion {
                    region_id: self.id,
                    reason: format!("peer {} is reported but not a member", peer.id),
                });
            }
        }

        Ok(())
    }
}

/// Per-store aggregates over the regions a store hosts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRegionStats {
    /// Store identifier
    pub store_id: StoreId,

    /// Regions with a replica on the store
    pub region_count: usize,

    /// Regions whose leader lives on the store
    pub leader_count: usize,

    /// Replicas on the store that are pending
    pub pending_peer_count: usize,

    /// Replicas on the store that are down
    pub down_peer_count: usize,

    /// Sum of approximate sizes of the hosted regions
    pub region_size: u64,
}
