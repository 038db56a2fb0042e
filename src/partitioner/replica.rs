//! Replica bookkeeping for streamed vertices
//!
//! A streaming vertex-cut partitioner decides where each arriving edge
//! goes by looking at where its endpoints already have replicas and how
//! heavy they are. [`ReplicaRecord`] is that per-vertex state: the
//! ordered set of partitions holding a replica plus a monotone degree
//! counter. The placement heuristic itself lives with the ingest layer;
//! this record only answers its questions.

use crate::graph::PartitionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Per-vertex replica placement and degree state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaRecord {
    partitions: BTreeSet<PartitionId>,
    degree: u64,
}

impl ReplicaRecord {
    pub fn new() -> Self {
        ReplicaRecord {
            partitions: BTreeSet::new(),
            degree: 0,
        }
    }

    /// Records a replica in `partition`. Adding a partition that is
    /// already present is a no-op.
    pub fn add_partition(&mut self, partition: PartitionId) {
        self.partitions.insert(partition);
    }

    /// Merges every replica location of `other` into this record.
    pub fn extend_from(&mut self, other: &ReplicaRecord) {
        self.partitions.extend(other.partitions.iter().copied());
    }

    pub fn has_replica_in(&self, partition: PartitionId) -> bool {
        self.partitions.contains(&partition)
    }

    pub fn replica_count(&self) -> usize {
        self.partitions.len()
    }

    /// Replica locations in ascending partition order.
    pub fn partitions(&self) -> impl Iterator<Item = PartitionId> + '_ {
        self.partitions.iter().copied()
    }

    pub fn degree(&self) -> u64 {
        self.degree
    }

    /// Bumps the degree by one. Degrees only ever grow; deletions do not
    /// shrink them.
    pub fn increment_degree(&mut self) {
        self.degree += 1;
    }

    /// Partitions holding replicas of both vertices.
    pub fn intersection(x: &ReplicaRecord, y: &ReplicaRecord) -> BTreeSet<PartitionId> {
        x.partitions.intersection(&y.partitions).copied().collect()
    }
}
