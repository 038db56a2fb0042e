//! In-memory query service
//!
//! Holds every partition's snapshot state behind one lock. This is the
//! service used by tests, benchmarks and single-process runs; a cluster
//! deployment implements [`QueryService`] over its own transport
//! instead.

use crate::graph::{
    AdjacencyView, NeighborMap, PartitionId, SnapshotStore, TemporalEdge, Timestamp, VertexId,
    Window,
};
use crate::query::{QueryResult, QueryService};
use rustc_hash::FxHashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryQueryService {
    partitions: RwLock<FxHashMap<PartitionId, SnapshotStore>>,
}

impl InMemoryQueryService {
    pub fn new() -> Self {
        InMemoryQueryService {
            partitions: RwLock::new(FxHashMap::default()),
        }
    }

    /// Records an edge in the owning partition's bucket log.
    pub fn insert_edge(&self, partition: PartitionId, bucket: Timestamp, edge: TemporalEdge) {
        self.partitions
            .write()
            .unwrap()
            .entry(partition)
            .or_default()
            .insert(bucket, edge);
    }

    /// Replaces a partition's state wholesale.
    pub fn load_partition(&self, partition: PartitionId, state: SnapshotStore) {
        self.partitions.write().unwrap().insert(partition, state);
    }

    /// Partitions that currently hold state, in ascending id order.
    pub fn partition_ids(&self) -> Vec<PartitionId> {
        let mut ids: Vec<PartitionId> = self.partitions.read().unwrap().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn edge_count(&self) -> usize {
        self.partitions
            .read()
            .unwrap()
            .values()
            .map(|state| state.edge_count())
            .sum()
    }
}

impl QueryService for InMemoryQueryService {
    /// Unknown partitions answer with empty state rather than an error: a
    /// partition that has not received any edges yet is legitimately
    /// empty.
    fn fetch_partition_state(&self, partition: PartitionId) -> QueryResult<SnapshotStore> {
        Ok(self
            .partitions
            .read()
            .unwrap()
            .get(&partition)
            .cloned()
            .unwrap_or_default())
    }

    fn fetch_vertices(
        &self,
        partition: PartitionId,
        targets: &[VertexId],
        window: Window,
    ) -> QueryResult<FxHashMap<VertexId, NeighborMap>> {
        let guard = self.partitions.read().unwrap();
        let Some(state) = guard.get(&partition) else {
            return Ok(FxHashMap::default());
        };
        // Materialized per request, like the partition servers do.
        let view = AdjacencyView::from_snapshot(state, window);
        Ok(view.select(targets))
    }
}
