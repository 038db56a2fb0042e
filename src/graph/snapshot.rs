//! Bucketed snapshot state for one partition
//!
//! Each partition accumulates its slice of the streamed graph as a log of
//! buckets keyed by timestamp. A bucket maps source vertices to their
//! outgoing neighbors, so the full shape is
//! `timestamp -> source -> target -> edge`. Views over a time window are
//! materialized from this log by [`crate::graph::AdjacencyView`].

use crate::graph::edge::TemporalEdge;
use crate::graph::types::{Timestamp, VertexId, Window};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outgoing adjacency of a single vertex: target id to the edge record.
pub type NeighborMap = FxHashMap<VertexId, TemporalEdge>;

/// Append-mostly bucket log holding one partition's graph state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotStore {
    buckets: BTreeMap<Timestamp, FxHashMap<VertexId, NeighborMap>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        SnapshotStore {
            buckets: BTreeMap::new(),
        }
    }

    /// Records an edge under the given bucket timestamp. Re-inserting the
    /// same (bucket, source, target) key overwrites the previous record.
    pub fn insert(&mut self, bucket: Timestamp, edge: TemporalEdge) {
        self.buckets
            .entry(bucket)
            .or_default()
            .entry(edge.source)
            .or_default()
            .insert(edge.target, edge);
    }

    /// Buckets whose timestamp falls inside `window`, in ascending
    /// timestamp order.
    pub fn buckets_in(
        &self,
        window: Window,
    ) -> impl Iterator<Item = (Timestamp, &FxHashMap<VertexId, NeighborMap>)> {
        // An inverted window is empty; BTreeMap::range would panic on it.
        let range = if window.is_empty() {
            self.buckets.range(window.from..window.from)
        } else {
            self.buckets.range(window.from..=window.max_valid_to)
        };
        range.map(|(ts, bucket)| (*ts, bucket))
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn edge_count(&self) -> usize {
        self.buckets
            .values()
            .flat_map(|bucket| bucket.values())
            .map(|neighbors| neighbors.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// The smallest window covering every bucket, or `None` when empty.
    pub fn covering_window(&self) -> Option<Window> {
        let first = *self.buckets.keys().next()?;
        let last = *self.buckets.keys().next_back()?;
        Some(Window::new(first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(src: u64, dst: u64, from: Timestamp) -> TemporalEdge {
        TemporalEdge::new(VertexId(src), VertexId(dst), from, from + 100)
    }

    #[test]
    fn test_insert_groups_by_bucket_and_source() {
        let mut store = SnapshotStore::new();
        store.insert(10, edge(1, 2, 10));
        store.insert(10, edge(1, 3, 10));
        store.insert(20, edge(2, 3, 20));

        assert_eq!(store.bucket_count(), 2);
        assert_eq!(store.edge_count(), 3);

        let buckets: Vec<_> = store.buckets_in(Window::new(0, 100)).collect();
        assert_eq!(buckets[0].0, 10);
        assert_eq!(buckets[0].1[&VertexId(1)].len(), 2);
        assert_eq!(buckets[1].0, 20);
    }

    #[test]
    fn test_reinsert_overwrites() {
        let mut store = SnapshotStore::new();
        let mut first = edge(1, 2, 10);
        first.valid_to = 50;
        let mut second = edge(1, 2, 10);
        second.valid_to = 99;
        store.insert(10, first);
        store.insert(10, second);

        assert_eq!(store.edge_count(), 1);
        let (_, bucket) = store.buckets_in(Window::new(10, 10)).next().unwrap();
        assert_eq!(bucket[&VertexId(1)][&VertexId(2)].valid_to, 99);
    }

    #[test]
    fn test_bucket_range_is_inclusive() {
        let mut store = SnapshotStore::new();
        store.insert(10, edge(1, 2, 10));
        store.insert(20, edge(2, 3, 20));
        store.insert(30, edge(3, 4, 30));

        let hit: Vec<Timestamp> = store
            .buckets_in(Window::new(10, 20))
            .map(|(ts, _)| ts)
            .collect();
        assert_eq!(hit, vec![10, 20]);
    }

    #[test]
    fn test_inverted_window_has_no_buckets() {
        let mut store = SnapshotStore::new();
        store.insert(10, edge(1, 2, 10));
        assert_eq!(store.buckets_in(Window::new(20, 10)).count(), 0);
    }

    #[test]
    fn test_covering_window() {
        let mut store = SnapshotStore::new();
        assert!(store.covering_window().is_none());
        store.insert(15, edge(1, 2, 15));
        store.insert(40, edge(2, 1, 40));
        assert_eq!(store.covering_window(), Some(Window::new(15, 40)));
    }
}
