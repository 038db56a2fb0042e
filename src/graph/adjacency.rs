//! Windowed adjacency views over snapshot state
//!
//! Counting runs never walk the bucket log directly. They first
//! materialize a view over a time window: buckets are merged in ascending
//! timestamp order, so when the same (source, target) pair appears in
//! several buckets the latest bucket wins. Materialization is cheap
//! relative to enumeration and keeps the hot loops on flat hash maps.

use crate::graph::snapshot::{NeighborMap, SnapshotStore};
use crate::graph::types::{VertexId, Window};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashMap;

/// Edge-carrying adjacency view used by the exact counter and the
/// query-service read path.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyView {
    edges: FxHashMap<VertexId, NeighborMap>,
}

impl AdjacencyView {
    pub fn from_snapshot(snapshot: &SnapshotStore, window: Window) -> Self {
        let mut edges: FxHashMap<VertexId, NeighborMap> = FxHashMap::default();
        for (_, bucket) in snapshot.buckets_in(window) {
            for (source, neighbors) in bucket {
                edges
                    .entry(*source)
                    .or_default()
                    .extend(neighbors.iter().map(|(dst, e)| (*dst, e.clone())));
            }
        }
        AdjacencyView { edges }
    }

    /// Number of vertices that appear as a source in the window.
    pub fn vertex_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|n| n.len()).sum()
    }

    pub fn contains(&self, vertex: &VertexId) -> bool {
        self.edges.contains_key(vertex)
    }

    pub fn neighbors(&self, vertex: &VertexId) -> Option<&NeighborMap> {
        self.edges.get(vertex)
    }

    pub fn has_edge(&self, source: &VertexId, target: &VertexId) -> bool {
        self.edges
            .get(source)
            .map(|neighbors| neighbors.contains_key(target))
            .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VertexId, &NeighborMap)> {
        self.edges.iter().map(|(v, n)| (*v, n))
    }

    /// Extracts the adjacency of the requested vertices. Vertices absent
    /// from the view are silently skipped, which is how a partition
    /// answers a batched lookup for vertices it does not own.
    pub fn select(&self, targets: &[VertexId]) -> FxHashMap<VertexId, NeighborMap> {
        let mut found = FxHashMap::default();
        for target in targets {
            if let Some(neighbors) = self.edges.get(target) {
                found.insert(*target, neighbors.clone());
            }
        }
        found
    }
}

/// Neighbor-set view used by the wedge sampler. Insertion order is kept
/// so vertices and neighbors can be drawn by index in O(1).
#[derive(Debug, Clone, Default)]
pub struct NeighborhoodView {
    neighbors: IndexMap<VertexId, IndexSet<VertexId>>,
}

impl NeighborhoodView {
    pub fn from_snapshot(snapshot: &SnapshotStore, window: Window) -> Self {
        let mut neighbors: IndexMap<VertexId, IndexSet<VertexId>> = IndexMap::new();
        for (_, bucket) in snapshot.buckets_in(window) {
            for (source, targets) in bucket {
                neighbors
                    .entry(*source)
                    .or_default()
                    .extend(targets.keys().copied());
            }
        }
        NeighborhoodView { neighbors }
    }

    pub fn vertex_count(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    pub fn contains(&self, vertex: &VertexId) -> bool {
        self.neighbors.contains_key(vertex)
    }

    pub fn neighbors(&self, vertex: &VertexId) -> Option<&IndexSet<VertexId>> {
        self.neighbors.get(vertex)
    }

    /// The vertex stored at a given slot, for uniform sampling.
    pub fn vertex_at(&self, index: usize) -> Option<VertexId> {
        self.neighbors.get_index(index).map(|(v, _)| *v)
    }
}
