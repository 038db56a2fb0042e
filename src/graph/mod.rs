//! Temporal graph model: vertices, edges, bucketed snapshots and
//! windowed adjacency views.

pub mod adjacency;
pub mod edge;
pub mod property;
pub mod snapshot;
pub mod types;

pub use adjacency::{AdjacencyView, NeighborhoodView};
pub use edge::TemporalEdge;
pub use property::{PropertyMap, PropertyValue};
pub use snapshot::{NeighborMap, SnapshotStore};
pub use types::{PartitionId, Timestamp, VertexId, Window};
