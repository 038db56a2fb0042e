//! # Trigon
//!
//! Distributed triangle counting over partitioned temporal graphs.
//!
//! A graph is streamed into partitions, each holding a bucketed snapshot
//! log of its share of the edges. Counting runs per partition over a
//! time window: an exact counter enumerates wedges and resolves closing
//! edges, a wedge-sampling estimator trades accuracy for time. Both
//! reach other partitions only through a blocking query service, with
//! batching, caching and retry handled in one place.
//!
//! ## Quick start
//!
//! ```
//! use trigon::algo::{ExactTriangleCount, PartitionContext};
//! use trigon::graph::{PartitionId, TemporalEdge, VertexId, Window};
//! use trigon::query::InMemoryQueryService;
//!
//! let service = InMemoryQueryService::new();
//! for (a, b) in [(1u64, 2u64), (2, 3), (1, 3)] {
//!     let edge = TemporalEdge::new(VertexId(a), VertexId(b), 10, 110);
//!     service.insert_edge(PartitionId(0), 10, edge.reversed());
//!     service.insert_edge(PartitionId(0), 10, edge);
//! }
//!
//! let ctx = PartitionContext::new(
//!     PartitionId(0),
//!     service.partition_ids(),
//!     Window::new(0, 200),
//! );
//! let summary = ExactTriangleCount::default().count(None, &service, &ctx);
//! assert_eq!(summary.triangles, 1);
//! ```

pub mod algo;
pub mod graph;
pub mod partitioner;
pub mod query;

// Re-export commonly used types
pub use algo::{
    run_on_all_partitions, EstimateConfig, EstimateSummary, ExactSummary, ExactTriangleCount,
    PartitionContext, TriangleAlgorithm, UnresolvedPolicy, WedgeEstimator,
};
pub use graph::{
    AdjacencyView, NeighborhoodView, PartitionId, PropertyValue, SnapshotStore, TemporalEdge,
    Timestamp, VertexId, Window,
};
pub use partitioner::ReplicaRecord;
pub use query::{
    BatchConfig, InMemoryQueryService, QueryError, QueryResult, QueryService, RemoteBatcher,
    RetryPolicy,
};

/// Current version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the version of the library
pub fn version() -> &'static str {
    VERSION
}
