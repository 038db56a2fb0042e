//! Remote partition access
//!
//! Partitions never exchange state directly. All cross-partition reads go
//! through a [`QueryService`]: a synchronous, blocking facade over
//! whatever transport the deployment uses. The batching layer in
//! [`batch`] sits on top of it and is where all cost control (batching,
//! caching, retries) lives.

pub mod batch;
pub mod memory;
pub mod retry;

pub use batch::{
    BatchConfig, BatchStats, FlushOutcome, RemoteBatcher, ResolvedVertex, UnresolvedVertex,
};
pub use memory::InMemoryQueryService;
pub use retry::{with_retry, RetryPolicy};

use crate::graph::{NeighborMap, PartitionId, SnapshotStore, VertexId, Window};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Errors surfaced by a query service. Both variants are treated as
/// retryable by the callers; what distinguishes them is intent, so logs
/// can tell a losing race from a broken partition.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The read lost a race against a concurrent state update and can be
    /// retried immediately.
    #[error("Concurrent modification on partition {0}")]
    Conflict(PartitionId),

    /// The partition could not be reached or failed to answer.
    #[error("Partition {partition} unavailable: {reason}")]
    Unavailable {
        partition: PartitionId,
        reason: String,
    },
}

impl QueryError {
    pub fn partition(&self) -> PartitionId {
        match self {
            QueryError::Conflict(p) => *p,
            QueryError::Unavailable { partition, .. } => *partition,
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Blocking access to partition state.
///
/// Implementations must be safe to share across worker threads; counting
/// runs for different partitions fan out in parallel over one service.
pub trait QueryService: Send + Sync {
    /// Full snapshot state of a partition. Used by a counting run to
    /// fetch its own partition when the caller did not hand it a
    /// snapshot directly.
    fn fetch_partition_state(&self, partition: PartitionId) -> QueryResult<SnapshotStore>;

    /// Windowed adjacency of the requested vertices, as far as the
    /// partition owns them. Vertices the partition does not own are
    /// simply absent from the reply.
    fn fetch_vertices(
        &self,
        partition: PartitionId,
        targets: &[VertexId],
        window: Window,
    ) -> QueryResult<FxHashMap<VertexId, NeighborMap>>;
}
