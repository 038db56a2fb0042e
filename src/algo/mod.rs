//! Triangle counting over partitioned snapshots
//!
//! Two interchangeable counting runs are provided: an exact counter
//! ([`exact::ExactTriangleCount`]) and a wedge-sampling estimator
//! ([`estimate::WedgeEstimator`]). Both work one partition at a time
//! against a [`QueryService`] for everything they cannot resolve
//! locally, and both report through a human-readable summary line, so a
//! driver can swap one for the other.

pub mod estimate;
pub mod exact;

pub use estimate::{EstimateConfig, EstimateSummary, RoundEstimate, WedgeEstimator};
pub use exact::{ExactSummary, ExactTriangleCount};

use crate::graph::{PartitionId, SnapshotStore, Window};
use crate::query::{with_retry, QueryService, RetryPolicy};
use rayon::prelude::*;
use std::time::{Duration, Instant};
use tracing::warn;

/// Where a counting run sits in the cluster: the partition it speaks
/// for, the full partition list and the time window under study.
#[derive(Debug, Clone)]
pub struct PartitionContext {
    pub local: PartitionId,
    pub partitions: Vec<PartitionId>,
    pub window: Window,
}

impl PartitionContext {
    pub fn new(local: PartitionId, partitions: Vec<PartitionId>, window: Window) -> Self {
        PartitionContext {
            local,
            partitions,
            window,
        }
    }

    pub fn remotes(&self) -> impl Iterator<Item = PartitionId> + '_ {
        self.partitions
            .iter()
            .copied()
            .filter(move |p| *p != self.local)
    }
}

/// What to do with sampled wedges whose midpoint neighborhood never
/// resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnresolvedPolicy {
    /// Count each unresolved target as one zero-valued sample.
    #[default]
    ZeroSample,
    /// Drop unresolved targets without touching the sample counter.
    Discard,
}

/// A per-partition counting run.
///
/// `snapshot` carries the partition's own state when the caller already
/// holds it; `None` makes the run fetch the state through the service.
pub trait TriangleAlgorithm: Send + Sync {
    fn run(
        &self,
        snapshot: Option<SnapshotStore>,
        service: &dyn QueryService,
        ctx: &PartitionContext,
    ) -> String;
}

/// Local state either handed in by the caller or fetched through the
/// service. A partition whose state cannot be fetched counts over an
/// empty snapshot instead of failing the whole run.
pub(crate) fn resolve_snapshot(
    snapshot: Option<SnapshotStore>,
    service: &dyn QueryService,
    ctx: &PartitionContext,
    retry: &RetryPolicy,
) -> (SnapshotStore, Duration) {
    if let Some(snapshot) = snapshot {
        return (snapshot, Duration::ZERO);
    }
    let started = Instant::now();
    match with_retry(retry, "fetch_partition_state", || {
        service.fetch_partition_state(ctx.local)
    }) {
        Ok(state) => (state, started.elapsed()),
        Err(e) => {
            warn!(
                "partition {}: local state unavailable, counting over empty snapshot: {}",
                ctx.local, e
            );
            (SnapshotStore::default(), started.elapsed())
        }
    }
}

/// Runs one algorithm for every partition in parallel. Each run fetches
/// its own partition state through the service; results come back in
/// partition order.
pub fn run_on_all_partitions(
    algorithm: &dyn TriangleAlgorithm,
    service: &dyn QueryService,
    partitions: &[PartitionId],
    window: Window,
) -> Vec<String> {
    partitions
        .par_iter()
        .map(|&local| {
            let ctx = PartitionContext::new(local, partitions.to_vec(), window);
            algorithm.run(None, service, &ctx)
        })
        .collect()
}
