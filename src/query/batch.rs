//! Batched cross-partition vertex lookups
//!
//! The counting algorithms discover vertices they cannot resolve locally
//! one at a time, but asking a remote partition one vertex at a time
//! would drown the run in round trips. The batcher queues unresolved
//! targets together with the sources waiting on them and, once the queue
//! is full, sends one request per remote partition carrying every target
//! still pending. Answers can optionally be cached for the lifetime of
//! the counting run so no target is ever requested twice.
//!
//! A partition that keeps failing after retries is skipped for that
//! flush. Its targets come back as unresolved and the caller decides
//! what that means; the run itself never aborts on a broken peer.

use crate::graph::{NeighborMap, PartitionId, VertexId, Window};
use crate::query::retry::{with_retry, RetryPolicy};
use crate::query::QueryService;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Knobs for the remote read path shared by both counting algorithms.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Queued waiting pairs that trigger a flush.
    pub batch_size: usize,
    /// Keep resolved neighborhoods for the lifetime of the run.
    pub caching: bool,
    pub retry: RetryPolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            batch_size: 100,
            caching: true,
            retry: RetryPolicy::default(),
        }
    }
}

impl BatchConfig {
    pub fn new(batch_size: usize, caching: bool) -> Self {
        BatchConfig {
            batch_size,
            caching,
            ..Default::default()
        }
    }
}

/// Counters describing the remote traffic of one counting run.
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    /// Logical batched requests, one per remote partition per flush.
    /// Transport-level retries are not counted.
    pub remote_calls: u64,
    /// Wall-clock time spent blocked on the query service, retries and
    /// backoff included.
    pub remote_wait: Duration,
}

/// A target whose neighborhood came back from some remote partition,
/// along with every source that was waiting on it.
#[derive(Debug)]
pub struct ResolvedVertex {
    pub target: VertexId,
    pub neighbors: NeighborMap,
    pub waiters: Vec<VertexId>,
}

/// A target no partition could answer for in this flush.
#[derive(Debug)]
pub struct UnresolvedVertex {
    pub target: VertexId,
    pub waiters: Vec<VertexId>,
}

#[derive(Debug, Default)]
pub struct FlushOutcome {
    pub resolved: Vec<ResolvedVertex>,
    pub unresolved: Vec<UnresolvedVertex>,
}

/// Queue of pending remote lookups for one counting run.
pub struct RemoteBatcher<'a> {
    service: &'a dyn QueryService,
    remotes: Vec<PartitionId>,
    window: Window,
    config: BatchConfig,
    queue: IndexMap<VertexId, Vec<VertexId>>,
    pending: usize,
    cache: FxHashMap<VertexId, NeighborMap>,
    stats: BatchStats,
}

impl<'a> RemoteBatcher<'a> {
    pub fn new(
        service: &'a dyn QueryService,
        local: PartitionId,
        partitions: &[PartitionId],
        window: Window,
        config: BatchConfig,
    ) -> Self {
        let remotes = partitions.iter().copied().filter(|p| *p != local).collect();
        RemoteBatcher {
            service,
            remotes,
            window,
            config,
            queue: IndexMap::new(),
            pending: 0,
            cache: FxHashMap::default(),
            stats: BatchStats::default(),
        }
    }

    /// Queues `target` for remote resolution on behalf of `waiting`. The
    /// same target may be waited on by many sources; it is still sent
    /// only once.
    pub fn enqueue(&mut self, target: VertexId, waiting: VertexId) {
        self.queue.entry(target).or_default().push(waiting);
        self.pending += 1;
    }

    /// Whether enough waiting pairs have accumulated to justify a flush.
    pub fn is_full(&self) -> bool {
        self.pending >= self.config.batch_size
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Waiting (target, source) pairs currently queued.
    pub fn pending_pairs(&self) -> usize {
        self.pending
    }

    /// Distinct targets currently queued.
    pub fn pending_targets(&self) -> usize {
        self.queue.len()
    }

    /// Neighborhood of a previously resolved target, when caching is on.
    pub fn cached_neighbors(&self, vertex: &VertexId) -> Option<&NeighborMap> {
        self.cache.get(vertex)
    }

    pub fn stats(&self) -> &BatchStats {
        &self.stats
    }

    /// Sends the queued targets to the remote partitions, one batched
    /// request per partition, stopping early once everything is
    /// resolved. The queue is empty when this returns: every queued
    /// target comes back either resolved or unresolved.
    pub fn flush(&mut self) -> FlushOutcome {
        let mut outcome = FlushOutcome::default();
        if self.queue.is_empty() {
            return outcome;
        }
        let batch = self.queue.len();

        for idx in 0..self.remotes.len() {
            if self.queue.is_empty() {
                break;
            }
            let partition = self.remotes[idx];
            let targets: Vec<VertexId> = self.queue.keys().copied().collect();
            let window = self.window;
            let service = self.service;
            let started = Instant::now();
            let reply = with_retry(&self.config.retry, "fetch_vertices", || {
                service.fetch_vertices(partition, &targets, window)
            });
            self.stats.remote_calls += 1;
            self.stats.remote_wait += started.elapsed();

            match reply {
                Ok(found) => {
                    for (target, neighbors) in found {
                        let Some(waiters) = self.queue.shift_remove(&target) else {
                            continue;
                        };
                        self.pending -= waiters.len();
                        if self.config.caching {
                            self.cache.entry(target).or_default().extend(neighbors.clone());
                        }
                        outcome.resolved.push(ResolvedVertex {
                            target,
                            neighbors,
                            waiters,
                        });
                    }
                }
                Err(e) => {
                    warn!(
                        "giving up on partition {} after {} attempts: {}",
                        partition, self.config.retry.max_attempts, e
                    );
                }
            }
        }

        for (target, waiters) in self.queue.drain(..) {
            outcome.unresolved.push(UnresolvedVertex { target, waiters });
        }
        self.pending = 0;

        debug!(
            "flushed {} targets: {} resolved, {} unresolved",
            batch,
            outcome.resolved.len(),
            outcome.unresolved.len()
        );
        outcome
    }
}
