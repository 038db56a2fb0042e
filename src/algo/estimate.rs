//! Triangle estimation by uniform wedge sampling
//!
//! Draws a uniform local vertex, then a uniform neighbor of it, and
//! scores the wedge by how much its endpoints' neighborhoods overlap:
//!
//! ```text
//! lambda = |N(v1) ∩ N(v2)| * d1 * d2 / (3 * (d1 + d2))
//! ```
//!
//! The mean lambda scaled by the local vertex count estimates the
//! partition's triangle share. Sampling runs in wall-clock bounded
//! rounds; the accumulators are never reset between rounds, so each
//! round reports a running estimate over everything sampled so far and
//! successive rounds show the estimate converging.
//!
//! Midpoints whose neighborhood is not known locally go through the
//! same batched remote resolution the exact counter uses, or are
//! skipped entirely when remote lookups are disabled.

use crate::algo::{resolve_snapshot, PartitionContext, TriangleAlgorithm, UnresolvedPolicy};
use crate::graph::{NeighborhoodView, PartitionId, SnapshotStore};
use crate::query::{BatchConfig, FlushOutcome, QueryService, RemoteBatcher};
use rand::prelude::*;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct EstimateConfig {
    pub batch: BatchConfig,
    /// Wall-clock budget per sampling round.
    pub round_budget: Duration,
    pub rounds: usize,
    /// Optional cap on wedges drawn per round. Mostly for deterministic
    /// runs; `None` leaves the round purely time-bounded.
    pub wedges_per_round: Option<u64>,
    /// When off, wedges with unknown midpoints are skipped instead of
    /// resolved remotely and the run never touches the query service
    /// for neighborhoods.
    pub use_remote: bool,
    pub unresolved: UnresolvedPolicy,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        EstimateConfig {
            batch: BatchConfig::default(),
            round_budget: Duration::from_secs(1),
            rounds: 1,
            wedges_per_round: None,
            use_remote: true,
            unresolved: UnresolvedPolicy::default(),
            seed: None,
        }
    }
}

/// Running totals at the end of one sampling round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundEstimate {
    pub round: usize,
    /// Samples accumulated so far, not just in this round.
    pub samples: u64,
    pub estimate: f64,
}

/// Result of one estimation run.
#[derive(Debug, Clone)]
pub struct EstimateSummary {
    pub partition: PartitionId,
    pub estimate: f64,
    pub samples: u64,
    /// Samples recorded for wedges whose midpoint never resolved.
    pub zero_samples: u64,
    pub local_vertices: u64,
    pub rounds: Vec<RoundEstimate>,
    pub remote_calls: u64,
    pub remote_wait: Duration,
}

impl fmt::Display for EstimateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "In partition {} we estimated ~{:.0} triangles over {} samples ({} remote calls, {:?} remote wait)",
            self.partition, self.estimate, self.samples, self.remote_calls, self.remote_wait
        )?;
        if self.zero_samples > 0 {
            write!(f, ", {} zero samples", self.zero_samples)?;
        }
        Ok(())
    }
}

/// Wedge-sampling estimator for one partition's triangle share.
#[derive(Debug, Clone, Default)]
pub struct WedgeEstimator {
    config: EstimateConfig,
}

fn wedge_lambda(d1: usize, d2: usize, common: usize) -> f64 {
    if d1 + d2 == 0 {
        return 0.0;
    }
    common as f64 * d1 as f64 * d2 as f64 / (3.0 * (d1 + d2) as f64)
}

fn scaled(lambda_sum: f64, samples: u64, vertices: u64) -> f64 {
    if samples == 0 {
        0.0
    } else {
        lambda_sum / samples as f64 * vertices as f64
    }
}

impl WedgeEstimator {
    pub fn new(config: EstimateConfig) -> Self {
        WedgeEstimator { config }
    }

    /// Estimates this partition's triangle share in the context window.
    pub fn estimate(
        &self,
        snapshot: Option<SnapshotStore>,
        service: &dyn QueryService,
        ctx: &PartitionContext,
    ) -> EstimateSummary {
        let (snapshot, fetch_wait) =
            resolve_snapshot(snapshot, service, ctx, &self.config.batch.retry);
        let view = NeighborhoodView::from_snapshot(&snapshot, ctx.window);
        let local_vertices = view.vertex_count() as u64;
        if view.is_empty() {
            info!("partition {}: empty window, nothing to sample", ctx.local);
            return EstimateSummary {
                partition: ctx.local,
                estimate: 0.0,
                samples: 0,
                zero_samples: 0,
                local_vertices: 0,
                rounds: Vec::new(),
                remote_calls: 0,
                remote_wait: fetch_wait,
            };
        }
        info!(
            "partition {}: sampling wedges over {} vertices in window {}",
            ctx.local, local_vertices, ctx.window
        );

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut batcher = RemoteBatcher::new(
            service,
            ctx.local,
            &ctx.partitions,
            ctx.window,
            self.config.batch.clone(),
        );
        let mut lambda_sum = 0.0f64;
        let mut samples: u64 = 0;
        let mut zero_samples: u64 = 0;
        let mut rounds = Vec::with_capacity(self.config.rounds);

        for round in 1..=self.config.rounds {
            let deadline = Instant::now() + self.config.round_budget;
            let mut wedges: u64 = 0;
            loop {
                if let Some(cap) = self.config.wedges_per_round {
                    if wedges >= cap {
                        break;
                    }
                }
                if Instant::now() >= deadline {
                    break;
                }
                wedges += 1;

                let Some(v1) = view.vertex_at(rng.gen_range(0..view.vertex_count())) else {
                    continue;
                };
                let Some(first) = view.neighbors(&v1) else {
                    continue;
                };
                if first.is_empty() {
                    continue;
                }
                let Some(v2) = first.get_index(rng.gen_range(0..first.len())).copied() else {
                    continue;
                };

                if let Some(second) = view.neighbors(&v2) {
                    let common = first.iter().filter(|v| second.contains(*v)).count();
                    lambda_sum += wedge_lambda(first.len(), second.len(), common);
                    samples += 1;
                } else if let Some(cached) = batcher.cached_neighbors(&v2) {
                    let common = first.iter().filter(|v| cached.contains_key(*v)).count();
                    lambda_sum += wedge_lambda(first.len(), cached.len(), common);
                    samples += 1;
                } else if self.config.use_remote {
                    batcher.enqueue(v2, v1);
                    if batcher.is_full() {
                        self.settle(
                            batcher.flush(),
                            &view,
                            &mut lambda_sum,
                            &mut samples,
                            &mut zero_samples,
                        );
                    }
                }
            }
            if batcher.has_pending() {
                self.settle(
                    batcher.flush(),
                    &view,
                    &mut lambda_sum,
                    &mut samples,
                    &mut zero_samples,
                );
            }
            let estimate = scaled(lambda_sum, samples, local_vertices);
            info!(
                "partition {} round {}/{}: {} samples so far, running estimate {:.1}",
                ctx.local, round, self.config.rounds, samples, estimate
            );
            rounds.push(RoundEstimate {
                round,
                samples,
                estimate,
            });
        }

        let stats = batcher.stats().clone();
        EstimateSummary {
            partition: ctx.local,
            estimate: scaled(lambda_sum, samples, local_vertices),
            samples,
            zero_samples,
            local_vertices,
            rounds,
            remote_calls: stats.remote_calls,
            remote_wait: stats.remote_wait + fetch_wait,
        }
    }

    /// Folds a flush back into the accumulators: resolved targets score
    /// the wedges that were waiting on them, unresolved targets fall to
    /// the configured policy.
    fn settle(
        &self,
        outcome: FlushOutcome,
        view: &NeighborhoodView,
        lambda_sum: &mut f64,
        samples: &mut u64,
        zero_samples: &mut u64,
    ) {
        for resolved in outcome.resolved {
            let d2 = resolved.neighbors.len();
            for waiter in &resolved.waiters {
                let Some(first) = view.neighbors(waiter) else {
                    continue;
                };
                let common = first
                    .iter()
                    .filter(|v| resolved.neighbors.contains_key(*v))
                    .count();
                *lambda_sum += wedge_lambda(first.len(), d2, common);
                *samples += 1;
            }
        }
        if outcome.unresolved.is_empty() {
            return;
        }
        let targets = outcome.unresolved.len() as u64;
        match self.config.unresolved {
            UnresolvedPolicy::ZeroSample => {
                *samples += targets;
                *zero_samples += targets;
                debug!("{} unresolved targets counted as zero samples", targets);
            }
            UnresolvedPolicy::Discard => {
                debug!("{} unresolved targets discarded", targets);
            }
        }
    }
}

impl TriangleAlgorithm for WedgeEstimator {
    fn run(
        &self,
        snapshot: Option<SnapshotStore>,
        service: &dyn QueryService,
        ctx: &PartitionContext,
    ) -> String {
        self.estimate(snapshot, service, ctx).to_string()
    }
}
