//! Incremental placement engine.
//!
//! [`PlacementScheduler`] walks a candidate list that is shuffled once per session,
//! validates each candidate against the [`GridIndex`] and the spacing rule, commits
//! valid ones through the [`EntityFactory`], and suspends whenever the current slice
//! runs out of time or item budget. All loop state lives in the scheduler, so the
//! host simply calls [`PlacementScheduler::run_slice`] again on its next tick.
use std::time::{Duration, Instant};

use glam::IVec2;
use rand::RngCore;
use tracing::{debug, warn};

use crate::cluster::ClusterSampler;
use crate::config::{GenerationConfig, HealthRange};
use crate::events::{EventSink, GenerationEvent, GenerationEventKind, RejectReason, YieldReason};
use crate::factory::{EntityFactory, SpawnRequest};
use crate::grid::GridIndex;
use crate::placed::{PlacedSet, PlacementRecord};
use crate::random::shuffle;

/// Why a session ended short of its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Exhaustion {
    /// Every shuffled candidate was consumed.
    CandidatesExhausted,
    /// `target_count * max_attempts_multiplier` attempts were made.
    AttemptCapReached,
}

/// Per-slice work limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceBudget {
    pub time: Duration,
    pub max_items: usize,
}

impl SliceBudget {
    pub fn new(time: Duration, max_items: usize) -> Self {
        Self { time, max_items }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(config.per_slice_time_budget, config.max_items_per_slice)
    }
}

/// Result of running one slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceOutcome {
    /// The slice hit a budget; call again on the next tick.
    Suspended(YieldReason),
    /// The session is done. `Some` when it ended short of the target.
    Finished(Option<Exhaustion>),
}

/// Everything a slice mutates besides the scheduler itself.
pub struct SliceContext<'a, F: EntityFactory> {
    pub grid: &'a mut GridIndex,
    pub sampler: &'a ClusterSampler,
    pub placed: &'a mut PlacedSet<F::Handle>,
    pub factory: &'a mut F,
    pub rng: &'a mut dyn RngCore,
}

/// Cooperative placement loop for one session.
#[derive(Debug, Clone)]
pub struct PlacementScheduler {
    queue: Vec<IVec2>,
    cursor: usize,
    target: usize,
    max_attempts: usize,
    spacing_unit: f64,
    health_range: Option<HealthRange>,
    budget: SliceBudget,
    attempts: usize,
    slices: usize,
    create_failures: usize,
}

impl PlacementScheduler {
    /// Snapshots and shuffles the grid's available coordinates. The order is fixed
    /// for the rest of the session.
    pub fn new(grid: &GridIndex, config: &GenerationConfig, rng: &mut dyn RngCore) -> Self {
        let mut queue = grid.available().to_vec();
        shuffle(&mut queue, rng);

        Self {
            queue,
            cursor: 0,
            target: config.target_count,
            max_attempts: config.max_attempts(),
            spacing_unit: config.spacing_unit,
            health_range: config.health_range,
            budget: SliceBudget::from_config(config),
            attempts: 0,
            slices: 0,
            create_failures: 0,
        }
    }

    pub fn with_budget(mut self, budget: SliceBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Candidates in processing order.
    pub fn queue(&self) -> &[IVec2] {
        &self.queue
    }

    pub fn remaining_candidates(&self) -> usize {
        self.queue.len() - self.cursor
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn slices(&self) -> usize {
        self.slices
    }

    pub fn create_failures(&self) -> usize {
        self.create_failures
    }

    pub fn target(&self) -> usize {
        self.target
    }

    /// `None` while work remains; otherwise the finish state.
    fn termination(&self, placed: usize) -> Option<Option<Exhaustion>> {
        if placed >= self.target {
            Some(None)
        } else if self.cursor >= self.queue.len() {
            Some(Some(Exhaustion::CandidatesExhausted))
        } else if self.attempts >= self.max_attempts {
            Some(Some(Exhaustion::AttemptCapReached))
        } else {
            None
        }
    }

    /// Runs candidates until the session finishes or a slice budget is exhausted.
    ///
    /// The time budget is only checked once the slice has processed a candidate, so
    /// every slice makes progress even on a very slow factory.
    pub fn run_slice<F: EntityFactory>(
        &mut self,
        ctx: SliceContext<'_, F>,
        sink: &mut dyn EventSink,
    ) -> SliceOutcome {
        let SliceContext {
            grid,
            sampler,
            placed,
            factory,
            rng,
        } = ctx;

        if let Some(done) = self.termination(placed.len()) {
            return SliceOutcome::Finished(done);
        }

        let slice = self.slices;
        self.slices += 1;
        let started = Instant::now();
        let mut processed = 0usize;
        let mut committed = 0usize;

        loop {
            if let Some(done) = self.termination(placed.len()) {
                debug!(
                    "Slice {}: finished with {}/{} placed after {} attempts.",
                    slice,
                    placed.len(),
                    self.target,
                    self.attempts
                );
                return SliceOutcome::Finished(done);
            }

            let reason = if committed >= self.budget.max_items {
                Some(YieldReason::ItemBudget)
            } else if processed > 0 && started.elapsed() > self.budget.time {
                Some(YieldReason::TimeBudget)
            } else {
                None
            };
            if let Some(reason) = reason {
                let elapsed = started.elapsed();
                debug!(
                    "Slice {} yielded ({:?}): {} committed, {} processed in {:?}.",
                    slice, reason, committed, processed, elapsed
                );
                if sink.wants(GenerationEventKind::SliceYielded) {
                    sink.send(GenerationEvent::SliceYielded {
                        slice,
                        committed,
                        elapsed,
                        reason,
                    });
                }
                return SliceOutcome::Suspended(reason);
            }

            let picked = self.queue[self.cursor];
            self.cursor += 1;
            processed += 1;

            let frame = *grid.frame();
            let mut position = frame.grid_to_world(picked);
            let clustered = sampler.next_candidate(position, placed.records(), rng);
            if clustered != position && grid.admits(clustered) {
                position = clustered;
            }
            let coord = frame.world_to_grid(position);

            let rejection = if !grid.is_available(coord) {
                Some(RejectReason::CellUnavailable)
            } else if !grid.admits(position) {
                Some(RejectReason::OutOfBounds)
            } else if !placed.is_clear_of(position, self.spacing_unit) {
                Some(RejectReason::TooClose)
            } else {
                let record = PlacementRecord {
                    position,
                    grid_coord: coord,
                    sequence_index: placed.next_sequence_index(),
                };
                let request = SpawnRequest {
                    position,
                    grid_coord: coord,
                    sequence_index: record.sequence_index,
                    health_range: self.health_range,
                };
                match factory.create(&request) {
                    Ok(handle) => {
                        placed.push(record, handle);
                        grid.mark_neighborhood_unavailable(coord);
                        committed += 1;
                        if sink.wants(GenerationEventKind::PlacementCommitted) {
                            sink.send(GenerationEvent::PlacementCommitted { record });
                        }
                        None
                    }
                    Err(err) => {
                        warn!("Skipping candidate at {:?}: {}.", position, err);
                        self.create_failures += 1;
                        Some(RejectReason::CreateFailed)
                    }
                }
            };

            if let Some(reason) = rejection {
                if sink.wants(GenerationEventKind::CandidateRejected) {
                    sink.send(GenerationEvent::CandidateRejected {
                        coord,
                        position,
                        reason,
                    });
                }
            }

            self.attempts += 1;
        }
    }
}
