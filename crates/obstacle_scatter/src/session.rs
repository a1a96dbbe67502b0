//! Session state machine driving teardown, grid build and placement across host ticks.
//!
//! A [`SessionController`] is `Idle` until [`SessionController::start_session`]
//! accepts a configuration, `Generating` while the host keeps calling
//! [`SessionController::tick`], and `Complete` once the scheduler finishes. Only one
//! session runs at a time; starting another while one is generating is rejected.
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::cluster::ClusterSampler;
use crate::config::GenerationConfig;
use crate::error::{Error, Result};
use crate::events::{EventSink, GenerationEvent, GenerationEventKind};
use crate::factory::EntityFactory;
use crate::grid::{GridIndex, SessionOrigin};
use crate::placed::{PlacedSet, PlacementRecord};
use crate::random::seed_for_session;
use crate::scheduler::{Exhaustion, PlacementScheduler, SliceBudget, SliceContext, SliceOutcome};

/// Lifecycle state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Generating,
    Complete,
}

/// What a generating session is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Destroying the previous session's entities.
    TearingDown,
    /// Running placement slices.
    Placing,
}

/// Summary of a finished session.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionReport {
    /// Session number, starting at 1.
    pub session: u64,
    /// Seed the session RNG was created from.
    pub seed: u64,
    /// Requested number of placements.
    pub target: usize,
    /// Placements actually committed.
    pub placed: usize,
    /// `target - placed`.
    pub deficiency: usize,
    /// Candidates tried.
    pub attempts: usize,
    /// Placement slices run.
    pub slices: usize,
    /// Candidates skipped because the factory failed.
    pub create_failures: usize,
    /// Cells available right after the grid was built.
    pub available_cells: usize,
    /// Why the session ended short, if it did.
    pub exhaustion: Option<Exhaustion>,
}

impl SessionReport {
    pub fn is_deficient(&self) -> bool {
        self.deficiency > 0
    }
}

struct Placing {
    grid: GridIndex,
    sampler: ClusterSampler,
    scheduler: PlacementScheduler,
    available_cells: usize,
}

enum Stage {
    TearingDown,
    Placing(Box<Placing>),
}

struct ActiveSession {
    id: u64,
    seed: u64,
    config: GenerationConfig,
    origin: SessionOrigin,
    rng: StdRng,
    stage: Stage,
}

/// Owns placement state across sessions and drives one session at a time.
///
/// `H` is the opaque handle type returned by the host's [`EntityFactory`].
pub struct SessionController<H> {
    state: SessionState,
    active: Option<ActiveSession>,
    placed: PlacedSet<H>,
    teardown: Vec<H>,
    last_config: Option<GenerationConfig>,
    last_grid: Option<GridIndex>,
    last_report: Option<SessionReport>,
    sessions_started: u64,
    base_seed: u64,
}

impl<H> Default for SessionController<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> SessionController<H> {
    /// Creates an idle controller. Sessions without a configured seed draw from a
    /// randomly seeded sequence.
    pub fn new() -> Self {
        Self::with_base_seed(rand::random())
    }

    /// Creates an idle controller whose unseeded sessions derive their seeds from
    /// `base_seed`.
    pub fn with_base_seed(base_seed: u64) -> Self {
        Self {
            state: SessionState::Idle,
            active: None,
            placed: PlacedSet::new(),
            teardown: Vec::new(),
            last_config: None,
            last_grid: None,
            last_report: None,
            sessions_started: 0,
            base_seed,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_generating(&self) -> bool {
        self.state == SessionState::Generating
    }

    pub fn phase(&self) -> Option<SessionPhase> {
        self.active.as_ref().map(|a| match a.stage {
            Stage::TearingDown => SessionPhase::TearingDown,
            Stage::Placing(_) => SessionPhase::Placing,
        })
    }

    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    pub fn placements(&self) -> &[PlacementRecord] {
        self.placed.records()
    }

    /// Handles of the entities created for the current placements.
    pub fn handles(&self) -> &[H] {
        self.placed.handles()
    }

    /// Handles still waiting to be destroyed.
    pub fn pending_teardown(&self) -> usize {
        self.teardown.len()
    }

    /// Configuration of the most recently started session.
    pub fn config(&self) -> Option<&GenerationConfig> {
        self.last_config.as_ref()
    }

    /// Grid of the running session, or of the last completed one.
    pub fn grid(&self) -> Option<&GridIndex> {
        match self.active.as_ref().map(|a| &a.stage) {
            Some(Stage::Placing(p)) => Some(&p.grid),
            _ => self.last_grid.as_ref(),
        }
    }

    pub fn last_report(&self) -> Option<&SessionReport> {
        self.last_report.as_ref()
    }

    /// Number of sessions accepted so far.
    pub fn sessions_started(&self) -> u64 {
        self.sessions_started
    }

    /// Starts a new session. Previous placements are queued for teardown, which runs
    /// sliced at the start of the session.
    pub fn start_session<F>(
        &mut self,
        config: GenerationConfig,
        origin: SessionOrigin,
        factory: &F,
    ) -> Result<u64>
    where
        F: EntityFactory<Handle = H> + ?Sized,
    {
        self.start_session_with_events(config, origin, factory, &mut ())
    }

    pub fn start_session_with_events<F>(
        &mut self,
        config: GenerationConfig,
        origin: SessionOrigin,
        factory: &F,
        sink: &mut dyn EventSink,
    ) -> Result<u64>
    where
        F: EntityFactory<Handle = H> + ?Sized,
    {
        if self.is_generating() {
            warn!("Generation already running; ignoring start request.");
            return Err(Error::AlreadyGenerating);
        }
        if let Err(err) = config.validate() {
            warn!("Rejected session config: {}.", err);
            return Err(err);
        }
        if !factory.is_ready() {
            warn!("Entity factory is not ready; session not started.");
            return Err(Error::FactoryUnavailable);
        }

        self.sessions_started += 1;
        let id = self.sessions_started;
        let seed = config
            .seed
            .unwrap_or_else(|| seed_for_session(self.base_seed, id));

        self.teardown.extend(self.placed.take_handles());
        self.last_grid = None;
        self.last_report = None;
        self.last_config = Some(config.clone());

        info!(
            "Session {}: target {} | radius {} | seed {} | {} handles to tear down.",
            id,
            config.target_count,
            config.grid_radius,
            seed,
            self.teardown.len()
        );
        if sink.wants(GenerationEventKind::SessionStarted) {
            sink.send(GenerationEvent::SessionStarted {
                session: id,
                config: config.clone(),
                origin,
                seed,
            });
        }

        self.active = Some(ActiveSession {
            id,
            seed,
            config,
            origin,
            rng: StdRng::seed_from_u64(seed),
            stage: Stage::TearingDown,
        });
        self.state = SessionState::Generating;
        Ok(id)
    }

    /// Restarts with the last configuration around a new origin.
    pub fn regenerate<F>(&mut self, origin: SessionOrigin, factory: &F) -> Result<u64>
    where
        F: EntityFactory<Handle = H> + ?Sized,
    {
        self.regenerate_with_events(origin, factory, &mut ())
    }

    pub fn regenerate_with_events<F>(
        &mut self,
        origin: SessionOrigin,
        factory: &F,
        sink: &mut dyn EventSink,
    ) -> Result<u64>
    where
        F: EntityFactory<Handle = H> + ?Sized,
    {
        if self.is_generating() {
            warn!("Generation already running; wait for it to finish before regenerating.");
            return Err(Error::AlreadyGenerating);
        }
        let Some(config) = self.last_config.clone() else {
            return Err(Error::NoPreviousSession);
        };
        self.start_session_with_events(config, origin, factory, sink)
    }

    /// Stops a running session immediately. Committed placements stay tracked and are
    /// torn down by the next session. Returns the aborted session number.
    pub fn abort(&mut self) -> Option<u64> {
        self.abort_with_events(&mut ())
    }

    pub fn abort_with_events(&mut self, sink: &mut dyn EventSink) -> Option<u64> {
        if !self.is_generating() {
            return None;
        }
        let active = self.active.take()?;
        self.state = SessionState::Idle;
        info!(
            "Session {} aborted with {} placements committed.",
            active.id,
            self.placed.len()
        );
        if sink.wants(GenerationEventKind::SessionAborted) {
            sink.send(GenerationEvent::SessionAborted {
                session: active.id,
                placed: self.placed.len(),
            });
        }
        Some(active.id)
    }

    /// Aborts any running session and destroys every tracked entity right away.
    /// Intended for host shutdown; returns the number of handles destroyed.
    pub fn shutdown<F>(&mut self, factory: &mut F) -> usize
    where
        F: EntityFactory<Handle = H> + ?Sized,
    {
        self.abort();
        self.teardown.extend(self.placed.take_handles());
        let count = self.teardown.len();
        while let Some(handle) = self.teardown.pop() {
            factory.destroy(handle);
        }
        self.last_grid = None;
        count
    }

    /// Advances the running session by one slice of work.
    pub fn tick<F>(&mut self, factory: &mut F) -> SessionState
    where
        F: EntityFactory<Handle = H>,
    {
        self.tick_with_events(factory, &mut ())
    }

    pub fn tick_with_events<F>(&mut self, factory: &mut F, sink: &mut dyn EventSink) -> SessionState
    where
        F: EntityFactory<Handle = H>,
    {
        let Some(active) = self.active.as_mut() else {
            return self.state;
        };

        if let Stage::TearingDown = active.stage {
            if !self.teardown.is_empty() {
                let budget = SliceBudget::from_config(&active.config);
                let destroyed = teardown_slice(&mut self.teardown, factory, budget);
                debug!(
                    "Session {}: destroyed {} handles, {} remaining.",
                    active.id,
                    destroyed,
                    self.teardown.len()
                );
                if sink.wants(GenerationEventKind::TeardownProgress) {
                    sink.send(GenerationEvent::TeardownProgress {
                        destroyed,
                        remaining: self.teardown.len(),
                    });
                }
                return self.state;
            }

            let grid = GridIndex::build(&active.origin, &active.config);
            let available_cells = grid.available_count();
            info!(
                "Session {}: grid built, {}/{} cells available.",
                active.id,
                available_cells,
                grid.total_cells()
            );
            if available_cells == 0 {
                warn!("Session {}: no grid cells available.", active.id);
                if sink.wants(GenerationEventKind::Warning) {
                    sink.send(GenerationEvent::Warning {
                        context: format!("session:{}", active.id),
                        message: "No grid cells available".into(),
                    });
                }
            }
            if sink.wants(GenerationEventKind::GridBuilt) {
                sink.send(GenerationEvent::GridBuilt {
                    center: grid.frame().center,
                    total_cells: grid.total_cells(),
                    available_cells,
                });
            }

            let sampler = ClusterSampler::from_config(&active.config, *grid.frame());
            let scheduler = PlacementScheduler::new(&grid, &active.config, &mut active.rng);
            active.stage = Stage::Placing(Box::new(Placing {
                grid,
                sampler,
                scheduler,
                available_cells,
            }));
        }

        let Stage::Placing(placing) = &mut active.stage else {
            return self.state;
        };

        let ctx = SliceContext {
            grid: &mut placing.grid,
            sampler: &placing.sampler,
            placed: &mut self.placed,
            factory,
            rng: &mut active.rng,
        };
        let SliceOutcome::Finished(exhaustion) = placing.scheduler.run_slice(ctx, sink) else {
            return self.state;
        };

        let target = active.config.target_count;
        let placed = self.placed.len();
        let report = SessionReport {
            session: active.id,
            seed: active.seed,
            target,
            placed,
            deficiency: target.saturating_sub(placed),
            attempts: placing.scheduler.attempts(),
            slices: placing.scheduler.slices(),
            create_failures: placing.scheduler.create_failures(),
            available_cells: placing.available_cells,
            exhaustion,
        };

        if report.is_deficient() {
            warn!(
                "Session {}: only placed {}/{} obstacles ({:?}).",
                report.session, placed, target, exhaustion
            );
            if sink.wants(GenerationEventKind::Warning) {
                sink.send(GenerationEvent::Warning {
                    context: format!("session:{}", report.session),
                    message: format!(
                        "Placed {placed}/{target}; deficiency {}",
                        report.deficiency
                    ),
                });
            }
        } else {
            info!(
                "Session {}: placed {}/{} obstacles in {} slices.",
                report.session, placed, target, report.slices
            );
        }
        if sink.wants(GenerationEventKind::SessionFinished) {
            sink.send(GenerationEvent::SessionFinished {
                report: report.clone(),
            });
        }

        if let Some(ActiveSession {
            stage: Stage::Placing(placing),
            ..
        }) = self.active.take()
        {
            self.last_grid = Some(placing.grid);
        }
        self.last_report = Some(report);
        self.state = SessionState::Complete;
        self.state
    }

    /// Ticks until the running session leaves `Generating`. Meant for offline tools
    /// and tests; real-time hosts should call [`Self::tick`] once per frame.
    pub fn run_to_completion<F>(&mut self, factory: &mut F) -> Option<&SessionReport>
    where
        F: EntityFactory<Handle = H>,
    {
        while self.tick(factory) == SessionState::Generating {}
        self.last_report.as_ref()
    }
}

/// Destroys handles (most recent first) until the slice budget is used up.
fn teardown_slice<H, F>(queue: &mut Vec<H>, factory: &mut F, budget: SliceBudget) -> usize
where
    F: EntityFactory<Handle = H> + ?Sized,
{
    let started = Instant::now();
    let mut destroyed = 0;
    while destroyed < budget.max_items {
        if destroyed > 0 && started.elapsed() > budget.time {
            break;
        }
        let Some(handle) = queue.pop() else {
            break;
        };
        factory.destroy(handle);
        destroyed += 1;
    }
    destroyed
}
