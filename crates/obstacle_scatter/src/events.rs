//! Event types and sinks for observing generation sessions.
//!
//! This module defines [`GenerationEvent`] and a set of sinks and adapters to emit,
//! collect, or forward events while a [`crate::session::SessionController`] is
//! ticked via [`crate::session::SessionController::tick_with_events`].
use std::time::Duration;

use glam::{DVec2, IVec2};

use crate::config::GenerationConfig;
use crate::grid::SessionOrigin;
use crate::placed::PlacementRecord;
use crate::session::SessionReport;

/// Why a slice handed control back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YieldReason {
    /// The slice ran past its wall-clock budget.
    TimeBudget,
    /// The slice committed (or destroyed) its maximum number of items.
    ItemBudget,
}

/// Why a candidate was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The candidate's cell was no longer available.
    CellUnavailable,
    /// An off-center candidate left the inclusion disk or entered the safe zone.
    OutOfBounds,
    /// The candidate was closer than the spacing unit to a placement.
    TooClose,
    /// The entity factory failed to create the obstacle.
    CreateFailed,
}

/// Describes events emitted while a session runs.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum GenerationEvent {
    /// Emitted when a session is accepted.
    SessionStarted {
        /// Session number, starting at 1.
        session: u64,
        /// Configuration snapshot for the session.
        config: GenerationConfig,
        /// Center and reference point of the session.
        origin: SessionOrigin,
        /// Seed the session RNG was created from.
        seed: u64,
    },

    /// Emitted after each teardown slice.
    TeardownProgress {
        /// Handles destroyed in this slice.
        destroyed: usize,
        /// Handles still waiting for destruction.
        remaining: usize,
    },

    /// Emitted once the grid for a session is built.
    GridBuilt {
        /// Grid center in world coordinates.
        center: DVec2,
        /// Total number of cells.
        total_cells: usize,
        /// Cells left available after static exclusions.
        available_cells: usize,
    },

    /// Emitted when a placement is committed.
    PlacementCommitted {
        /// The committed placement.
        record: PlacementRecord,
    },

    /// Emitted when a candidate is discarded.
    CandidateRejected {
        /// Candidate grid coordinate.
        coord: IVec2,
        /// Candidate world position.
        position: DVec2,
        /// Why it was discarded.
        reason: RejectReason,
    },

    /// Emitted when a slice suspends before the session is done.
    SliceYielded {
        /// Zero-based slice number within the placement phase.
        slice: usize,
        /// Items committed in this slice.
        committed: usize,
        /// Wall-clock time spent in this slice.
        elapsed: Duration,
        /// Which budget ended the slice.
        reason: YieldReason,
    },

    /// Emitted when a session reaches `Complete`.
    SessionFinished {
        /// Summary of the session.
        report: SessionReport,
    },

    /// Emitted when a running session is aborted.
    SessionAborted {
        /// Session number.
        session: u64,
        /// Placements committed before the abort.
        placed: usize,
    },

    /// Non-fatal warning generated during a session.
    Warning {
        /// Context string (e.g. session number).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// Discriminant of [`GenerationEvent`], used by sinks to filter what they receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationEventKind {
    SessionStarted,
    TeardownProgress,
    GridBuilt,
    PlacementCommitted,
    CandidateRejected,
    SliceYielded,
    SessionFinished,
    SessionAborted,
    Warning,
}

impl GenerationEvent {
    pub fn kind(&self) -> GenerationEventKind {
        match self {
            GenerationEvent::SessionStarted { .. } => GenerationEventKind::SessionStarted,
            GenerationEvent::TeardownProgress { .. } => GenerationEventKind::TeardownProgress,
            GenerationEvent::GridBuilt { .. } => GenerationEventKind::GridBuilt,
            GenerationEvent::PlacementCommitted { .. } => GenerationEventKind::PlacementCommitted,
            GenerationEvent::CandidateRejected { .. } => GenerationEventKind::CandidateRejected,
            GenerationEvent::SliceYielded { .. } => GenerationEventKind::SliceYielded,
            GenerationEvent::SessionFinished { .. } => GenerationEventKind::SessionFinished,
            GenerationEvent::SessionAborted { .. } => GenerationEventKind::SessionAborted,
            GenerationEvent::Warning { .. } => GenerationEventKind::Warning,
        }
    }
}

/// A generic event sink that accepts [`GenerationEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: GenerationEvent);

    /// Whether the sink cares about events of `kind`. Emitters skip building
    /// events nobody wants.
    fn wants(&self, _kind: GenerationEventKind) -> bool {
        true
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: GenerationEvent) {}

    #[inline]
    fn wants(&self, _kind: GenerationEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(GenerationEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(GenerationEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(GenerationEvent),
{
    #[inline]
    fn send(&mut self, event: GenerationEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects all events in a `Vec`.
#[derive(Default)]
pub struct VecSink {
    events: Vec<GenerationEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            events: Vec::with_capacity(cap),
        }
    }

    pub fn into_inner(self) -> Vec<GenerationEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[GenerationEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: GenerationEvent) {
        self.events.push(event);
    }
}

/// Fan-out sink that forwards each event to all contained sinks.
pub struct MultiSink<S: EventSink> {
    pub(crate) sinks: Vec<S>,
}

impl<S: EventSink> MultiSink<S> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sinks(sinks: Vec<S>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: S) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

impl<S: EventSink> Default for MultiSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> EventSink for MultiSink<S> {
    fn send(&mut self, event: GenerationEvent) {
        let kind = event.kind();
        let targets: Vec<usize> = (0..self.sinks.len())
            .filter(|&i| self.sinks[i].wants(kind))
            .collect();
        let Some((&last, rest)) = targets.split_last() else {
            return;
        };
        for &i in rest {
            self.sinks[i].send(event.clone());
        }
        self.sinks[last].send(event);
    }

    fn wants(&self, kind: GenerationEventKind) -> bool {
        self.sinks.iter().any(|s| s.wants(kind))
    }
}

/// Sink that only forwards events whose kind is in an allow-list.
pub struct FilterSink<S: EventSink> {
    inner: S,
    allowed: Vec<GenerationEventKind>,
}

impl<S: EventSink> FilterSink<S> {
    pub fn new(inner: S, allowed: impl IntoIterator<Item = GenerationEventKind>) -> Self {
        Self {
            inner,
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: EventSink> EventSink for FilterSink<S> {
    fn send(&mut self, event: GenerationEvent) {
        if self.wants(event.kind()) {
            self.inner.send(event);
        }
    }

    fn wants(&self, kind: GenerationEventKind) -> bool {
        self.allowed.contains(&kind) && self.inner.wants(kind)
    }
}
