#![forbid(unsafe_code)]
//! obstacle_scatter: Frame-budgeted obstacle placement on a bounded grid.
//!
//! Modules:
//! - grid: grid frame, cells and the availability index (inclusion disk and safe zone)
//! - cluster: clustering bias that pulls candidates toward existing placements
//! - scheduler: sliced placement loop with time and item budgets
//! - session: session state machine (teardown, build, placing, complete)
//! - factory, placed, events: host collaborator, placement records, observation
//!
//! For examples and docs, see README and docs.rs.
pub mod cluster;
pub mod config;
pub mod error;
pub mod events;
pub mod factory;
pub mod grid;
pub mod placed;
pub mod random;
pub mod scheduler;
pub mod session;

/// Convenient re-exports for common types. Import with `use obstacle_scatter::prelude::*;`.
pub mod prelude {
    pub use crate::cluster::ClusterSampler;
    pub use crate::config::{GenerationConfig, HealthRange, MAX_GRID_RADIUS};
    pub use crate::error::{Error, Result, SpawnError};
    pub use crate::events::{
        EventSink, FilterSink, FnSink, GenerationEvent, GenerationEventKind, MultiSink,
        RejectReason, VecSink, YieldReason,
    };
    pub use crate::factory::{EntityFactory, FnFactory, SpawnRequest};
    pub use crate::grid::{GridCell, GridFrame, GridIndex, SessionOrigin};
    pub use crate::placed::{PlacedSet, PlacementRecord};
    pub use crate::random::seed_for_session;
    pub use crate::scheduler::{
        Exhaustion, PlacementScheduler, SliceBudget, SliceContext, SliceOutcome,
    };
    pub use crate::session::{SessionController, SessionPhase, SessionReport, SessionState};
}
