//! The entity-creation collaborator.
//!
//! The engine only decides *where* obstacles go. Creating and destroying the actual
//! entities is delegated to an [`EntityFactory`] supplied by the host, which hands
//! back an opaque handle the session keeps for teardown.
use glam::{DVec2, IVec2};

use crate::config::HealthRange;
use crate::error::SpawnError;

/// Everything the factory needs to create one obstacle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub position: DVec2,
    pub grid_coord: IVec2,
    pub sequence_index: usize,
    /// Passed through from the session config, uninterpreted.
    pub health_range: Option<HealthRange>,
}

/// Creates and destroys obstacle entities on behalf of a session.
pub trait EntityFactory {
    type Handle;

    /// Creates an entity. Failures skip the candidate without aborting the session.
    fn create(&mut self, request: &SpawnRequest) -> Result<Self::Handle, SpawnError>;

    /// Destroys an entity. Called at most once per handle.
    fn destroy(&mut self, handle: Self::Handle);

    /// Whether the factory can create entities at all (e.g. its template is loaded).
    fn is_ready(&self) -> bool {
        true
    }
}

impl<F: EntityFactory + ?Sized> EntityFactory for &mut F {
    type Handle = F::Handle;

    fn create(&mut self, request: &SpawnRequest) -> Result<Self::Handle, SpawnError> {
        (**self).create(request)
    }

    fn destroy(&mut self, handle: Self::Handle) {
        (**self).destroy(handle)
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// A factory backed by closures, handy for hosts that already have spawn/despawn
/// functions.
pub struct FnFactory<C, D> {
    create: C,
    destroy: D,
}

impl<H, C, D> FnFactory<C, D>
where
    C: FnMut(&SpawnRequest) -> Result<H, SpawnError>,
    D: FnMut(H),
{
    pub fn new(create: C, destroy: D) -> Self {
        Self { create, destroy }
    }
}

impl<H, C, D> EntityFactory for FnFactory<C, D>
where
    C: FnMut(&SpawnRequest) -> Result<H, SpawnError>,
    D: FnMut(H),
{
    type Handle = H;

    #[inline]
    fn create(&mut self, request: &SpawnRequest) -> Result<H, SpawnError> {
        (self.create)(request)
    }

    #[inline]
    fn destroy(&mut self, handle: H) {
        (self.destroy)(handle)
    }
}
