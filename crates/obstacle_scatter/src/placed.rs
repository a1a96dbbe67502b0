//! Placement records and the handles of the entities created for them.
use glam::{DVec2, IVec2};

/// A committed placement.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlacementRecord {
    /// World position of the placement.
    pub position: DVec2,
    /// Grid coordinate the placement occupies.
    pub grid_coord: IVec2,
    /// Commit order within the session, starting at 0.
    pub sequence_index: usize,
}

/// Append-only set of placements for one session, together with the opaque
/// handles the entity factory returned for them.
#[derive(Debug)]
pub struct PlacedSet<H> {
    records: Vec<PlacementRecord>,
    handles: Vec<H>,
}

impl<H> Default for PlacedSet<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> PlacedSet<H> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            handles: Vec::new(),
        }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            records: Vec::with_capacity(cap),
            handles: Vec::with_capacity(cap),
        }
    }

    pub fn records(&self) -> &[PlacementRecord] {
        &self.records
    }

    pub fn handles(&self) -> &[H] {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sequence index the next commit will receive.
    pub fn next_sequence_index(&self) -> usize {
        self.records.len()
    }

    /// `true` if `position` keeps at least `min_distance` to every placement.
    pub fn is_clear_of(&self, position: DVec2, min_distance: f64) -> bool {
        let min_sq = min_distance * min_distance;
        self.records
            .iter()
            .all(|r| r.position.distance_squared(position) >= min_sq)
    }

    pub(crate) fn push(&mut self, record: PlacementRecord, handle: H) {
        debug_assert_eq!(record.sequence_index, self.records.len());
        self.records.push(record);
        self.handles.push(handle);
    }

    /// Empties the set, returning the handles for teardown.
    pub(crate) fn take_handles(&mut self) -> Vec<H> {
        self.records.clear();
        std::mem::take(&mut self.handles)
    }
}
