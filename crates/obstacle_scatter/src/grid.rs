//! Bounded placement lattice around a session center.
//!
//! This module defines [`GridFrame`] (the mapping between grid coordinates and world
//! positions), [`GridCell`], and [`GridIndex`], which owns the authoritative
//! availability state for one session. Cells live in a flat arena addressed by
//! offset coordinates, so marking a cell is a single index write.
use glam::{DVec2, IVec2};

use crate::config::GenerationConfig;

/// Where a session is centered and which point the safe zone protects.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionOrigin {
    /// Grid center in world coordinates.
    pub center: DVec2,
    /// Moving reference point (e.g. the player). `None` disables the safe zone.
    pub reference: Option<DVec2>,
}

impl SessionOrigin {
    /// Centers the grid on `point` and protects the same point.
    pub fn at(point: DVec2) -> Self {
        Self {
            center: point,
            reference: Some(point),
        }
    }

    /// Centers the grid on `center` without a reference point.
    pub fn new(center: DVec2) -> Self {
        Self {
            center,
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: DVec2) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Builds an origin from any `mint`-compatible vector.
    pub fn from_mint(point: mint::Vector2<f64>) -> Self {
        Self::at(DVec2::from(point))
    }
}

/// Coordinate mapping of a grid with radius `radius` centered on `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridFrame {
    pub center: DVec2,
    pub radius: i32,
}

impl GridFrame {
    pub fn new(center: DVec2, radius: i32) -> Self {
        Self { center, radius }
    }

    /// Cells per side, `2R + 1`. Negative radii count as zero.
    #[inline]
    pub fn side(&self) -> usize {
        (self.radius.max(0) as usize)
            .saturating_mul(2)
            .saturating_add(1)
    }

    /// World position of a cell. The half-cell offset keeps placements off grid lines.
    #[inline]
    pub fn grid_to_world(&self, coord: IVec2) -> DVec2 {
        self.center + coord.as_dvec2() + DVec2::splat(0.5)
    }

    /// Nearest grid coordinate for a world position.
    #[inline]
    pub fn world_to_grid(&self, position: DVec2) -> IVec2 {
        let local = position - self.center - DVec2::splat(0.5);
        IVec2::new(local.x.round() as i32, local.y.round() as i32)
    }

    #[inline]
    pub fn contains(&self, coord: IVec2) -> bool {
        coord.x.abs() <= self.radius && coord.y.abs() <= self.radius
    }

    /// Arena index for an in-bounds coordinate.
    #[inline]
    fn index(&self, coord: IVec2) -> Option<usize> {
        if !self.contains(coord) {
            return None;
        }
        let gx = (coord.x + self.radius) as usize;
        let gy = (coord.y + self.radius) as usize;
        Some(gx * self.side() + gy)
    }
}

/// One lattice position with its distance metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub world_position: DVec2,
    pub grid_coord: IVec2,
    pub available: bool,
    pub dist_to_center: f64,
    /// `f64::INFINITY` when the session has no reference point.
    pub dist_to_reference: f64,
}

/// Availability index for one session.
#[derive(Debug, Clone)]
pub struct GridIndex {
    frame: GridFrame,
    cells: Vec<GridCell>,
    /// Available coordinates in build scan order (x outer, y inner).
    available: Vec<IVec2>,
    reference: Option<DVec2>,
    safe_radius: f64,
    max_radius: f64,
}

impl GridIndex {
    /// Builds the lattice for `origin` and computes static availability.
    pub fn build(origin: &SessionOrigin, config: &GenerationConfig) -> Self {
        let frame = GridFrame::new(origin.center, config.grid_radius.max(0));
        let max_radius = config.max_generation_radius();
        let side = frame.side();

        let mut cells = Vec::with_capacity(side * side);
        let mut available = Vec::new();

        for x in -frame.radius..=frame.radius {
            for y in -frame.radius..=frame.radius {
                let grid_coord = IVec2::new(x, y);
                let world_position = frame.grid_to_world(grid_coord);
                let dist_to_center = world_position.distance(frame.center);
                let dist_to_reference = origin
                    .reference
                    .map_or(f64::INFINITY, |r| world_position.distance(r));

                let is_available =
                    dist_to_reference >= config.safe_radius && dist_to_center <= max_radius;
                if is_available {
                    available.push(grid_coord);
                }

                cells.push(GridCell {
                    world_position,
                    grid_coord,
                    available: is_available,
                    dist_to_center,
                    dist_to_reference,
                });
            }
        }

        Self {
            frame,
            cells,
            available,
            reference: origin.reference,
            safe_radius: config.safe_radius,
            max_radius,
        }
    }

    pub fn frame(&self) -> &GridFrame {
        &self.frame
    }

    pub fn cell(&self, coord: IVec2) -> Option<&GridCell> {
        self.frame.index(coord).map(|i| &self.cells[i])
    }

    /// All cells in scan order.
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Currently available coordinates in scan order.
    pub fn available(&self) -> &[IVec2] {
        &self.available
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    /// `false` for out-of-bounds coordinates, so neighbor probes near the border are safe.
    pub fn is_available(&self, coord: IVec2) -> bool {
        self.cell(coord).is_some_and(|c| c.available)
    }

    /// Whether an arbitrary world position may hold an obstacle: its nearest cell is
    /// available, and the position itself lies inside the inclusion disk and outside
    /// the safe zone. Off-center positions can differ from their cell on the last two.
    pub fn admits(&self, position: DVec2) -> bool {
        if !self.is_available(self.frame.world_to_grid(position)) {
            return false;
        }
        let inside = position.distance(self.frame.center) <= self.max_radius;
        let clear = self
            .reference
            .is_none_or(|r| position.distance(r) >= self.safe_radius);
        inside && clear
    }

    /// Marks a cell unavailable. Returns `true` if the cell changed.
    pub fn mark_unavailable(&mut self, coord: IVec2) -> bool {
        let Some(i) = self.frame.index(coord) else {
            return false;
        };
        if !self.cells[i].available {
            return false;
        }
        self.cells[i].available = false;

        // Scan order is lexicographic in (x, y), so the list stays sorted.
        if let Ok(pos) = self
            .available
            .binary_search_by(|c| (c.x, c.y).cmp(&(coord.x, coord.y)))
        {
            self.available.remove(pos);
        }
        true
    }

    /// Marks `coord` and its 8 neighbors unavailable. Returns how many cells changed.
    pub fn mark_neighborhood_unavailable(&mut self, coord: IVec2) -> usize {
        let mut changed = 0;
        for dx in -1..=1 {
            for dy in -1..=1 {
                if self.mark_unavailable(coord + IVec2::new(dx, dy)) {
                    changed += 1;
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(radius: i32, safe: f64) -> GenerationConfig {
        GenerationConfig::default()
            .with_grid_radius(radius)
            .with_safe_radius(safe)
    }

    #[test]
    fn frame_roundtrips_cell_centers() {
        let frame = GridFrame::new(DVec2::new(3.0, -2.0), 4);
        let coord = IVec2::new(-2, 3);
        let world = frame.grid_to_world(coord);
        assert_eq!(world, DVec2::new(1.5, 1.5));
        assert_eq!(frame.world_to_grid(world), coord);
        assert_eq!(frame.world_to_grid(world + DVec2::new(0.3, -0.3)), coord);
    }

    #[test]
    fn side_does_not_overflow_for_extreme_radii() {
        assert_eq!(GridFrame::new(DVec2::ZERO, 4).side(), 9);
        assert_eq!(GridFrame::new(DVec2::ZERO, -3).side(), 1);
        let side = GridFrame::new(DVec2::ZERO, i32::MAX).side();
        assert!(side >= i32::MAX as usize);
    }

    #[test]
    fn build_sizes_grid_and_computes_distances() {
        let origin = SessionOrigin::at(DVec2::ZERO);
        let grid = GridIndex::build(&origin, &config(3, 0.0));
        assert_eq!(grid.total_cells(), 49);

        let cell = grid.cell(IVec2::new(0, 0)).expect("center cell");
        assert_eq!(cell.world_position, DVec2::new(0.5, 0.5));
        assert!((cell.dist_to_center - 0.5f64.hypot(0.5)).abs() < 1e-12);
        assert_eq!(cell.dist_to_center, cell.dist_to_reference);
    }

    #[test]
    fn availability_honors_safe_and_max_radius() {
        let origin = SessionOrigin::at(DVec2::ZERO);
        let config = config(6, 2.0);
        let grid = GridIndex::build(&origin, &config);

        for cell in grid.cells() {
            let expected = cell.dist_to_reference >= 2.0 && cell.dist_to_center <= 6.0;
            assert_eq!(cell.available, expected, "cell {:?}", cell.grid_coord);
        }
        // Corner lies outside the inclusion disk.
        assert!(!grid.is_available(IVec2::new(6, 6)));
        // Center lies inside the safe zone.
        assert!(!grid.is_available(IVec2::new(0, 0)));
        assert!(grid.is_available(IVec2::new(3, 0)));
    }

    #[test]
    fn admits_checks_the_exact_position() {
        let origin = SessionOrigin::at(DVec2::ZERO);
        let grid = GridIndex::build(&origin, &config(6, 2.0));

        let inner = IVec2::new(1, 1);
        assert!(grid.is_available(inner));
        assert!(grid.admits(grid.frame().grid_to_world(inner)));
        // Same cell, but the corner lies inside the safe zone.
        let near = DVec2::new(1.05, 1.05);
        assert_eq!(grid.frame().world_to_grid(near), inner);
        assert!(!grid.admits(near));

        let outer = IVec2::new(4, 3);
        assert!(grid.is_available(outer));
        // Same cell, but the corner lies past the inclusion disk.
        let far = DVec2::new(4.95, 3.95);
        assert_eq!(grid.frame().world_to_grid(far), outer);
        assert!(!grid.admits(far));
        assert!(!grid.admits(DVec2::new(100.0, 0.0)));
    }

    #[test]
    fn missing_reference_disables_safe_zone() {
        let origin = SessionOrigin::new(DVec2::ZERO);
        let grid = GridIndex::build(&origin, &config(2, 100.0));
        let cell = grid.cell(IVec2::ZERO).expect("center");
        assert!(cell.available);
        assert_eq!(cell.dist_to_reference, f64::INFINITY);
    }

    #[test]
    fn available_list_matches_flags_in_scan_order() {
        let grid = GridIndex::build(&SessionOrigin::at(DVec2::ZERO), &config(4, 1.0));
        let from_flags: Vec<IVec2> = grid
            .cells()
            .iter()
            .filter(|c| c.available)
            .map(|c| c.grid_coord)
            .collect();
        assert_eq!(grid.available(), from_flags.as_slice());
    }

    #[test]
    fn mark_unavailable_is_idempotent_and_ignores_out_of_bounds() {
        let mut grid = GridIndex::build(&SessionOrigin::new(DVec2::ZERO), &config(2, 0.0));
        let before = grid.available_count();
        let coord = IVec2::new(1, 0);

        assert!(grid.mark_unavailable(coord));
        assert!(!grid.mark_unavailable(coord));
        assert!(!grid.mark_unavailable(IVec2::new(10, 0)));
        assert!(!grid.is_available(coord));
        assert!(!grid.available().contains(&coord));
        assert_eq!(grid.available_count(), before - 1);
    }

    #[test]
    fn is_available_is_false_out_of_bounds() {
        let grid = GridIndex::build(&SessionOrigin::new(DVec2::ZERO), &config(2, 0.0));
        assert!(!grid.is_available(IVec2::new(3, 0)));
        assert!(!grid.is_available(IVec2::new(0, -3)));
    }

    #[test]
    fn neighborhood_marking_clamps_at_border() {
        let mut grid = GridIndex::build(&SessionOrigin::new(DVec2::ZERO), &config(3, 0.0));
        let corner = IVec2::new(-3, -3);
        // The corner itself lies outside the inclusion disk and half the block is out of bounds.
        let changed = grid.mark_neighborhood_unavailable(corner);
        assert_eq!(changed, 3);
        assert!(!grid.is_available(IVec2::new(-2, -2)));
        assert!(!grid.is_available(IVec2::new(-3, -2)));
        assert!(!grid.is_available(IVec2::new(-2, -3)));

        let changed = grid.mark_neighborhood_unavailable(IVec2::ZERO);
        assert_eq!(changed, 9);
        for dx in -1..=1 {
            for dy in -1..=1 {
                assert!(!grid.is_available(IVec2::new(dx, dy)));
            }
        }
    }
}
