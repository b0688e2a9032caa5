//! Uniform spatial hash grid and the pair forces evaluated through it.
//!
//! The cell size equals the force cutoff, so every partner inside the cutoff
//! lives in the 3×3 block of cells around a particle.

use std::collections::HashMap;

use glam::Vec2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceParams {
    pub attraction: f32,
    pub repulsion:  f32,
    pub radius:     f32,
}

/// Force on a particle at `pi` from a partner at `pj`.
///
/// Attraction falls off linearly and repulsion quadratically toward the
/// cutoff. Coincident points and partners at or past the cutoff contribute
/// nothing.
pub fn pair_force(pi: Vec2, pj: Vec2, params: &ForceParams) -> Vec2 {
    let d = pj - pi;
    let dist = d.length();
    if dist >= params.radius || dist < 1e-4 {
        return Vec2::ZERO;
    }
    let dir = d / dist;
    let falloff = 1.0 - dist / params.radius;
    dir * (params.attraction * falloff - params.repulsion * falloff * falloff)
}

pub struct SpatialGrid {
    cell_size: f32,
    cells:     HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        SpatialGrid {
            cell_size: cell_size.max(1e-3),
            cells:     HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 { self.cell_size }

    /// Empty every bucket but keep the allocations for the next frame.
    pub fn clear(&mut self) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
    }

    pub fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, index: usize, pos: Vec2) {
        let cell = self.cell_of(pos);
        self.cells.entry(cell).or_default().push(index);
    }

    /// Rebuild from scratch for this frame's positions.
    pub fn rebuild(&mut self, cell_size: f32, positions: &[Vec2]) {
        let cell_size = cell_size.max(1e-3);
        if (self.cell_size - cell_size).abs() > f32::EPSILON {
            self.cell_size = cell_size;
            self.cells.clear();
        } else {
            self.clear();
        }
        for (i, &p) in positions.iter().enumerate() {
            self.insert(i, p);
        }
    }

    /// Indices in the 3×3 block of cells around `pos`.
    pub fn neighbors(&self, pos: Vec2) -> impl Iterator<Item = usize> + '_ {
        let (cx, cy) = self.cell_of(pos);
        (-1..=1)
            .flat_map(move |dx| (-1..=1).map(move |dy| (cx + dx, cy + dy)))
            .filter_map(move |cell| self.cells.get(&cell))
            .flat_map(|bucket| bucket.iter().copied())
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.values().filter(|b| !b.is_empty()).count()
    }
}

/// Net pair force on every particle, partners taken from the grid.
/// `grid` must have been rebuilt from `positions` with `params.radius`.
pub fn net_forces_grid(positions: &[Vec2], params: &ForceParams, grid: &SpatialGrid) -> Vec<Vec2> {
    positions.iter().enumerate().map(|(i, &pi)| {
        grid.neighbors(pi)
            .filter(|&j| j != i)
            .fold(Vec2::ZERO, |acc, j| acc + pair_force(pi, positions[j], params))
    }).collect()
}

/// Reference O(n²) evaluation.
pub fn net_forces_brute(positions: &[Vec2], params: &ForceParams) -> Vec<Vec2> {
    positions.iter().enumerate().map(|(i, &pi)| {
        positions.iter().enumerate()
            .filter(|&(j, _)| j != i)
            .fold(Vec2::ZERO, |acc, (_, &pj)| acc + pair_force(pi, pj, params))
    }).collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
