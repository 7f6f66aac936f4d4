// Candidate pair generation for the collision pass.
//
// `AllPairs` proposes every unordered pair. `Grid` buckets circles into a
// spatial hash so only circles sharing a cell are proposed. Both return pairs
// of slice indices sorted ascending, so the collision pass sees the same
// order either way.
//
// Grid boxes are padded by `slack`: a pair left out cannot come into contact
// unless one of its circles moves further than that during the pass. The
// engine checks this and redoes the pass over all pairs when it happens.

use std::collections::HashMap;

use super::V2;
use crate::config::BroadphaseConfig;

#[derive(Debug, Clone)]
pub enum Broadphase {
    AllPairs,
    Grid(SpatialGrid),
}

impl Broadphase {
    pub fn from_config(cfg: &BroadphaseConfig) -> Self {
        match *cfg {
            BroadphaseConfig::AllPairs => Broadphase::AllPairs,
            BroadphaseConfig::Grid { cell_size } => Broadphase::Grid(SpatialGrid::new(cell_size)),
        }
    }

    /// Index pairs `(i, j)` with `i < j` whose circles may overlap.
    /// `circles` holds `(centre, radius)` in processing order.
    pub fn candidate_pairs(&mut self, circles: &[(V2, f64)]) -> Vec<(usize, usize)> {
        match self {
            Broadphase::AllPairs => all_pairs(circles.len()),
            Broadphase::Grid(grid) => {
                grid.clear();
                let slack = grid.slack();
                for (idx, (centre, radius)) in circles.iter().enumerate() {
                    grid.insert(idx, centre, *radius + slack);
                }
                grid.pairs()
            }
        }
    }

    /// How far a circle may move during a pass before its candidate pairs go stale.
    /// `None` when every pair is proposed anyway.
    pub fn slack(&self) -> Option<f64> {
        match self {
            Broadphase::AllPairs => None,
            Broadphase::Grid(grid) => Some(grid.slack()),
        }
    }
}

/// Every unordered index pair of `n` items, ascending.
pub fn all_pairs(n: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            pairs.push((i, j));
        }
    }
    pairs
}

/// A spatial hash grid over circle bounding boxes.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    /// Size of each cell in the grid.
    cell_size: f64,
    /// Map from cell coordinates to the indices of circles touching that cell.
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl SpatialGrid {
    /// Cell size should be roughly the diameter of a typical node.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: if cell_size > 0.0 { cell_size } else { 1.0 },
            cells: HashMap::new(),
        }
    }

    pub fn slack(&self) -> f64 {
        self.cell_size / 4.0
    }

    fn cell_of(&self, v: f64) -> i64 {
        (v / self.cell_size).floor() as i64
    }

    /// Insert circle `idx` into every cell its bounding box touches.
    pub fn insert(&mut self, idx: usize, centre: &V2, radius: f64) {
        let min_x = self.cell_of(centre.x - radius);
        let max_x = self.cell_of(centre.x + radius);
        let min_y = self.cell_of(centre.y - radius);
        let max_y = self.cell_of(centre.y + radius);

        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                self.cells.entry((cx, cy)).or_default().push(idx);
            }
        }
    }

    /// All pairs sharing at least one cell, deduplicated and sorted.
    /// May include false positives; the caller does the exact circle test.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for members in self.cells.values() {
            for (k, &a) in members.iter().enumerate() {
                for &b in &members[k + 1..] {
                    pairs.push(if a < b { (a, b) } else { (b, a) });
                }
            }
        }
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}
