use crate::grid::{CellState, Direction, Grid};
use crate::random::RandomStream;
use automata_common::Params;

/// Neighbourhood of a cancer cell as seen by the proliferation rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeighborCensus {
    /// Flat indices of Normal neighbours, in `Direction::ALL` order.
    normal: [usize; 4],
    normal_count: usize,
    /// Cancer neighbours, including those already marked for invasion this step.
    cancer_count: usize,
}

impl NeighborCensus {
    pub fn take(grid: &Grid, row: usize, col: usize) -> Self {
        let mut census = Self::default();
        let cells = grid.cells();
        for direction in Direction::ALL {
            let Some(idx) = grid.neighbor(row, col, direction) else {
                continue;
            };
            match cells[idx] {
                CellState::Normal => {
                    census.normal[census.normal_count] = idx;
                    census.normal_count += 1;
                }
                CellState::Cancer | CellState::PendingCancer => census.cancer_count += 1,
                CellState::Effector | CellState::Dead => {}
            }
        }
        census
    }

    pub fn normal_neighbors(&self) -> &[usize] {
        &self.normal[..self.normal_count]
    }

    pub fn cancer_count(&self) -> usize {
        self.cancer_count
    }
}

/// Proliferation probability after the optional crowding discount.
#[inline(always)]
pub fn effective_rate(params: &Params, cancer_neighbors: usize) -> f64 {
    if params.competition {
        params.proliferation() * (1.0 - cancer_neighbors as f64 / 4.0)
    } else {
        params.proliferation()
    }
}

/// Lets the cancer cell at `(row, col)` try to invade one Normal neighbour.
///
/// On success the chosen neighbour is tagged `PendingCancer`; the caller resolves
/// the tag once the whole sweep is done, so invaded cells cannot spread again in
/// the same step. Returns the flat index of the invaded cell, if any.
pub fn proliferate<R>(
    grid: &mut Grid,
    row: usize,
    col: usize,
    params: &Params,
    rng: &mut R,
) -> Option<usize>
where
    R: RandomStream + ?Sized,
{
    let census = NeighborCensus::take(grid, row, col);
    let rate = effective_rate(params, census.cancer_count());

    let r = rng.uniform();
    let targets = census.normal_neighbors();
    if r < rate && !targets.is_empty() {
        let target = targets[rng.below(targets.len())];
        grid.cells_mut()[target] = CellState::PendingCancer;
        Some(target)
    } else {
        None
    }
}
