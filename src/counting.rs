use crate::grid::{CellState, Grid};
use log::error;
use serde::{Deserialize, Serialize};

/// Population of each persisted state, indexed Normal, Cancer, Effector, Dead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCounts(pub [usize; 4]);

impl TypeCounts {
    #[inline(always)]
    pub fn of(&self, state: CellState) -> usize {
        state.count_index().map_or(0, |k| self.0[k])
    }

    pub fn normal(&self) -> usize {
        self.0[0]
    }

    pub fn cancer(&self) -> usize {
        self.0[1]
    }

    pub fn effector(&self) -> usize {
        self.0[2]
    }

    pub fn dead(&self) -> usize {
        self.0[3]
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }
}

/// Tallies the grid's cells per state.
///
/// Must only be called between steps: a `PendingCancer` cell here means a step
/// returned without resolving its invasions.
pub fn type_count(grid: &Grid) -> TypeCounts {
    let mut counts = [0usize; 4];
    let mut stray = 0usize;
    for &cell in grid.cells() {
        match cell.count_index() {
            Some(k) => counts[k] += 1,
            None => stray += 1,
        }
    }
    if stray > 0 {
        error!("{} pending cells observed outside a step", stray);
    }
    debug_assert_eq!(stray, 0, "pending cells observed outside a step");

    let counts = TypeCounts(counts);
    debug_assert_eq!(counts.total(), grid.len());
    counts
}
