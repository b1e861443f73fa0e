use crate::error::{config_bail, try_alloc, Result};
use serde::{Deserialize, Serialize};

/// State of a single lattice site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    Normal,
    Cancer,
    Effector,
    Dead,
    /// Normal cell chosen for invasion during the step in progress.
    /// Resolved to `Cancer` before the step returns.
    PendingCancer,
}

impl CellState {
    /// The four states a grid may hold between steps, in counting order.
    pub const PERSISTED: [CellState; 4] = [
        CellState::Normal,
        CellState::Cancer,
        CellState::Effector,
        CellState::Dead,
    ];

    /// Slot of this state in a `[_; 4]` count array, `None` for the transient tag.
    #[inline(always)]
    pub fn count_index(self) -> Option<usize> {
        match self {
            CellState::Normal => Some(0),
            CellState::Cancer => Some(1),
            CellState::Effector => Some(2),
            CellState::Dead => Some(3),
            CellState::PendingCancer => None,
        }
    }
}

/// Von Neumann neighbour directions. The order fixes how the k-th normal
/// neighbour is enumerated during proliferation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    East,
    South,
    West,
    North,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::North,
    ];

    #[inline(always)]
    fn offset(self) -> (isize, isize) {
        match self {
            Direction::East => (0, 1),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
            Direction::North => (-1, 0),
        }
    }
}

/// N x N lattice of cell states stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<CellState>,
}

impl Grid {
    /// Allocates an all-Normal grid of side `size`.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            config_bail!("grid size must be at least 1");
        }
        let Some(len) = size.checked_mul(size) else {
            config_bail!("grid size {} overflows the cell count", size);
        };
        let cells = try_alloc("grid", len, CellState::Normal)?;
        Ok(Self { size, cells })
    }

    /// Builds a grid from explicit rows. Every row must have `rows.len()` entries
    /// and hold only persisted states.
    pub fn from_rows(rows: &[Vec<CellState>]) -> Result<Self> {
        let mut grid = Self::new(rows.len())?;
        for (i, row) in rows.iter().enumerate() {
            if row.len() != grid.size {
                config_bail!("row {} has {} cells, expected {}", i, row.len(), grid.size);
            }
            for (j, &state) in row.iter().enumerate() {
                grid.place(i, j, state)?;
            }
        }
        Ok(grid)
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of cells, N².
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline(always)]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.size + col
    }

    #[inline(always)]
    pub fn get(&self, row: usize, col: usize) -> CellState {
        self.cells[self.index(row, col)]
    }

    #[inline(always)]
    pub(crate) fn set(&mut self, row: usize, col: usize, state: CellState) {
        let idx = self.index(row, col);
        self.cells[idx] = state;
    }

    /// Sets one cell from outside a step. `PendingCancer` and out-of-range
    /// coordinates are rejected.
    pub fn place(&mut self, row: usize, col: usize, state: CellState) -> Result<()> {
        if state.count_index().is_none() {
            config_bail!("{:?} only exists while a step is in progress", state);
        }
        if row >= self.size || col >= self.size {
            config_bail!("({}, {}) is outside a {}x{} grid", row, col, self.size, self.size);
        }
        self.set(row, col, state);
        Ok(())
    }

    #[inline(always)]
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    #[inline(always)]
    pub(crate) fn cells_mut(&mut self) -> &mut [CellState] {
        &mut self.cells
    }

    /// Resets every cell to `state`.
    pub(crate) fn fill(&mut self, state: CellState) {
        self.cells.iter_mut().for_each(|c| *c = state);
    }

    /// Flat index of the neighbour of `(row, col)` in `direction`, or `None`
    /// when it falls outside the grid. No wraparound.
    #[inline(always)]
    pub fn neighbor(&self, row: usize, col: usize, direction: Direction) -> Option<usize> {
        let (dr, dc) = direction.offset();
        self.offset_index(row, col, dr, dc)
    }

    #[inline(always)]
    fn offset_index(&self, row: usize, col: usize, dr: isize, dc: isize) -> Option<usize> {
        let r = row.checked_add_signed(dr)?;
        let c = col.checked_add_signed(dc)?;
        (r < self.size && c < self.size).then(|| r * self.size + c)
    }

    /// Replaces every `PendingCancer` tag with `Cancer`. Returns how many were resolved.
    pub(crate) fn resolve_pending(&mut self) -> usize {
        let mut resolved = 0;
        for cell in self.cells.iter_mut() {
            if *cell == CellState::PendingCancer {
                *cell = CellState::Cancer;
                resolved += 1;
            }
        }
        resolved
    }

    pub fn has_pending(&self) -> bool {
        self.cells.contains(&CellState::PendingCancer)
    }
}

/// Maximum weighted sum of the 5x5 window: 8 inner-ring cells at weight 2
/// plus 16 outer-ring cells at weight 1.
const DENSITY_NORM: f64 = 32.0;

/// Weighted fraction of `target` cells in the 5x5 window centred on `(row, col)`.
///
/// The centre is excluded, inner-ring cells count double, and positions outside
/// the grid contribute nothing. The result always lies in [0, 1].
pub fn local_density(grid: &Grid, row: usize, col: usize, target: CellState) -> f64 {
    let mut weighted = 0.0;
    for dk in -2isize..=2 {
        for dl in -2isize..=2 {
            if dk == 0 && dl == 0 {
                continue;
            }
            let Some(idx) = grid.offset_index(row, col, dk, dl) else {
                continue;
            };
            if grid.cells[idx] == target {
                weighted += if dk.abs() <= 1 && dl.abs() <= 1 { 2.0 } else { 1.0 };
            }
        }
    }
    (weighted / DENSITY_NORM).clamp(0.0, 1.0)
}
