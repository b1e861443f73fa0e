use crate::error::{config_bail, try_alloc, Result};
use crate::grid::{local_density, CellState, Grid};
use crate::proliferation::proliferate;
use crate::random::RandomStream;
use automata_common::{ModelVariant, Params};
use log::trace;
use rayon::prelude::*;

/// Number of transitions of each kind that fired during one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub mutations: usize,
    pub invasions: usize,
    pub effections: usize,
    pub deaths: usize,
    pub rebirths: usize,
}

/// Rejects parameters that cannot describe a run.
pub fn validate_params(params: &Params) -> Result<()> {
    for (k, &p) in params.probs.iter().enumerate() {
        if !(0.0..=1.0).contains(&p) {
            config_bail!("probs[{}] = {} is outside [0, 1]", k, p);
        }
    }
    if !(params.alpha.is_finite() && params.alpha >= 0.0) {
        config_bail!("alpha = {} must be finite and non-negative", params.alpha);
    }
    if !(params.beta.is_finite() && params.beta >= 0.0) {
        config_bail!("beta = {} must be finite and non-negative", params.beta);
    }
    Ok(())
}

/// Effection probability of the Extended model for a cancer cell whose
/// surroundings have the given cancer and effector densities.
#[inline(always)]
pub fn extended_effection(params: &Params, cancer_density: f64, effector_density: f64) -> f64 {
    let suppressed = params.effection() * (1.0 - cancer_density).powf(params.alpha);
    1.0 - (1.0 - suppressed) * (-effector_density * params.beta).exp()
}

/// Local cancer and effector densities around every cancer cell, taken from
/// the grid before the sweep mutates it.
struct DensityField {
    cancer: Vec<f64>,
    effector: Vec<f64>,
}

impl DensityField {
    fn compute(grid: &Grid) -> Result<Self> {
        let len = grid.len();
        let size = grid.size();
        let mut cancer = try_alloc("cancer density", len, 0.0)?;
        let mut effector = try_alloc("effector density", len, 0.0)?;
        let cells = grid.cells();

        cancer
            .par_iter_mut()
            .zip(effector.par_iter_mut())
            .enumerate()
            .for_each(|(idx, (cancer_out, effector_out))| {
                // Only cancer cells ever read their densities.
                if cells[idx] != CellState::Cancer {
                    return;
                }
                let (row, col) = (idx / size, idx % size);
                *cancer_out = local_density(grid, row, col, CellState::Cancer);
                *effector_out = local_density(grid, row, col, CellState::Effector);
            });

        Ok(Self { cancer, effector })
    }
}

/// Advances the automaton by one synchronous step.
///
/// Cells are visited row-major with one fresh uniform draw each. Cancer cells
/// always attempt proliferation and may independently turn into effectors on
/// the same step. Invaded cells stay `PendingCancer` until the sweep ends.
pub fn step<R>(
    grid: &mut Grid,
    model: ModelVariant,
    params: &Params,
    rng: &mut R,
) -> Result<StepStats>
where
    R: RandomStream + ?Sized,
{
    validate_params(params)?;
    let stats = match model {
        ModelVariant::Simple => {
            let k2 = params.effection();
            sweep(grid, params, rng, |_| k2)
        }
        ModelVariant::Extended => {
            let field = DensityField::compute(grid)?;
            sweep(grid, params, rng, |idx| {
                extended_effection(params, field.cancer[idx], field.effector[idx])
            })
        }
    };

    let resolved = grid.resolve_pending();
    debug_assert_eq!(resolved, stats.invasions);
    trace!("step: {:?}", stats);
    Ok(stats)
}

fn sweep<R, F>(grid: &mut Grid, params: &Params, rng: &mut R, effection_at: F) -> StepStats
where
    R: RandomStream + ?Sized,
    F: Fn(usize) -> f64,
{
    let mut stats = StepStats::default();
    let size = grid.size();

    for row in 0..size {
        for col in 0..size {
            let idx = grid.index(row, col);
            let r = rng.uniform();
            let state = grid.cells()[idx];

            match state {
                CellState::Normal if r < params.mutation() => {
                    grid.cells_mut()[idx] = CellState::Cancer;
                    stats.mutations += 1;
                }
                CellState::Cancer => {
                    if proliferate(grid, row, col, params, rng).is_some() {
                        stats.invasions += 1;
                    }
                    if r < effection_at(idx) {
                        grid.cells_mut()[idx] = CellState::Effector;
                        stats.effections += 1;
                    }
                }
                CellState::Effector if r < params.death() => {
                    grid.cells_mut()[idx] = CellState::Dead;
                    stats.deaths += 1;
                }
                CellState::Dead if r < params.rebirth() => {
                    grid.cells_mut()[idx] = CellState::Normal;
                    stats.rebirths += 1;
                }
                _ => {}
            }
        }
    }
    stats
}
