use crate::counting::{type_count, TypeCounts};
use crate::display::iterate_display;
use crate::error::{config_bail, try_alloc, Result};
use crate::grid::{CellState, Grid};
use crate::model::{step, validate_params, StepStats};
use crate::random::RandomStream;
use automata_common::{AutomatonConfig, CountRecord, ModelVariant, Params};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::time::Duration;

/// Resets the grid to all Normal and scatters exactly `m` cancer cells
/// uniformly at random by rejection sampling.
pub fn init_state<R>(grid: &mut Grid, m: usize, rng: &mut R) -> Result<()>
where
    R: RandomStream + ?Sized,
{
    if m > grid.len() {
        config_bail!("cannot place {} cancer cells on a grid of {} cells", m, grid.len());
    }
    grid.fill(CellState::Normal);

    let size = grid.size();
    let mut placed = 0;
    while placed < m {
        let row = rng.below(size);
        let col = rng.below(size);
        if grid.get(row, col) == CellState::Normal {
            grid.set(row, col, CellState::Cancer);
            placed += 1;
        }
    }
    Ok(())
}

/// Applies `steps` steps, returning the counts observed after each one.
pub fn iterate<R>(
    grid: &mut Grid,
    steps: u32,
    model: ModelVariant,
    params: &Params,
    rng: &mut R,
) -> Result<Vec<TypeCounts>>
where
    R: RandomStream + ?Sized,
{
    validate_params(params)?;
    let mut series = try_alloc("count series", steps as usize, TypeCounts::default())?;
    for slot in series.iter_mut() {
        step(grid, model, params, rng)?;
        *slot = type_count(grid);
    }
    Ok(series)
}

/// Applies `steps` steps and counts only the final state.
pub fn iterate_endcount<R>(
    grid: &mut Grid,
    steps: u32,
    model: ModelVariant,
    params: &Params,
    rng: &mut R,
) -> Result<TypeCounts>
where
    R: RandomStream + ?Sized,
{
    validate_params(params)?;
    for _ in 0..steps {
        step(grid, model, params, rng)?;
    }
    Ok(type_count(grid))
}

/// A single seeded realization driven step by step from a configuration.
pub struct AutomatonSimulation {
    /// The configuration this realization was built from.
    pub config: AutomatonConfig,
    grid: Grid,
    params: Params,
    model: ModelVariant,
    /// Stream owned by this realization.
    rng: StdRng,
    /// Number of completed steps.
    pub current_step: u32,
    recorded: Vec<CountRecord>,
}

impl AutomatonSimulation {
    /// Allocates the grid and places the initial cancer cells.
    pub fn new(config: AutomatonConfig) -> Result<Self> {
        let params = config.params();
        validate_params(&params)?;

        let mut rng = StdRng::seed_from_u64(config.run.seed);
        let mut grid = Grid::new(config.grid.size)?;
        init_state(&mut grid, config.grid.initial_cancer, &mut rng)?;
        debug!(
            "Initialized {}x{} grid with {} cancer cells.",
            grid.size(), grid.size(), config.grid.initial_cancer
        );

        Ok(Self {
            model: config.model.variant,
            config,
            grid,
            params,
            rng,
            current_step: 0,
            recorded: Vec::new(),
        })
    }

    /// Advances the realization by one step.
    pub fn step(&mut self) -> Result<StepStats> {
        let stats = step(&mut self.grid, self.model, &self.params, &mut self.rng)?;
        self.current_step += 1;
        Ok(stats)
    }

    /// Animates `steps` further steps on `out`.
    pub fn display<W>(&mut self, steps: u32, delay: Duration, out: &mut W) -> Result<()>
    where
        W: Write + ?Sized,
    {
        let (model, params) = (self.model, &self.params);
        iterate_display(&mut self.grid, steps, model, params, &mut self.rng, delay, out)?;
        self.current_step += steps;
        Ok(())
    }

    /// Counts the current grid and appends the result to the recorded series.
    pub fn record_counts(&mut self) -> TypeCounts {
        let counts = type_count(&self.grid);
        trace!("Step {}: counts {:?}", self.current_step, counts.0);
        self.recorded.push(CountRecord { step: self.current_step, counts: counts.0 });
        counts
    }

    pub fn recorded_counts(&self) -> &[CountRecord] {
        &self.recorded
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn model(&self) -> ModelVariant {
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use automata_common::{GridConfig, ModelConfig, OutputConfig, RunConfig, RunMode};

    fn config(size: usize, initial_cancer: usize, probs: [f64; 5]) -> AutomatonConfig {
        AutomatonConfig {
            grid: GridConfig { size, initial_cancer },
            model: ModelConfig {
                variant: ModelVariant::Simple,
                probs,
                competition: true,
                alpha: 1.0,
                beta: 1.0,
            },
            run: RunConfig {
                mode: RunMode::Series,
                steps: 10,
                runs: 1,
                init_steps: 0,
                samples: 1,
                sample_gap: 0,
                seed: 99,
                display_delay_ms: 0,
            },
            output: OutputConfig { base_filename: "test".into(), save_report: false, format: None },
        }
    }

    #[test]
    fn test_init_state_places_exact_count() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut grid = Grid::new(8).unwrap();
        grid.fill(CellState::Dead);
        for m in [0, 1, 17, 63, 64] {
            init_state(&mut grid, m, &mut rng).unwrap();
            let counts = type_count(&grid);
            assert_eq!(counts.cancer(), m);
            assert_eq!(counts.normal(), 64 - m);
        }
    }

    #[test]
    fn test_init_state_rejects_overfull_grid() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut grid = Grid::new(3).unwrap();
        assert!(init_state(&mut grid, 10, &mut rng).is_err());
    }

    #[test]
    fn test_iterate_records_every_step() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut grid = Grid::new(10).unwrap();
        init_state(&mut grid, 5, &mut rng).unwrap();
        let params = Params::default();
        let series = iterate(&mut grid, 25, ModelVariant::Simple, &params, &mut rng).unwrap();
        assert_eq!(series.len(), 25);
        assert!(series.iter().all(|c| c.total() == 100));
        assert_eq!(*series.last().unwrap(), type_count(&grid));
    }

    #[test]
    fn test_endcount_matches_last_series_entry() {
        let params = Params::default();
        let mut grid_a = Grid::new(12).unwrap();
        let mut rng_a = StdRng::seed_from_u64(77);
        init_state(&mut grid_a, 9, &mut rng_a).unwrap();
        let mut grid_b = grid_a.clone();
        let mut rng_b = rng_a.clone();

        let model = ModelVariant::Extended;
        let series = iterate(&mut grid_a, 30, model, &params, &mut rng_a).unwrap();
        let end = iterate_endcount(&mut grid_b, 30, model, &params, &mut rng_b).unwrap();
        assert_eq!(series[29], end);
        assert_eq!(grid_a, grid_b);
    }

    #[test]
    fn test_iterate_rejects_invalid_params() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut grid = Grid::new(2).unwrap();
        let params = Params::with_probs([0.0, -0.1, 0.0, 0.0, 0.0]);
        assert!(iterate_endcount(&mut grid, 1, ModelVariant::Simple, &params, &mut rng).is_err());
    }

    #[test]
    fn test_zero_steps_leaves_grid_untouched() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut grid = Grid::new(4).unwrap();
        init_state(&mut grid, 3, &mut rng).unwrap();
        let before = grid.clone();
        let params = Params::default();
        let series = iterate(&mut grid, 0, ModelVariant::Simple, &params, &mut rng).unwrap();
        assert!(series.is_empty());
        assert_eq!(grid, before);
    }

    #[test]
    fn test_simulation_records_series() {
        let config = config(15, 4, [0.0, 0.6, 0.05, 0.05, 0.05]);
        let mut sim = AutomatonSimulation::new(config).unwrap();
        assert_eq!(type_count(sim.grid()).cancer(), 4);
        sim.record_counts();
        for _ in 0..5 {
            sim.step().unwrap();
            sim.record_counts();
        }
        let steps: Vec<u32> = sim.recorded_counts().iter().map(|r| r.step).collect();
        assert_eq!(steps, vec![0, 1, 2, 3, 4, 5]);
        assert!(sim.recorded_counts().iter().all(|r| r.counts.iter().sum::<usize>() == 225));
    }

    #[test]
    fn test_simulation_is_seed_deterministic() {
        let run = || {
            let config = config(10, 6, [0.01, 0.6, 0.1, 0.1, 0.1]);
            let mut sim = AutomatonSimulation::new(config).unwrap();
            for _ in 0..20 {
                sim.step().unwrap();
            }
            sim.grid().clone()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_display_advances_the_realization() {
        let mut sim = AutomatonSimulation::new(config(4, 2, [0.0, 0.6, 0.05, 0.05, 0.05])).unwrap();
        let mut out = Vec::new();
        sim.display(3, Duration::ZERO, &mut out).unwrap();
        assert_eq!(sim.current_step, 3);
        assert!(!out.is_empty());
        assert_eq!(type_count(sim.grid()).total(), 16);
    }

    #[test]
    fn test_simulation_rejects_bad_probabilities() {
        assert!(AutomatonSimulation::new(config(5, 1, [0.0, 2.0, 0.0, 0.0, 0.0])).is_err());
    }
}
