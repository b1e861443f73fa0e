use crate::error::{config_bail, try_alloc, Result};
use crate::grid::Grid;
use crate::model::validate_params;
use crate::random::stream_for_run;
use crate::simulation::{init_state, iterate_endcount};
use automata_common::{ModelVariant, Params};
use log::{debug, info, trace, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Empirical probability mass function over the number of cancer cells.
///
/// `probabilities()[k]` is the fraction of samples that ended with exactly `k`
/// cancer cells, for `k` in `0..=N²`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pmf {
    probabilities: Vec<f64>,
}

impl Pmf {
    /// Normalizes a histogram of sample counts by `samples`.
    fn from_histogram(histogram: &[u64], samples: usize) -> Result<Self> {
        let mut probabilities = try_alloc("pmf", histogram.len(), 0.0)?;
        let norm = samples as f64;
        for (p, &hits) in probabilities.iter_mut().zip(histogram) {
            *p = hits as f64 / norm;
        }
        Ok(Self { probabilities })
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn into_probabilities(self) -> Vec<f64> {
        self.probabilities
    }

    /// Probability of observing exactly `cancer_cells` cancer cells.
    pub fn get(&self, cancer_cells: usize) -> f64 {
        self.probabilities.get(cancer_cells).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// Total probability mass; 1.0 up to rounding.
    pub fn total(&self) -> f64 {
        self.probabilities.iter().sum()
    }

    /// Expected number of cancer cells.
    pub fn mean(&self) -> f64 {
        self.probabilities.iter().enumerate().map(|(k, p)| k as f64 * p).sum()
    }

    /// Most likely cancer-cell count (lowest count on ties).
    pub fn mode(&self) -> usize {
        let mut best = 0;
        for (k, &p) in self.probabilities.iter().enumerate() {
            if p > self.probabilities[best] {
                best = k;
            }
        }
        best
    }
}

/// Sampling schedule for [`pdf_rolling`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingSchedule {
    /// Burn-in steps before the first sample.
    pub init_steps: u32,
    /// Samples taken per realization, at least 1.
    pub samples: usize,
    /// Steps between consecutive samples.
    pub sample_gap: u32,
}

fn check_estimator_inputs(
    size: usize,
    c_cells: usize,
    runs: usize,
    params: &Params,
) -> Result<usize> {
    validate_params(params)?;
    if size == 0 {
        config_bail!("grid size must be at least 1");
    }
    let Some(cells) = size.checked_mul(size) else {
        config_bail!("grid size {} overflows the cell count", size);
    };
    if c_cells > cells {
        config_bail!("c_cells = {} exceeds the {} cells of the grid", c_cells, cells);
    }
    if runs == 0 {
        config_bail!("runs must be at least 1");
    }
    Ok(cells)
}

fn tally(cells: usize, cancer_counts: impl IntoIterator<Item = usize>) -> Result<Vec<u64>> {
    // Counts range over 0..=N², hence one extra bucket.
    let mut histogram = try_alloc("histogram", cells + 1, 0u64)?;
    for count in cancer_counts {
        histogram[count] += 1;
    }
    Ok(histogram)
}

/// Distribution of the cancer-cell count after `steps` steps, estimated from
/// `runs` independent realizations each starting with `c_cells` cancer cells.
///
/// Realizations run in parallel; realization `i` draws from
/// `stream_for_run(seed, i)`, so the result depends only on the inputs.
pub fn pdf(
    size: usize,
    c_cells: usize,
    steps: u32,
    runs: usize,
    model: ModelVariant,
    params: &Params,
    seed: u64,
) -> Result<Pmf> {
    let cells = check_estimator_inputs(size, c_cells, runs, params)?;
    info!(
        "pdf: {} runs of {} steps on a {}x{} grid ({:?} model, {} initial cancer cells)",
        runs, steps, size, size, model, c_cells
    );
    let start_time = Instant::now();

    let cancer_counts = (0..runs)
        .into_par_iter()
        .map(|run| -> Result<usize> {
            let mut rng = stream_for_run(seed, run);
            let mut grid = Grid::new(size)?;
            init_state(&mut grid, c_cells, &mut rng)?;
            let counts = iterate_endcount(&mut grid, steps, model, params, &mut rng)?;
            trace!("run {}: final counts {:?}", run, counts.0);
            Ok(counts.cancer())
        })
        .collect::<Result<Vec<usize>>>()?;

    let histogram = tally(cells, cancer_counts)?;
    let pmf = Pmf::from_histogram(&histogram, runs)?;
    debug!("pdf: mean {:.3}, mode {}, mass {:.12}", pmf.mean(), pmf.mode(), pmf.total());
    info!("pdf finished in {:.3} s", start_time.elapsed().as_secs_f64());
    Ok(pmf)
}

/// Stationary-state distribution of the cancer-cell count.
///
/// Each realization burns in for `schedule.init_steps` steps, then records
/// `schedule.samples` counts spaced `schedule.sample_gap` steps apart. Samples
/// from one trajectory are correlated; the histogram is normalized by
/// `runs * samples`.
pub fn pdf_rolling(
    size: usize,
    c_cells: usize,
    schedule: RollingSchedule,
    runs: usize,
    model: ModelVariant,
    params: &Params,
    seed: u64,
) -> Result<Pmf> {
    let cells = check_estimator_inputs(size, c_cells, runs, params)?;
    if schedule.samples == 0 {
        config_bail!("samples must be at least 1");
    }
    let Some(total_samples) = runs.checked_mul(schedule.samples) else {
        config_bail!("runs * samples overflows");
    };
    if schedule.samples > 1 && schedule.sample_gap == 0 {
        warn!(
            "sample_gap is 0: every realization contributes {} identical samples",
            schedule.samples
        );
    }
    info!(
        "pdf_rolling: {} runs x {} samples (burn-in {}, gap {}) on a {}x{} grid ({:?} model)",
        runs, schedule.samples, schedule.init_steps, schedule.sample_gap, size, size, model
    );
    let start_time = Instant::now();

    let per_run = (0..runs)
        .into_par_iter()
        .map(|run| -> Result<Vec<usize>> {
            let mut rng = stream_for_run(seed, run);
            let mut grid = Grid::new(size)?;
            init_state(&mut grid, c_cells, &mut rng)?;

            let mut samples = Vec::with_capacity(schedule.samples);
            let counts = iterate_endcount(&mut grid, schedule.init_steps, model, params, &mut rng)?;
            samples.push(counts.cancer());
            for _ in 1..schedule.samples {
                let counts =
                    iterate_endcount(&mut grid, schedule.sample_gap, model, params, &mut rng)?;
                samples.push(counts.cancer());
            }
            trace!("run {}: samples {:?}", run, samples);
            Ok(samples)
        })
        .collect::<Result<Vec<Vec<usize>>>>()?;

    let histogram = tally(cells, per_run.into_iter().flatten())?;
    let pmf = Pmf::from_histogram(&histogram, total_samples)?;
    debug!("pdf_rolling: mean {:.3}, mode {}, mass {:.12}", pmf.mean(), pmf.mode(), pmf.total());
    info!("pdf_rolling finished in {:.3} s", start_time.elapsed().as_secs_f64());
    Ok(pmf)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn test_no_cancer_stays_at_zero() {
        let params = Params::with_probs([0.0, 0.6, 0.05, 0.05, 0.05]);
        for model in [ModelVariant::Simple, ModelVariant::Extended] {
            let pmf = pdf(6, 0, 15, 40, model, &params, 1).unwrap();
            assert_eq!(pmf.len(), 37);
            assert_eq!(pmf.get(0), 1.0);
            assert!(pmf.probabilities()[1..].iter().all(|&p| p == 0.0));
        }
    }

    #[test]
    fn test_pdf_is_normalized() {
        let params = Params::with_probs([0.01, 0.6, 0.1, 0.1, 0.1]);
        let pmf = pdf(8, 3, 20, 137, ModelVariant::Simple, &params, 5).unwrap();
        assert!((pmf.total() - 1.0).abs() < TOLERANCE);
        assert!(pmf.probabilities().iter().all(|&p| p >= 0.0));
        // Every bucket is a multiple of 1/runs.
        for &p in pmf.probabilities() {
            let hits = p * 137.0;
            assert!((hits - hits.round()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_all_cancer_count_fits_in_histogram() {
        let params = Params::with_probs([1.0, 0.0, 0.0, 0.0, 0.0]);
        let pmf = pdf(4, 0, 1, 10, ModelVariant::Simple, &params, 3).unwrap();
        assert_eq!(pmf.get(16), 1.0);
        assert_eq!(pmf.mode(), 16);
        assert!((pmf.mean() - 16.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_frozen_dynamics_keep_initial_count() {
        let params = Params::with_probs([0.0; 5]);
        let pmf = pdf(5, 7, 10, 25, ModelVariant::Simple, &params, 11).unwrap();
        assert_eq!(pmf.get(7), 1.0);
    }

    #[test]
    fn test_pdf_is_reproducible_for_a_seed() {
        let params = Params::default();
        let a = pdf(7, 4, 25, 60, ModelVariant::Extended, &params, 2024).unwrap();
        let b = pdf(7, 4, 25, 60, ModelVariant::Extended, &params, 2024).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_pdf_rejects_bad_inputs() {
        let params = Params::default();
        assert!(pdf(0, 0, 1, 1, ModelVariant::Simple, &params, 0).is_err());
        assert!(pdf(3, 10, 1, 1, ModelVariant::Simple, &params, 0).is_err());
        assert!(pdf(3, 1, 1, 0, ModelVariant::Simple, &params, 0).is_err());
        let bad = Params::with_probs([0.0, 0.0, 1.5, 0.0, 0.0]);
        assert!(pdf(3, 1, 1, 1, ModelVariant::Simple, &bad, 0).is_err());
    }

    #[test]
    fn test_rolling_is_normalized_over_all_samples() {
        let params = Params::with_probs([0.01, 0.6, 0.1, 0.1, 0.1]);
        let schedule = RollingSchedule { init_steps: 10, samples: 7, sample_gap: 3 };
        let pmf = pdf_rolling(6, 2, schedule, 13, ModelVariant::Simple, &params, 9).unwrap();
        assert_eq!(pmf.len(), 37);
        assert!((pmf.total() - 1.0).abs() < TOLERANCE);
        for &p in pmf.probabilities() {
            let hits = p * 91.0;
            assert!((hits - hits.round()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_rolling_single_sample_matches_pdf() {
        let params = Params::default();
        let schedule = RollingSchedule { init_steps: 12, samples: 1, sample_gap: 5 };
        let rolling = pdf_rolling(6, 3, schedule, 30, ModelVariant::Simple, &params, 77).unwrap();
        let plain = pdf(6, 3, 12, 30, ModelVariant::Simple, &params, 77).unwrap();
        assert_eq!(rolling, plain);
    }

    #[test]
    fn test_rolling_rejects_zero_samples() {
        let schedule = RollingSchedule { init_steps: 1, samples: 0, sample_gap: 1 };
        let params = Params::default();
        assert!(pdf_rolling(3, 1, schedule, 1, ModelVariant::Simple, &params, 0).is_err());
    }

    #[test]
    fn test_pmf_mode_prefers_lowest_on_ties() {
        let pmf = Pmf::from_histogram(&[0, 2, 2, 1], 5).unwrap();
        assert_eq!(pmf.mode(), 1);
        assert!((pmf.mean() - (2.0 + 4.0 + 3.0) / 5.0).abs() < TOLERANCE);
    }
}
