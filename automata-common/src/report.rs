use serde::{Deserialize, Serialize};

/// Per-state population counts recorded at a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRecord {
    /// Number of completed steps when the counts were taken.
    pub step: u32,
    /// Counts indexed Normal, Cancer, Effector, Dead.
    pub counts: [usize; 4],
}

/// Summary of an estimator run, written out by the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PmfReport {
    /// "pdf" or "rolling".
    pub estimator: String,
    pub grid_size: usize,
    pub initial_cancer: usize,
    pub runs: usize,
    /// Total number of samples that went into the histogram.
    pub samples: usize,
    pub mean: f64,
    pub mode: usize,
    /// `probabilities[k]` = empirical probability of ending with k cancer cells.
    pub probabilities: Vec<f64>,
}

/// Time series of counts from a single realization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesReport {
    pub grid_size: usize,
    pub initial_cancer: usize,
    pub records: Vec<CountRecord>,
}
